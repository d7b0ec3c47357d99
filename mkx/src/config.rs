use embassy_time::Duration;

/// Config of the central frame loop
#[derive(Clone, Copy, Debug)]
pub struct CentralConfig {
    /// Duration of one polling frame
    pub frame_interval: Duration,
    pub bus: BusConfig,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(5),
            bus: BusConfig::default(),
        }
    }
}

/// Config of clock alignment and debouncing
#[derive(Clone, Copy, Debug)]
pub struct BusConfig {
    /// Minimum time between two accepted state changes of one physical key
    pub debounce_window: Duration,
    /// A device silent for longer than this gets its clock offset re-established
    pub resync_idle: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(5),
            resync_idle: Duration::from_millis(5000),
        }
    }
}

impl BusConfig {
    pub(crate) fn debounce_window_ms(&self) -> u32 {
        self.debounce_window.as_millis() as u32
    }

    pub(crate) fn resync_idle_ms(&self) -> u32 {
        self.resync_idle.as_millis() as u32
    }
}

/// Config of a peripheral's sender
#[derive(Clone, Copy, Debug)]
pub struct PeripheralConfig {
    /// Interval between two `sync` messages
    pub sync_interval: Duration,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(5000),
        }
    }
}
