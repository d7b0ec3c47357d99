//! Per-device clock alignment and per-key debouncing of decoded messages.
//!
//! Both stages work on a whole [`MessageBatch`], once per frame.

mod clock;
mod debounce;

pub use clock::{ClockOffset, ClockSync};
pub use debounce::{DEBOUNCE_TABLE_SIZE, DebounceState, Debouncer};

use crate::config::BusConfig;
use crate::error::ConfigError;
use crate::split::message::{DeviceId, MessageBatch};

pub struct MessageBus {
    clock: ClockSync,
    debouncer: Debouncer,
}

impl MessageBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            clock: ClockSync::new(config.resync_idle_ms()),
            debouncer: Debouncer::new(config.debounce_window_ms()),
        }
    }

    /// Rewrite timestamps to host time and order the batch by them
    pub fn align(&mut self, batch: &mut MessageBatch, host_now: u32) -> Result<(), ConfigError> {
        self.clock.align(batch, host_now)
    }

    /// Drop bouncing key events and every message which isn't a key event
    pub fn debounce(&mut self, batch: &mut MessageBatch) {
        self.debouncer.debounce(batch)
    }

    /// Align then debounce
    pub fn process(&mut self, batch: &mut MessageBatch, host_now: u32) -> Result<(), ConfigError> {
        self.align(batch, host_now)?;
        self.debounce(batch);
        Ok(())
    }

    /// Forget everything known about a device
    pub fn forget(&mut self, device_id: &DeviceId) {
        info!("Forgetting device {}", device_id.as_str());
        self.clock.forget(device_id);
        self.debouncer.forget(device_id);
    }

    pub fn clock_offset(&self, device_id: &DeviceId) -> Option<ClockOffset> {
        self.clock.offset(device_id)
    }
}
