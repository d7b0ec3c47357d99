use crate::elapsed_ms;
use crate::hid::HidSink;
use crate::layer::LayerStack;

/// Armed timer of a timed key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyTimer {
    armed: bool,
    started_at: u32,
}

impl KeyTimer {
    pub const fn new() -> Self {
        Self {
            armed: false,
            started_at: 0,
        }
    }

    pub fn start(&mut self, timestamp: u32) {
        self.armed = true;
        self.started_at = timestamp;
    }

    pub fn stop(&mut self) {
        self.armed = false;
        self.started_at = 0;
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    /// Elapsed time since start, `None` when disarmed
    pub fn elapsed(&self, now: u32) -> Option<u32> {
        self.armed.then(|| elapsed_ms(self.started_at, now))
    }
}

/// Keys resolved by polling a timer once per frame.
///
/// Key instances live in the keymap and are reused by every press, so every press starts with
/// `reset_on_press`. `check_time` on a disarmed key does nothing.
pub trait TimedKey {
    fn timer(&self) -> &KeyTimer;

    fn timer_mut(&mut self) -> &mut KeyTimer;

    /// Reset per-press state and arm the timer
    fn reset_on_press(&mut self, timestamp: u32);

    /// Act on an expired timeout
    fn check_time<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, now: u32);

    fn start_timer(&mut self, timestamp: u32) {
        self.timer_mut().start(timestamp);
    }

    fn stop_timer(&mut self) {
        self.timer_mut().stop();
    }

    fn armed(&self) -> bool {
        self.timer().armed()
    }
}
