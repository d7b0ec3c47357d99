use embassy_time::Duration;

use super::timer::{KeyTimer, TimedKey};
use crate::elapsed_ms;
use crate::hid::HidSink;
use crate::layer::LayerStack;

/// Tap toggle: hold past `timeout` for a momentary layer, double tap to toggle it.
///
/// A single tap, or more than two, does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapToggle {
    pub layer: u8,
    pub timeout: Duration,
    timer: KeyTimer,
    tap_count: u8,
    last_tap: u32,
    held: bool,
    hold: bool,
}

impl TapToggle {
    pub const fn new(layer: u8, timeout: Duration) -> Self {
        Self {
            layer,
            timeout,
            timer: KeyTimer::new(),
            tap_count: 0,
            last_tap: 0,
            held: false,
            hold: false,
        }
    }

    pub(crate) fn on_release(&mut self, layers: &mut LayerStack) {
        self.held = false;
        if self.hold {
            layers.deactivate(self.layer);
            self.hold = false;
        }
    }
}

impl TimedKey for TapToggle {
    fn timer(&self) -> &KeyTimer {
        &self.timer
    }

    fn timer_mut(&mut self) -> &mut KeyTimer {
        &mut self.timer
    }

    fn reset_on_press(&mut self, timestamp: u32) {
        if elapsed_ms(self.last_tap, timestamp) > self.timeout.as_millis() as u32 {
            self.tap_count = 0;
        }
        self.tap_count = self.tap_count.saturating_add(1);
        self.last_tap = timestamp;
        self.held = true;
        self.hold = false;
        self.start_timer(timestamp);
    }

    fn check_time<H: HidSink>(&mut self, layers: &mut LayerStack, _hid: &mut H, now: u32) {
        let Some(elapsed) = self.timer.elapsed(now) else {
            return;
        };
        if self.hold || elapsed < self.timeout.as_millis() as u32 {
            return;
        }
        match self.tap_count {
            2.. => layers.toggle(self.layer, false),
            1 if self.held => {
                layers.activate(self.layer, false);
                self.hold = true;
            }
            _ => trace!("Tap toggle timed out without action"),
        }
        self.tap_count = 0;
        self.stop_timer();
    }
}
