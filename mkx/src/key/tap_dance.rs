use embassy_time::Duration;
use heapless::Vec;

use super::timer::{KeyTimer, TimedKey};
use crate::action::{Action, TAP_DANCE_MAX_KEYS};
use crate::elapsed_ms;
use crate::hid::HidSink;
use crate::layer::LayerStack;

/// Tap dance: the n-th action is tapped after n taps, once `timeout` passed after the last tap
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapDance {
    pub actions: Vec<Action, TAP_DANCE_MAX_KEYS>,
    pub timeout: Duration,
    timer: KeyTimer,
    tap_count: u8,
    last_tap: u32,
}

impl TapDance {
    pub const fn new(actions: Vec<Action, TAP_DANCE_MAX_KEYS>, timeout: Duration) -> Self {
        Self {
            actions,
            timeout,
            timer: KeyTimer::new(),
            tap_count: 0,
            last_tap: 0,
        }
    }

    pub fn tap_count(&self) -> u8 {
        self.tap_count
    }
}

impl TimedKey for TapDance {
    fn timer(&self) -> &KeyTimer {
        &self.timer
    }

    fn timer_mut(&mut self) -> &mut KeyTimer {
        &mut self.timer
    }

    fn reset_on_press(&mut self, timestamp: u32) {
        if self.tap_count > 0 && elapsed_ms(self.last_tap, timestamp) > self.timeout.as_millis() as u32 {
            self.tap_count = 0;
        }
        self.tap_count = self.tap_count.saturating_add(1);
        self.last_tap = timestamp;
        self.start_timer(timestamp);
    }

    fn check_time<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, now: u32) {
        let Some(elapsed) = self.timer.elapsed(now) else {
            return;
        };
        if elapsed < self.timeout.as_millis() as u32 {
            return;
        }
        match (self.tap_count as usize).checked_sub(1).and_then(|i| self.actions.get(i)) {
            Some(action) => action.tap(layers, hid),
            None => warn!(
                "Tap dance tapped {} times, only {} actions defined",
                self.tap_count,
                self.actions.len()
            ),
        }
        self.tap_count = 0;
        self.stop_timer();
    }
}
