use embassy_time::Duration;

use super::timer::{KeyTimer, TimedKey};
use crate::action::Action;
use crate::hid::HidSink;
use crate::layer::LayerStack;

/// Tap for one action, hold for another.
///
/// Released before `timeout`: the tap action is tapped. Held until the timer is polled past
/// `timeout`: the hold action is pressed, and released with the key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HoldTap {
    pub tap: Action,
    pub hold: Action,
    pub timeout: Duration,
    timer: KeyTimer,
    hold_sent: bool,
}

impl HoldTap {
    pub const fn new(tap: Action, hold: Action, timeout: Duration) -> Self {
        Self {
            tap,
            hold,
            timeout,
            timer: KeyTimer::new(),
            hold_sent: false,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.hold_sent
    }

    pub(crate) fn on_release<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, timestamp: u32) {
        if self.hold_sent {
            self.hold.release(layers, hid);
        } else {
            match self.timer.elapsed(timestamp) {
                Some(elapsed) if elapsed < self.timeout.as_millis() as u32 => self.tap.tap(layers, hid),
                Some(_) => {
                    // Released after the timeout, but the timer was never polled
                    debug!("Late hold-tap release, sending hold");
                    self.hold.tap(layers, hid);
                }
                None => debug!("Hold-tap released without a press"),
            }
        }
        self.hold_sent = false;
        self.stop_timer();
    }
}

impl TimedKey for HoldTap {
    fn timer(&self) -> &KeyTimer {
        &self.timer
    }

    fn timer_mut(&mut self) -> &mut KeyTimer {
        &mut self.timer
    }

    fn reset_on_press(&mut self, timestamp: u32) {
        self.hold_sent = false;
        self.start_timer(timestamp);
    }

    fn check_time<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, now: u32) {
        let Some(elapsed) = self.timer.elapsed(now) else {
            return;
        };
        if !self.hold_sent && elapsed >= self.timeout.as_millis() as u32 {
            trace!("Hold-tap timeout, pressing hold {:?}", self.hold);
            self.hold.press(layers, hid);
            self.hold_sent = true;
            self.stop_timer();
        }
    }
}

/// Tap for an action, hold to activate a layer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerTap {
    pub layer: u8,
    pub tap: Action,
    pub timeout: Duration,
    timer: KeyTimer,
    hold: bool,
}

impl LayerTap {
    pub const fn new(layer: u8, tap: Action, timeout: Duration) -> Self {
        Self {
            layer,
            tap,
            timeout,
            timer: KeyTimer::new(),
            hold: false,
        }
    }

    pub(crate) fn on_release<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, timestamp: u32) {
        if self.hold {
            layers.deactivate(self.layer);
        } else {
            match self.timer.elapsed(timestamp) {
                Some(elapsed) if elapsed < self.timeout.as_millis() as u32 => self.tap.tap(layers, hid),
                Some(_) => {
                    layers.activate(self.layer, false);
                    layers.deactivate(self.layer);
                }
                None => debug!("Layer-tap released without a press"),
            }
        }
        self.hold = false;
        self.stop_timer();
    }
}

impl TimedKey for LayerTap {
    fn timer(&self) -> &KeyTimer {
        &self.timer
    }

    fn timer_mut(&mut self) -> &mut KeyTimer {
        &mut self.timer
    }

    fn reset_on_press(&mut self, timestamp: u32) {
        self.hold = false;
        self.start_timer(timestamp);
    }

    fn check_time<H: HidSink>(&mut self, layers: &mut LayerStack, _hid: &mut H, now: u32) {
        let Some(elapsed) = self.timer.elapsed(now) else {
            return;
        };
        if !self.hold && elapsed >= self.timeout.as_millis() as u32 {
            layers.activate(self.layer, false);
            self.hold = true;
            self.stop_timer();
        }
    }
}
