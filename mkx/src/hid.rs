//! HID output of the resolver.
//!
//! The resolver only talks to a [`HidSink`]. [`HidReportState`] turns the press/release stream
//! into USB HID reports for the surrounding firmware to send.

use heapless::{Deque, Vec};
use usbd_hid::descriptor::{KeyboardReport, MediaKeyboardReport, MouseReport};

use crate::keycode::{ConsumerKey, KeyCode};
use crate::mouse_button::MouseButtons;

/// Maximum number of reports waiting to be sent
pub const REPORT_QUEUE_SIZE: usize = 16;

/// Something the host sees as pressed or released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidCode {
    Key(KeyCode),
    Consumer(ConsumerKey),
    Mouse(MouseButtons),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidEvent {
    Press(HidCode),
    Release(HidCode),
    Move { x: i8, y: i8, wheel: i8 },
}

/// Receiver of resolved HID actions. Calls are fire-and-forget.
pub trait HidSink {
    fn press(&mut self, code: HidCode);

    fn release(&mut self, code: HidCode);

    fn move_pointer(&mut self, x: i8, y: i8, wheel: i8);
}

/// Event log sink
impl<const N: usize> HidSink for Vec<HidEvent, N> {
    fn press(&mut self, code: HidCode) {
        if self.push(HidEvent::Press(code)).is_err() {
            warn!("HID event log full, dropping press of {:?}", code);
        }
    }

    fn release(&mut self, code: HidCode) {
        if self.push(HidEvent::Release(code)).is_err() {
            warn!("HID event log full, dropping release of {:?}", code);
        }
    }

    fn move_pointer(&mut self, x: i8, y: i8, wheel: i8) {
        if self.push(HidEvent::Move { x, y, wheel }).is_err() {
            warn!("HID event log full, dropping mouse move");
        }
    }
}

pub enum Report {
    /// Normal keyboard hid report
    KeyboardReport(KeyboardReport),
    /// Mouse hid report
    MouseReport(MouseReport),
    /// Media keyboard report
    MediaKeyboardReport(MediaKeyboardReport),
}

/// Keyboard, consumer and mouse state as HID reports.
///
/// Every state change queues a report, so a tap produces a press report and a release report.
pub struct HidReportState {
    modifier: u8,
    keycodes: [u8; 6],
    consumer: u16,
    buttons: u8,
    reports: Deque<Report, REPORT_QUEUE_SIZE>,
}

impl Default for HidReportState {
    fn default() -> Self {
        Self::new()
    }
}

impl HidReportState {
    pub const fn new() -> Self {
        Self {
            modifier: 0,
            keycodes: [0; 6],
            consumer: 0,
            buttons: 0,
            reports: Deque::new(),
        }
    }

    pub fn keyboard_report(&self) -> KeyboardReport {
        KeyboardReport {
            modifier: self.modifier,
            reserved: 0,
            leds: 0,
            keycodes: self.keycodes,
        }
    }

    pub fn media_report(&self) -> MediaKeyboardReport {
        MediaKeyboardReport {
            usage_id: self.consumer,
        }
    }

    pub fn mouse_report(&self, x: i8, y: i8, wheel: i8) -> MouseReport {
        MouseReport {
            buttons: self.buttons,
            x,
            y,
            wheel,
            pan: 0,
        }
    }

    /// Next report to send, oldest first
    pub fn next_report(&mut self) -> Option<Report> {
        self.reports.pop_front()
    }

    pub fn has_reports(&self) -> bool {
        !self.reports.is_empty()
    }

    fn queue(&mut self, report: Report) {
        if self.reports.push_back(report).is_err() {
            warn!("HID report queue full, dropping report");
        }
    }

    fn update_key(&mut self, key: KeyCode, pressed: bool) {
        if key.is_modifier() {
            if pressed {
                self.modifier |= key.modifier_bit();
            } else {
                self.modifier &= !key.modifier_bit();
            }
        } else {
            let code = key as u8;
            if pressed {
                if self.keycodes.contains(&code) {
                    return;
                }
                match self.keycodes.iter_mut().find(|k| **k == 0) {
                    Some(slot) => *slot = code,
                    None => {
                        warn!("Keyboard report full, {:?} not reported", key);
                        return;
                    }
                }
            } else {
                match self.keycodes.iter_mut().find(|k| **k == code) {
                    Some(slot) => *slot = 0,
                    None => return,
                }
            }
        }
        self.queue(Report::KeyboardReport(self.keyboard_report()));
    }
}

impl HidSink for HidReportState {
    fn press(&mut self, code: HidCode) {
        match code {
            HidCode::Key(key) => self.update_key(key, true),
            HidCode::Consumer(key) => {
                self.consumer = key as u16;
                self.queue(Report::MediaKeyboardReport(self.media_report()));
            }
            HidCode::Mouse(buttons) => {
                self.buttons |= buttons.into_bits();
                self.queue(Report::MouseReport(self.mouse_report(0, 0, 0)));
            }
        }
    }

    fn release(&mut self, code: HidCode) {
        match code {
            HidCode::Key(key) => self.update_key(key, false),
            HidCode::Consumer(key) => {
                if self.consumer == key as u16 {
                    self.consumer = 0;
                    self.queue(Report::MediaKeyboardReport(self.media_report()));
                }
            }
            HidCode::Mouse(buttons) => {
                self.buttons &= !buttons.into_bits();
                self.queue(Report::MouseReport(self.mouse_report(0, 0, 0)));
            }
        }
    }

    fn move_pointer(&mut self, x: i8, y: i8, wheel: i8) {
        self.queue(Report::MouseReport(self.mouse_report(x, y, wheel)));
    }
}
