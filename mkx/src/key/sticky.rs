use heapless::Vec;

use super::KeyRef;
use crate::action::{Action, KeyAction};
use crate::hid::HidSink;
use crate::keymap::KeyMap;
use crate::layer::LayerStack;

/// Maximum number of sticky keys active at once
pub const STICKY_KEY_MAX: usize = 8;

/// State machine of a sticky key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StickyState {
    #[default]
    Inactive,
    /// Pressed, no other key pressed yet
    Held,
    /// Another key was pressed while this key was held
    Interrupted,
    /// Released and waiting for the next key to finish
    Active,
}

/// Sticky key: the action stays pressed after the key is released, until another key's release
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sticky {
    pub action: Action,
    /// Keep the action pressed after an interrupted release, until the interrupting key's release
    pub defer_release: bool,
    /// Pressing an active sticky key again cancels it
    pub retap_cancel: bool,
    state: StickyState,
}

impl Sticky {
    pub const fn new(action: Action, defer_release: bool, retap_cancel: bool) -> Self {
        Self {
            action,
            defer_release,
            retap_cancel,
            state: StickyState::Inactive,
        }
    }

    pub fn state(&self) -> StickyState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != StickyState::Inactive
    }

    pub(crate) fn on_press<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H) {
        match self.state {
            StickyState::Inactive => {
                self.action.press(layers, hid);
                self.state = StickyState::Held;
            }
            StickyState::Active if self.retap_cancel => {
                debug!("Sticky key cancelled by retap");
                self.clear(layers, hid);
            }
            _ => self.state = StickyState::Held,
        }
    }

    pub(crate) fn on_release<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H) {
        match self.state {
            StickyState::Held => self.state = StickyState::Active,
            StickyState::Interrupted if !self.defer_release => self.clear(layers, hid),
            StickyState::Interrupted => self.state = StickyState::Active,
            _ => (),
        }
    }

    /// Another key was pressed
    pub(crate) fn interrupt(&mut self) {
        if self.state == StickyState::Held {
            self.state = StickyState::Interrupted;
        }
    }

    /// Release the action if it's still pressed
    pub fn clear<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H) {
        if self.is_active() {
            self.action.release(layers, hid);
            self.state = StickyState::Inactive;
        }
    }
}

/// Sticky keys which may be active
#[derive(Debug, Default)]
pub struct StickyTracker {
    keys: Vec<KeyRef, STICKY_KEY_MAX>,
}

impl StickyTracker {
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn register(&mut self, keymap: &KeyMap<'_>, key: KeyRef) {
        // Forget keys which were cancelled or released on their own
        self.keys
            .retain(|k| matches!(keymap.get(*k), Some(KeyAction::Sticky(s)) if s.is_active()));
        if self.keys.contains(&key) {
            return;
        }
        if self.keys.push(key).is_err() {
            warn!("Too many sticky keys, {:?} won't be tracked", key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Mark held sticky keys as interrupted by another key's press
    pub fn interrupt_all(&self, keymap: &mut KeyMap<'_>) {
        for key in self.keys.iter() {
            if let Some(KeyAction::Sticky(sticky)) = keymap.get_mut(*key) {
                sticky.interrupt();
            }
        }
    }

    /// Release every sticky key
    pub fn clear_all<H: HidSink>(&mut self, keymap: &mut KeyMap<'_>, layers: &mut LayerStack, hid: &mut H) {
        for key in self.keys.iter() {
            if let Some(KeyAction::Sticky(sticky)) = keymap.get_mut(*key) {
                sticky.clear(layers, hid);
            }
        }
        self.keys.clear();
    }
}
