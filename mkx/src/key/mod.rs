//! Press, release and timer behavior of keymap actions.

pub mod hold_tap;
pub mod sticky;
pub mod tap_dance;
pub mod tap_toggle;
pub mod timer;

use heapless::Vec;

use self::timer::TimedKey;
use crate::action::{Action, KeyAction, LayerAction, MouseAction};
use crate::hid::{HidCode, HidSink};
use crate::keymap::KeyMap;
use crate::layer::LayerStack;
use crate::modifier::ModifierCombination;

/// Default timeout of timed keys
pub const DEFAULT_TAPPING_TERM_MS: u64 = 200;
/// Maximum number of timed keys armed at once
pub const TIMED_KEY_REGISTRY_SIZE: usize = 16;

/// Position of a key instance in the keymap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyRef {
    pub layer: u8,
    pub index: u16,
}

impl KeyRef {
    pub const fn new(layer: u8, index: u16) -> Self {
        Self { layer, index }
    }
}

fn press_modifiers<H: HidSink>(mods: ModifierCombination, hid: &mut H) {
    mods.keycodes().for_each(|key| hid.press(HidCode::Key(key)));
}

fn release_modifiers<H: HidSink>(mods: ModifierCombination, hid: &mut H) {
    mods.keycodes().for_each(|key| hid.release(HidCode::Key(key)));
}

impl Action {
    pub fn press<H: HidSink>(&self, layers: &mut LayerStack, hid: &mut H) {
        match *self {
            Action::Key(key) => hid.press(HidCode::Key(key)),
            Action::Modified(mods, key) => {
                press_modifiers(mods, hid);
                hid.press(HidCode::Key(key));
                hid.release(HidCode::Key(key));
                release_modifiers(mods, hid);
            }
            Action::Media(key) => {
                hid.press(HidCode::Consumer(key));
                hid.release(HidCode::Consumer(key));
            }
            Action::Mouse(mouse) => match mouse {
                MouseAction::Click(buttons) => {
                    hid.press(HidCode::Mouse(buttons));
                    hid.release(HidCode::Mouse(buttons));
                }
                MouseAction::Press(buttons) => hid.press(HidCode::Mouse(buttons)),
                MouseAction::Release(buttons) => hid.release(HidCode::Mouse(buttons)),
                MouseAction::Move { x, y, wheel } => hid.move_pointer(x, y, wheel),
            },
            Action::Layer(layer_action) => match layer_action {
                LayerAction::DefaultLayer { layer, jump } => {
                    layers.set_default(layer);
                    if jump {
                        layers.set_active(layer);
                    }
                }
                LayerAction::Replace(layer) => layers.replace_top(layer),
                LayerAction::Momentary(layer, mods) => {
                    layers.activate(layer, true);
                    press_modifiers(mods, hid);
                }
                LayerAction::Toggle(layer) => layers.toggle(layer, false),
                LayerAction::To(layer) => layers.set_active(layer),
            },
        }
    }

    /// Undo whatever `press` keeps held. Taps have nothing to release.
    pub fn release<H: HidSink>(&self, layers: &mut LayerStack, hid: &mut H) {
        match *self {
            Action::Key(key) => hid.release(HidCode::Key(key)),
            Action::Mouse(MouseAction::Press(buttons)) => hid.release(HidCode::Mouse(buttons)),
            Action::Layer(LayerAction::Momentary(layer, mods)) => {
                layers.deactivate(layer);
                release_modifiers(mods, hid);
            }
            _ => (),
        }
    }

    /// Press and release back to back
    pub fn tap<H: HidSink>(&self, layers: &mut LayerStack, hid: &mut H) {
        self.press(layers, hid);
        self.release(layers, hid);
    }
}

impl KeyAction {
    pub fn on_press<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, timestamp: u32) {
        match self {
            KeyAction::No => (),
            KeyAction::Single(action) => action.press(layers, hid),
            KeyAction::Sequence(actions) => actions.iter().for_each(|action| action.tap(layers, hid)),
            KeyAction::HoldTap(key) => key.reset_on_press(timestamp),
            KeyAction::LayerTap(key) => key.reset_on_press(timestamp),
            KeyAction::TapDance(key) => key.reset_on_press(timestamp),
            KeyAction::TapToggle(key) => key.reset_on_press(timestamp),
            KeyAction::Sticky(key) => key.on_press(layers, hid),
        }
    }

    pub fn on_release<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, timestamp: u32) {
        match self {
            KeyAction::No | KeyAction::Sequence(_) | KeyAction::TapDance(_) => (),
            KeyAction::Single(action) => action.release(layers, hid),
            KeyAction::HoldTap(key) => key.on_release(layers, hid, timestamp),
            KeyAction::LayerTap(key) => key.on_release(layers, hid, timestamp),
            KeyAction::TapToggle(key) => key.on_release(layers),
            KeyAction::Sticky(key) => key.on_release(layers, hid),
        }
    }

    pub fn check_time<H: HidSink>(&mut self, layers: &mut LayerStack, hid: &mut H, now: u32) {
        match self {
            KeyAction::HoldTap(key) => key.check_time(layers, hid, now),
            KeyAction::LayerTap(key) => key.check_time(layers, hid, now),
            KeyAction::TapDance(key) => key.check_time(layers, hid, now),
            KeyAction::TapToggle(key) => key.check_time(layers, hid, now),
            _ => (),
        }
    }

    /// Whether the key's timer is running
    pub fn armed(&self) -> bool {
        match self {
            KeyAction::HoldTap(key) => key.armed(),
            KeyAction::LayerTap(key) => key.armed(),
            KeyAction::TapDance(key) => key.armed(),
            KeyAction::TapToggle(key) => key.armed(),
            _ => false,
        }
    }
}

/// Armed timed keys, polled once per frame
#[derive(Debug, Default)]
pub struct TimedKeyRegistry {
    keys: Vec<KeyRef, TIMED_KEY_REGISTRY_SIZE>,
}

impl TimedKeyRegistry {
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn register(&mut self, key: KeyRef) {
        if self.keys.contains(&key) {
            return;
        }
        if self.keys.push(key).is_err() {
            warn!("Timed key registry full, {:?} won't be polled", key);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: KeyRef) -> bool {
        self.keys.contains(&key)
    }

    /// Check every registered key, then drop the ones which disarmed
    pub fn update<H: HidSink>(&mut self, keymap: &mut KeyMap<'_>, layers: &mut LayerStack, hid: &mut H, now: u32) {
        self.keys.retain(|key| match keymap.get_mut(*key) {
            Some(action) => {
                action.check_time(layers, hid, now);
                action.armed()
            }
            None => false,
        });
    }
}
