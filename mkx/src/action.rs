use heapless::Vec;

use crate::key::hold_tap::{HoldTap, LayerTap};
use crate::key::sticky::Sticky;
use crate::key::tap_dance::TapDance;
use crate::key::tap_toggle::TapToggle;
use crate::keycode::{ConsumerKey, KeyCode};
use crate::modifier::ModifierCombination;
use crate::mouse_button::MouseButtons;

/// Maximum number of actions in a sequence key
pub const SEQUENCE_MAX_LEN: usize = 8;
/// Maximum number of actions of a tap dance key
pub const TAP_DANCE_MAX_KEYS: usize = 8;

/// A KeyAction is the behavior at a keymap position.
///
/// Timed and sticky variants carry their runtime state, the keymap is the only owner of that
/// state and every press of the position reuses it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// Empty slot
    #[default]
    No,
    /// A single action, triggered on press and cancelled on release
    Single(Action),
    /// Actions tapped in order on press
    Sequence(Vec<Action, SEQUENCE_MAX_LEN>),
    HoldTap(HoldTap),
    LayerTap(LayerTap),
    TapDance(TapDance),
    TapToggle(TapToggle),
    Sticky(Sticky),
}

impl KeyAction {
    /// Keys which change the layer stack. Their release never clears sticky keys.
    pub fn is_layer_control(&self) -> bool {
        matches!(
            self,
            KeyAction::Single(Action::Layer(_)) | KeyAction::LayerTap(_) | KeyAction::TapToggle(_)
        )
    }

    /// Keys resolved by polling a timer
    pub fn is_timed(&self) -> bool {
        matches!(
            self,
            KeyAction::HoldTap(_) | KeyAction::LayerTap(_) | KeyAction::TapDance(_) | KeyAction::TapToggle(_)
        )
    }

    pub fn is_sticky(&self) -> bool {
        matches!(self, KeyAction::Sticky(_))
    }
}

/// Collect actions into a bounded list, extra actions are dropped
pub fn action_list<const N: usize>(actions: &[Action]) -> Vec<Action, N> {
    if actions.len() > N {
        warn!("{} actions given, only the first {} are kept", actions.len(), N);
    }
    actions.iter().take(N).copied().collect()
}

/// A single basic action that a keyboard can execute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// A normal key stroke, held while the key is held
    Key(KeyCode),
    /// A key tapped with modifiers held around it
    Modified(ModifierCombination, KeyCode),
    /// Consumer control usage, sent as a tap
    Media(ConsumerKey),
    Mouse(MouseAction),
    Layer(LayerAction),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MouseAction {
    /// Press and release buttons
    Click(MouseButtons),
    /// Hold buttons while the key is held
    Press(MouseButtons),
    /// Release held buttons
    Release(MouseButtons),
    Move { x: i8, y: i8, wheel: i8 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerAction {
    /// Set the default layer, and make it the only active layer if `jump` is set
    DefaultLayer { layer: u8, jump: bool },
    /// Replace the top layer
    Replace(u8),
    /// Activate a layer while held, with optional modifiers held too
    Momentary(u8, ModifierCombination),
    /// Toggle a layer
    Toggle(u8),
    /// Make a layer the only active layer above the default layer
    To(u8),
}
