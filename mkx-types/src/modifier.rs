//! Modifier combinations used by modified keys and momentary layers.

use core::ops::BitOr;

use bitfield_struct::bitfield;
use serde::{Deserialize, Serialize};

use crate::keycode::KeyCode;

/// A set of modifiers, packed in the HID modifier byte layout.
///
/// | bit7 | bit6 | bit5 | bit4 | bit3 | bit2 | bit1 | bit0 |
/// | --- | --- | --- | --- | --- | --- | --- | --- |
/// | RGUI | RALT |RSHIFT| RCTRL| LGUI | LALT |LSHIFT| LCTRL|
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct ModifierCombination {
    #[bits(1)]
    pub left_ctrl: bool,
    #[bits(1)]
    pub left_shift: bool,
    #[bits(1)]
    pub left_alt: bool,
    #[bits(1)]
    pub left_gui: bool,
    #[bits(1)]
    pub right_ctrl: bool,
    #[bits(1)]
    pub right_shift: bool,
    #[bits(1)]
    pub right_alt: bool,
    #[bits(1)]
    pub right_gui: bool,
}

impl BitOr for ModifierCombination {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}

impl ModifierCombination {
    pub const NONE: Self = Self::new();
    pub const LCTRL: Self = Self::new().with_left_ctrl(true);
    pub const LSHIFT: Self = Self::new().with_left_shift(true);
    pub const LALT: Self = Self::new().with_left_alt(true);
    pub const LGUI: Self = Self::new().with_left_gui(true);
    pub const RCTRL: Self = Self::new().with_right_ctrl(true);
    pub const RSHIFT: Self = Self::new().with_right_shift(true);
    pub const RALT: Self = Self::new().with_right_alt(true);
    pub const RGUI: Self = Self::new().with_right_gui(true);

    pub fn is_empty(self) -> bool {
        self.into_bits() == 0
    }

    /// Modifier keys contained in this combination, from LCtrl to RGui
    pub fn keycodes(self) -> impl Iterator<Item = KeyCode> {
        let bits = self.into_bits();
        (0..8u8)
            .filter(move |bit| bits & (1 << bit) != 0)
            .filter_map(KeyCode::from_modifier_bit)
    }
}

impl From<KeyCode> for ModifierCombination {
    fn from(key: KeyCode) -> Self {
        Self::from_bits(key.modifier_bit())
    }
}
