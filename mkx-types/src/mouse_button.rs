//! Mouse buttons used by mouse keys.

use core::ops::{BitOr, Not};

use bitfield_struct::bitfield;
use serde::{Deserialize, Serialize};

/// Mouse buttons, in the bit order of the HID mouse report
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct MouseButtons {
    #[bits(1)]
    pub left: bool,
    #[bits(1)]
    pub right: bool,
    #[bits(1)]
    pub middle: bool,
    #[bits(1)]
    pub back: bool,
    #[bits(1)]
    pub forward: bool,
    #[bits(3)]
    _reserved: u8,
}

impl BitOr for MouseButtons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}

impl Not for MouseButtons {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::from_bits(!self.into_bits())
    }
}

impl MouseButtons {
    pub const LEFT: Self = Self::new().with_left(true);
    pub const RIGHT: Self = Self::new().with_right(true);
    pub const MIDDLE: Self = Self::new().with_middle(true);
    pub const BACK: Self = Self::new().with_back(true);
    pub const FORWARD: Self = Self::new().with_forward(true);
}
