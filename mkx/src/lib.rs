//! # MKX
//!
//! Central core of a multi-part keyboard: peripherals (matrix scanners, touch sensors) send raw
//! contact events over a framed wire protocol, and the central resolves them into HID output.
//!
//! The pipeline of one frame is:
//!
//! raw bytes → [`split::codec`] → [`split::message::Message`] → [`bus::MessageBus`]
//! (clock alignment + debounce) → [`resolver::KeyResolver`] (layers, timed keys, sticky keys)
//! → [`hid::HidSink`].
//!
//! [`central::Central`] runs that pipeline once per fixed-duration frame.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod action;
pub mod bus;
pub mod central;
pub mod config;
pub mod error;
pub mod hid;
pub mod interface;
pub mod key;
pub mod keymap;
pub mod layer;
pub mod layout_macro;
pub mod resolver;
pub mod split;

pub use embassy_time::Duration;
pub use mkx_types as types;
pub use mkx_types::{keycode, modifier, mouse_button};

/// Maximum number of devices registered at the central
pub const MAX_DEVICES: usize = 8;
/// Maximum length of a device id
pub const DEVICE_ID_MAX_LEN: usize = 16;
/// Maximum number of layers in a keymap
pub const MAX_LAYERS: usize = 16;
/// Maximum number of positions one device can map
pub const MAX_DEVICE_KEYS: usize = 128;

/// Elapsed milliseconds from `since` to `now` on a wrapping u32 clock.
///
/// A `now` slightly before `since`, caused by jitter between device clocks, counts as 0.
pub(crate) fn elapsed_ms(since: u32, now: u32) -> u32 {
    let d = now.wrapping_sub(since);
    if d > u32::MAX / 2 { 0 } else { d }
}
