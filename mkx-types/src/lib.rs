//! # MKX Types
//!
//! Plain data types shared between the MKX central core and peripheral tooling.
//!
//! - [`keycode`] - HID keyboard page keycodes and consumer page usages
//! - [`modifier`] - Modifier combinations
//! - [`mouse_button`] - Mouse button sets

#![cfg_attr(not(test), no_std)]

pub mod keycode;
pub mod modifier;
pub mod mouse_button;
