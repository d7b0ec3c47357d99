//! Communication between the central and its peripherals.
//!
//! Peripherals encode [`message::Message`]s into frames with [`codec`] and push them over a
//! [`driver::SplitTransport`]. The central feeds received bytes into a [`codec::FrameDecoder`]
//! per link.

pub mod codec;
pub mod driver;
pub mod message;
pub mod peripheral;

pub use codec::{FrameDecoder, FRAME_HEADER, MAX_PAYLOAD_LEN};
pub use driver::{SerialSplitDriver, SplitTransport};
pub use message::{DeviceId, KeyEvent, Message, MessageBatch, MessageKind, device_id};
pub use peripheral::Peripheral;
