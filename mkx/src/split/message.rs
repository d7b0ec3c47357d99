use heapless::{String, Vec};

use crate::DEVICE_ID_MAX_LEN;
use crate::error::ConfigError;

/// Maximum number of messages handled in one frame
pub const MESSAGE_BATCH_SIZE: usize = 64;

/// Wire name of key event messages
pub const KEY_EVENT_TYPE: &str = "key_event";
/// Wire name of clock sync messages
pub const SYNC_TYPE: &str = "sync";

/// Identifier of a peripheral device, as carried in every message
pub type DeviceId = String<DEVICE_ID_MAX_LEN>;

/// Messages collected in one frame
pub type MessageBatch = Vec<Message, MESSAGE_BATCH_SIZE>;

/// Create a device id.
///
/// Ids must be non-empty printable ascii, no longer than `DEVICE_ID_MAX_LEN`, and must not
/// contain `:`, which separates payload fields on the wire.
pub fn device_id(id: &str) -> Result<DeviceId, ConfigError> {
    if !is_valid_device_id(id) {
        return Err(ConfigError::DeviceIdInvalid);
    }
    let mut s = DeviceId::new();
    s.push_str(id).map_err(|_| ConfigError::DeviceIdInvalid)?;
    Ok(s)
}

pub(crate) fn is_valid_device_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= DEVICE_ID_MAX_LEN
        && id.bytes().all(|b| b.is_ascii_graphic() && b != b':')
}

/// A key state change at a device-local matrix position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub col: u8,
    pub row: u8,
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    /// `key_event`, fields `col:row:pressed`
    Key(KeyEvent),
    /// `sync`, no fields. Re-establishes the sender's clock offset.
    Sync,
}

impl MessageKind {
    /// Type name used on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            MessageKind::Key(_) => KEY_EVENT_TYPE,
            MessageKind::Sync => SYNC_TYPE,
        }
    }
}

/// A decoded message.
///
/// `timestamp` is in the sender's milliseconds until the bus rewrites it to host time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    pub timestamp: u32,
    pub device_id: DeviceId,
    pub kind: MessageKind,
}

impl Message {
    pub fn key(timestamp: u32, device_id: DeviceId, col: u8, row: u8, pressed: bool) -> Self {
        Self {
            timestamp,
            device_id,
            kind: MessageKind::Key(KeyEvent { col, row, pressed }),
        }
    }

    pub fn sync(timestamp: u32, device_id: DeviceId) -> Self {
        Self {
            timestamp,
            device_id,
            kind: MessageKind::Sync,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_device_id_validation() {
        assert!(device_id("left").is_ok());
        assert_eq!(device_id(""), Err(ConfigError::DeviceIdInvalid));
        assert_eq!(device_id("a:b"), Err(ConfigError::DeviceIdInvalid));
        assert_eq!(device_id("with space"), Err(ConfigError::DeviceIdInvalid));
        assert_eq!(device_id("seventeen_chars__"), Err(ConfigError::DeviceIdInvalid));
    }
}
