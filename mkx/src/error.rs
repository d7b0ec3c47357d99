//! Error taxonomy of the core.
//!
//! Only [`ConfigError`] crosses the core boundary as fatal: the surrounding firmware should enter
//! its halt state when it sees one. Codec and transport errors are recovered where they happen.

/// Fatal configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The keymap has no layers, or its layers have no keys
    EmptyKeymap,
    /// The keymap has more layers than `MAX_LAYERS`
    TooManyLayers,
    /// A layer's length differs from the first layer's length
    NonRectangularLayer { layer: u8, expected: u16, found: u16 },
    /// The default layer is not a layer of the keymap
    InvalidDefaultLayer,
    /// An explicit coordinate map doesn't cover `cols * rows` positions
    CoordMapSizeMismatch { expected: u16, found: u16 },
    /// A coordinate map points outside the keymap
    CoordOutOfRange { index: u16, keys_per_layer: u16 },
    /// A device covers more positions than `MAX_DEVICE_KEYS`
    DeviceMapTooLarge,
    /// Two interfaces use the same device id
    DuplicateDevice,
    /// More interfaces than `MAX_DEVICES`
    DeviceTableFull,
    /// The clock offset table has no room for another device
    ClockTableFull,
    /// Device id is empty, too long or contains the field separator
    DeviceIdInvalid,
}

/// Errors of the split wire codec. Contained within the decoder, which resynchronizes on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// LENGTH is larger than `MAX_PAYLOAD_LEN`
    PayloadTooLong(usize),
    ChecksumMismatch { expected: u8, found: u8 },
    InvalidUtf8,
    /// Fewer than 3 payload parts, or a field count that doesn't fit the message type
    Malformed,
    UnknownMessageType,
    /// A field failed to parse
    InvalidField,
    DeviceIdInvalid,
}

/// Errors of split transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SplitDriverError {
    SerialError,
    Disconnected,
    BufferFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MkxError {
    Config(ConfigError),
    Codec(CodecError),
    Transport(SplitDriverError),
}

impl MkxError {
    /// Fatal errors should put the device into its halt state
    pub fn is_fatal(&self) -> bool {
        matches!(self, MkxError::Config(_))
    }
}

impl From<ConfigError> for MkxError {
    fn from(e: ConfigError) -> Self {
        MkxError::Config(e)
    }
}

impl From<CodecError> for MkxError {
    fn from(e: CodecError) -> Self {
        MkxError::Codec(e)
    }
}

impl From<SplitDriverError> for MkxError {
    fn from(e: SplitDriverError) -> Self {
        MkxError::Transport(e)
    }
}
