//! Binary framing of split messages.
//!
//! ```text
//! Byte 0       : 0xB2 (frame header)
//! Bytes 1..=2  : LENGTH, big-endian u16, payload length in bytes
//! Bytes 3..N   : PAYLOAD, ascii "timestamp:device_id:type:field0:field1:..."
//! Byte N+1     : CHECKSUM, sum of payload bytes mod 256
//! ```
//!
//! The decoder resynchronizes byte by byte: on a bad checksum or an unparsable payload only the
//! header byte is dropped, so corruption costs at most the frame it hit.

use core::fmt::{Display, Write};

use byteorder::{BigEndian, ByteOrder};
use heapless::{String, Vec};

use super::message::{DeviceId, KEY_EVENT_TYPE, KeyEvent, Message, MessageKind, SYNC_TYPE, is_valid_device_id};
use crate::error::CodecError;

/// First byte of every frame
pub const FRAME_HEADER: u8 = 0xB2;
/// Largest payload accepted by the decoder
pub const MAX_PAYLOAD_LEN: usize = 256;
/// Header, length and checksum bytes
pub const FRAME_OVERHEAD: usize = 4;
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + FRAME_OVERHEAD;

const DECODER_BUFFER_SIZE: usize = 2 * MAX_FRAME_LEN;

/// An encoded frame
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// 8-bit wrapping sum of the payload
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode a message into a frame
pub fn encode(message: &Message) -> Result<Frame, CodecError> {
    match message.kind {
        MessageKind::Key(KeyEvent { col, row, pressed }) => encode_fields(
            message.timestamp,
            &message.device_id,
            KEY_EVENT_TYPE,
            &[&col, &row, &pressed],
        ),
        MessageKind::Sync => encode_fields(message.timestamp, &message.device_id, SYNC_TYPE, &[]),
    }
}

/// Encode a frame from raw parts.
///
/// Fields are written in the given order, which is part of the wire contract.
pub fn encode_fields(
    timestamp: u32,
    device_id: &str,
    msg_type: &str,
    fields: &[&dyn Display],
) -> Result<Frame, CodecError> {
    if !is_valid_device_id(device_id) {
        return Err(CodecError::DeviceIdInvalid);
    }
    if msg_type.is_empty() || msg_type.contains(':') {
        return Err(CodecError::UnknownMessageType);
    }

    let mut payload: String<MAX_PAYLOAD_LEN> = String::new();
    let too_long = |_| CodecError::PayloadTooLong(MAX_PAYLOAD_LEN + 1);
    write!(payload, "{}:{}:{}", timestamp, device_id, msg_type).map_err(too_long)?;
    for field in fields {
        write!(payload, ":{}", field).map_err(too_long)?;
    }

    encode_payload(payload.as_bytes())
}

/// Wrap an already formatted payload into a frame
pub fn encode_payload(payload: &[u8]) -> Result<Frame, CodecError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLong(payload.len()));
    }
    let mut length = [0u8; 2];
    BigEndian::write_u16(&mut length, payload.len() as u16);

    let overflow = |_| CodecError::PayloadTooLong(payload.len());
    let mut frame = Frame::new();
    frame.push(FRAME_HEADER).map_err(|_| CodecError::PayloadTooLong(payload.len()))?;
    frame.extend_from_slice(&length).map_err(overflow)?;
    frame.extend_from_slice(payload).map_err(overflow)?;
    frame
        .push(checksum(payload))
        .map_err(|_| CodecError::PayloadTooLong(payload.len()))?;
    Ok(frame)
}

/// Decode as many complete frames from `buf` as possible.
///
/// Every decoded message is passed to `on_message`. Returns the number of bytes consumed, bytes
/// after that are an incomplete frame and must be kept for the next call.
pub fn decode<F: FnMut(Message)>(buf: &[u8], on_message: F) -> usize {
    decode_at_most(buf, usize::MAX, on_message)
}

/// Like [`decode`], but stops after `max_messages` messages. Bytes of the frames left over are
/// not consumed.
pub fn decode_at_most<F: FnMut(Message)>(buf: &[u8], max_messages: usize, mut on_message: F) -> usize {
    let mut pos = 0;
    let mut decoded = 0;
    while pos < buf.len() && decoded < max_messages {
        let rest = &buf[pos..];
        if rest[0] != FRAME_HEADER {
            trace!("Dropping stray byte {:?}", rest[0]);
            pos += 1;
            continue;
        }
        if rest.len() < 3 {
            break;
        }

        let len = BigEndian::read_u16(&rest[1..3]) as usize;
        if len > MAX_PAYLOAD_LEN {
            debug!("Split frame length {} exceeds limit, resyncing", len);
            pos += 1;
            continue;
        }
        let frame_len = len + FRAME_OVERHEAD;
        if rest.len() < frame_len {
            break;
        }

        let payload = &rest[3..3 + len];
        let expected = rest[3 + len];
        let found = checksum(payload);
        if expected != found {
            debug!(
                "Split frame checksum mismatch: {:?}",
                CodecError::ChecksumMismatch { expected, found }
            );
            pos += 1;
            continue;
        }

        match parse_payload(payload) {
            Ok(message) => {
                on_message(message);
                decoded += 1;
                pos += frame_len;
            }
            Err(e) => {
                warn!("Malformed split message: {:?}", e);
                pos += 1;
            }
        }
    }
    pos
}

/// Parse `timestamp:device_id:type:field...`
pub fn parse_payload(payload: &[u8]) -> Result<Message, CodecError> {
    let text = core::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
    let mut parts = text.split(':');
    let (Some(timestamp), Some(id), Some(msg_type)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CodecError::Malformed);
    };

    let timestamp: u32 = timestamp.parse().map_err(|_| CodecError::InvalidField)?;
    if !is_valid_device_id(id) {
        return Err(CodecError::DeviceIdInvalid);
    }
    let mut device_id = DeviceId::new();
    device_id.push_str(id).map_err(|_| CodecError::DeviceIdInvalid)?;

    let kind = match msg_type {
        KEY_EVENT_TYPE => {
            let (Some(col), Some(row), Some(pressed), None) = (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(CodecError::Malformed);
            };
            MessageKind::Key(KeyEvent {
                col: col.parse().map_err(|_| CodecError::InvalidField)?,
                row: row.parse().map_err(|_| CodecError::InvalidField)?,
                pressed: match pressed {
                    "true" => true,
                    "false" => false,
                    _ => return Err(CodecError::InvalidField),
                },
            })
        }
        SYNC_TYPE => {
            if parts.next().is_some() {
                return Err(CodecError::Malformed);
            }
            MessageKind::Sync
        }
        _ => return Err(CodecError::UnknownMessageType),
    };

    Ok(Message {
        timestamp,
        device_id,
        kind,
    })
}

/// Incremental decoder over a byte stream which may deliver partial frames
pub struct FrameDecoder {
    buffer: Vec<u8, DECODER_BUFFER_SIZE>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Buffered bytes, which may hold complete frames not decoded yet
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes which can be taken by the next [`FrameDecoder::feed`]
    pub fn free(&self) -> usize {
        self.buffer.capacity() - self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Append received bytes and decode up to `max_messages` frames.
    ///
    /// Frames beyond `max_messages` stay buffered for the next call, and bytes which don't fit the
    /// buffer are not taken. Returns the number of bytes of `data` taken, the caller must offer
    /// the rest again.
    pub fn feed<F: FnMut(Message)>(&mut self, data: &[u8], max_messages: usize, mut on_message: F) -> usize {
        let mut taken = 0;
        let mut budget = max_messages;
        loop {
            taken += self.fill(&data[taken..]);

            let mut decoded = 0;
            let consumed = decode_at_most(&self.buffer, budget, |message| {
                decoded += 1;
                on_message(message)
            });
            self.discard(consumed);
            budget -= decoded;

            if budget == 0 {
                // Keep the rest of the data buffered for the next frame
                taken += self.fill(&data[taken..]);
                break;
            }
            if self.buffer.is_full() {
                warn!("Split frame buffer stuck, dropping {} bytes", self.buffer.len());
                self.buffer.clear();
            }
            if taken == data.len() {
                break;
            }
        }
        taken
    }

    /// Decode frames already buffered, up to `max_messages`
    pub fn drain<F: FnMut(Message)>(&mut self, max_messages: usize, on_message: F) {
        self.feed(&[], max_messages, on_message);
    }

    fn fill(&mut self, data: &[u8]) -> usize {
        let n = self.free().min(data.len());
        if self.buffer.extend_from_slice(&data[..n]).is_err() {
            // Unreachable, the chunk is sized to the free capacity
            self.buffer.clear();
        }
        n
    }

    fn discard(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let len = self.buffer.len();
        self.buffer.copy_within(n..len, 0);
        self.buffer.truncate(len - n);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::split::message::device_id;

    fn key_message(timestamp: u32, id: &str, col: u8, row: u8, pressed: bool) -> Message {
        Message::key(timestamp, device_id(id).unwrap(), col, row, pressed)
    }

    fn decode_all(bytes: &[u8]) -> (std::vec::Vec<Message>, usize) {
        let mut out = std::vec::Vec::new();
        let consumed = decode(bytes, |m| out.push(m));
        (out, consumed)
    }

    #[test]
    fn test_wire_layout() {
        let frame = encode(&key_message(1234, "left", 0, 1, true)).unwrap();
        let payload = b"1234:left:key_event:0:1:true";
        assert_eq!(frame[0], 0xB2);
        assert_eq!(&frame[1..3], &[0x00, payload.len() as u8]);
        assert_eq!(&frame[3..3 + payload.len()], payload);
        assert_eq!(frame[frame.len() - 1], checksum(payload));
        assert_eq!(frame.len(), payload.len() + FRAME_OVERHEAD);
    }

    #[test]
    fn test_round_trip() {
        let messages = [
            key_message(0, "left", 3, 2, true),
            key_message(u32::MAX, "right-half", 255, 0, false),
            Message::sync(5000, device_id("touch").unwrap()),
        ];
        for message in messages {
            let frame = encode(&message).unwrap();
            let (decoded, consumed) = decode_all(&frame);
            assert_eq!(consumed, frame.len());
            assert_eq!(decoded, [message]);
        }
    }

    #[test]
    fn test_field_order_is_preserved() {
        let frame = encode_fields(7, "dev", "custom", &[&"b", &"a", &3]).unwrap();
        assert_eq!(&frame[3..frame.len() - 1], b"7:dev:custom:b:a:3");
    }

    #[test]
    fn test_encode_rejects_bad_device_id() {
        assert_eq!(
            encode_fields(0, "a:b", KEY_EVENT_TYPE, &[]),
            Err(CodecError::DeviceIdInvalid)
        );
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_corrupted_frame_loses_only_itself() {
        let first = encode(&key_message(10, "left", 0, 0, true)).unwrap();
        let second = encode(&key_message(11, "left", 1, 0, true)).unwrap();
        let mut stream = std::vec::Vec::new();
        stream.extend_from_slice(&first);
        stream.extend_from_slice(&second);
        // Corrupt one payload byte of the first frame
        stream[5] ^= 0x01;

        let (decoded, consumed) = decode_all(&stream);
        assert_eq!(consumed, stream.len());
        assert_eq!(decoded, [key_message(11, "left", 1, 0, true)]);
    }

    #[test]
    fn test_stray_bytes_are_skipped() {
        let frame = encode(&key_message(1, "left", 2, 3, false)).unwrap();
        let mut stream = std::vec![0x00, 0x13, 0x37];
        stream.extend_from_slice(&frame);

        let (decoded, consumed) = decode_all(&stream);
        assert_eq!(consumed, stream.len());
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_partial_header_waits() {
        let (decoded, consumed) = decode_all(b"\xb2\x00\x10");
        assert!(decoded.is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_oversized_length_resyncs() {
        let frame = encode(&key_message(1, "left", 2, 3, false)).unwrap();
        let mut stream = std::vec![FRAME_HEADER, 0xFF, 0xFF];
        stream.extend_from_slice(&frame);

        let (decoded, _) = decode_all(&stream);
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(parse_payload(b"100:left"), Err(CodecError::Malformed));
        assert_eq!(parse_payload(b""), Err(CodecError::Malformed));
        assert_eq!(parse_payload(b"x:left:sync"), Err(CodecError::InvalidField));
        assert_eq!(parse_payload(b"1:left:key_event:0:1"), Err(CodecError::Malformed));
        assert_eq!(parse_payload(b"1:left:key_event:0:1:yes"), Err(CodecError::InvalidField));
        assert_eq!(parse_payload(b"1:left:battery:3.7"), Err(CodecError::UnknownMessageType));
        assert_eq!(parse_payload(b"1::sync"), Err(CodecError::DeviceIdInvalid));
        assert_eq!(parse_payload(&[0xFF, 0xFE]), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let bad = encode_payload(b"100:left").unwrap();
        let good = encode(&key_message(101, "left", 0, 0, true)).unwrap();
        let mut stream = std::vec::Vec::new();
        stream.extend_from_slice(&bad);
        stream.extend_from_slice(&good);

        let (decoded, consumed) = decode_all(&stream);
        assert_eq!(consumed, stream.len());
        assert_eq!(decoded, [key_message(101, "left", 0, 0, true)]);
    }

    #[test]
    fn test_decoder_byte_by_byte() {
        let frame = encode(&key_message(42, "right", 4, 1, true)).unwrap();
        let mut decoder = FrameDecoder::new();
        let mut decoded = std::vec::Vec::new();

        for (i, byte) in frame.iter().enumerate() {
            assert_eq!(decoder.feed(&[*byte], usize::MAX, |m| decoded.push(m)), 1);
            if i + 1 < frame.len() {
                assert!(decoded.is_empty(), "spurious message after {} bytes", i + 1);
            }
        }
        assert_eq!(decoded, [key_message(42, "right", 4, 1, true)]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_handles_large_input() {
        let frame = encode(&key_message(42, "right", 4, 1, true)).unwrap();
        let mut stream = std::vec::Vec::new();
        for _ in 0..40 {
            stream.extend_from_slice(&frame);
        }
        // Leave a partial frame at the end
        stream.extend_from_slice(&frame[..5]);

        let mut decoder = FrameDecoder::new();
        let mut count = 0;
        assert_eq!(decoder.feed(&stream, usize::MAX, |_| count += 1), stream.len());
        assert_eq!(count, 40);
        assert_eq!(decoder.buffered(), 5);
    }

    #[test]
    fn test_decoder_stops_at_message_limit() {
        let frame = encode(&key_message(42, "right", 4, 1, true)).unwrap();
        let mut stream = std::vec::Vec::new();
        for _ in 0..40 {
            stream.extend_from_slice(&frame);
        }

        let mut decoder = FrameDecoder::new();
        let mut count = 0;
        let taken = decoder.feed(&stream, 3, |_| count += 1);
        assert_eq!(count, 3);
        // Frames after the limit stay buffered, the rest of the stream is left to the caller
        assert_eq!(decoder.free(), 0);
        assert_eq!(taken, 3 * frame.len() + decoder.buffered());
        assert_eq!(decoder.feed(&stream[taken..], 0, |_| count += 1), 0);

        decoder.drain(usize::MAX, |_| count += 1);
        assert!(decoder.buffered() < frame.len());
        let taken = taken + decoder.feed(&stream[taken..], usize::MAX, |_| count += 1);
        assert_eq!(taken, stream.len());
        assert_eq!(count, 40);
    }

    #[test]
    fn test_limit_counts_only_messages() {
        let frame = encode(&key_message(1, "left", 0, 0, true)).unwrap();
        let mut stream = std::vec![0x00, 0x01];
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&frame);

        let mut decoded = std::vec::Vec::new();
        let consumed = decode_at_most(&stream, 1, |m| decoded.push(m));
        assert_eq!(decoded.len(), 1);
        assert_eq!(consumed, 2 + frame.len());
    }
}
