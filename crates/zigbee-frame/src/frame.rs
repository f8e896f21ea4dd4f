//! Escaped API frame encoding/decoding.
//!
//! Every frame on the serial link has the following layout:
//!
//! ```text
//! +------+--------+--------+------------+-------------------+----------+
//! | 0x7E | len_hi | len_lo | frame_type | payload[0..len-1] | checksum |
//! +------+--------+--------+------------+-------------------+----------+
//! ```
//!
//! - `len` counts the *unescaped* bytes of `frame_type ++ payload`.
//! - `checksum = 0xFF - (sum(frame_type ++ payload) mod 0x100)`.
//! - Any of `0x7E 0x7D 0x11 0x13` inside `frame_type ++ payload ++ checksum`
//!   is sent as `0x7D, byte ^ 0x20`. The delimiter and the two length bytes
//!   are never escaped.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;

use crate::FrameError;

/// Start-of-frame delimiter.
pub const START_DELIMITER: u8 = 0x7E;
/// Escape marker; the following byte is XOR'd with [`ESCAPE_XOR`].
pub const ESCAPE: u8 = 0x7D;
/// Software flow control byte (resume).
pub const XON: u8 = 0x11;
/// Software flow control byte (pause).
pub const XOFF: u8 = 0x13;
/// Value XOR'd into an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

/// Delimiter plus two length bytes.
pub const FRAME_HEADER_LEN: usize = 3;
/// Largest `frame_type ++ payload` the length field can describe.
pub const MAX_FRAME_BODY: usize = u16::MAX as usize;

/// Initial receive buffer capacity.
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Whether a byte must be escaped inside a frame body.
pub fn needs_escape(byte: u8) -> bool {
    matches!(byte, START_DELIMITER | ESCAPE | XON | XOFF)
}

/// Compute the frame checksum over unescaped `frame_type ++ payload` bytes.
pub fn checksum(body: &[u8]) -> u8 {
    0xFF - body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

fn put_escaped(buf: &mut Vec<u8>, byte: u8) {
    if needs_escape(byte) {
        buf.push(ESCAPE);
        buf.push(byte ^ ESCAPE_XOR);
    } else {
        buf.push(byte);
    }
}

/// A decoded transport frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// API frame type identifier.
    pub frame_type: u8,
    /// Frame payload (unescaped).
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Self {
        Frame {
            frame_type,
            payload,
        }
    }

    /// Checksum byte this frame carries on the wire.
    pub fn checksum(&self) -> u8 {
        let sum = self
            .payload
            .iter()
            .fold(self.frame_type, |acc, &b| acc.wrapping_add(b));
        0xFF - sum
    }

    /// Encode this frame for transmission.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        FrameCodec::encode(self.frame_type, &self.payload)
    }
}

/// A codec for reading and writing escaped API frames.
///
/// Received bytes are accumulated with [`push`](FrameCodec::push) and complete
/// frames are pulled out with [`decode`](FrameCodec::decode).
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming (still escaped) data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete frame from the buffer.
    ///
    /// Returns `Ok(Some(frame))` when a frame is complete and verified, and
    /// `Ok(None)` when more bytes are needed; in that case nothing from the
    /// pending frame is consumed.
    ///
    /// On `Err` the offending bytes have been dropped and the next call
    /// resumes at the following delimiter:
    /// - [`FrameError::ChecksumMismatch`]: the whole frame is discarded.
    /// - [`FrameError::Framing`]: a delimiter showed up inside the body, or
    ///   the length was zero.
    pub fn decode(&mut self) -> Result<Option<Frame>, FrameError> {
        self.resync();

        if self.buffer.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        // Length is never escaped
        let len = u16::from_be_bytes([self.buffer[1], self.buffer[2]]) as usize;
        if len == 0 {
            self.buffer.advance(1);
            return Err(FrameError::framing("zero-length frame"));
        }

        // Body plus checksum needs at least len + 1 raw bytes, unless a
        // delimiter already shows the frame was cut short
        if self.buffer.len() < FRAME_HEADER_LEN + len + 1
            && !self.buffer[FRAME_HEADER_LEN..].contains(&START_DELIMITER)
        {
            return Ok(None);
        }

        let mut body = Vec::with_capacity(len + 1);
        let mut pos = FRAME_HEADER_LEN;
        while body.len() < len + 1 {
            let byte = match self.buffer.get(pos) {
                Some(&b) => b,
                None => return Ok(None),
            };
            match byte {
                START_DELIMITER => {
                    let got = body.len();
                    self.buffer.advance(pos);
                    return Err(FrameError::framing(format!(
                        "frame truncated after {} of {} bytes",
                        got,
                        len + 1
                    )));
                }
                ESCAPE => {
                    let next = match self.buffer.get(pos + 1) {
                        Some(&b) => b,
                        None => return Ok(None),
                    };
                    if next == START_DELIMITER {
                        self.buffer.advance(pos + 1);
                        return Err(FrameError::framing("escape followed by start delimiter"));
                    }
                    body.push(next ^ ESCAPE_XOR);
                    pos += 2;
                }
                _ => {
                    body.push(byte);
                    pos += 1;
                }
            }
        }
        self.buffer.advance(pos);

        // Loop above guarantees len + 1 >= 2 bytes
        let actual = body.pop().unwrap_or_default();
        let expected = checksum(&body);
        if actual != expected {
            log::trace!(
                "dropping frame with bad checksum: {}",
                hex::encode(&body)
            );
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }

        let payload = body.split_off(1);
        Ok(Some(Frame {
            frame_type: body[0],
            payload,
        }))
    }

    /// Encode a frame: delimiter, big-endian length, escaped body, escaped checksum.
    pub fn encode(frame_type: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
        let len = payload.len() + 1;
        if len > MAX_FRAME_BODY {
            return Err(FrameError::FrameTooLong {
                max: MAX_FRAME_BODY,
                actual: len,
            });
        }

        let mut sum = frame_type;
        let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + 2 * (len + 1));
        buf.push(START_DELIMITER);
        buf.put_u16(len as u16);
        put_escaped(&mut buf, frame_type);
        for &byte in payload {
            sum = sum.wrapping_add(byte);
            put_escaped(&mut buf, byte);
        }
        put_escaped(&mut buf, 0xFF - sum);
        Ok(buf)
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard bytes ahead of the next start delimiter.
    fn resync(&mut self) {
        let skip = self
            .buffer
            .iter()
            .position(|&b| b == START_DELIMITER)
            .unwrap_or(self.buffer.len());
        if skip > 0 {
            log::trace!("discarding {} bytes before start delimiter", skip);
            self.buffer.advance(skip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reply frame a SmartPlug sends when its relay is off.
    const SWITCH_OFF_REPLY: &[u8] = b"~\x00\x19}1\x00\x00\ro\x00\x03\xbb\xb9\xf8\x88\x9f\x00\x02\x00\xee\xc2\x16\x00\x00\th\x80\x06\x00\x1d";

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[]), 0xFF);
        assert_eq!(checksum(&[0x08, 0x01, 0x4E, 0x49]), 0x5F);
        let frame = Frame::new(0x08, vec![0x01, 0x4E, 0x49]);
        assert_eq!(frame.checksum(), 0x5F);
    }

    #[test]
    fn test_encode_known_frame() {
        let body = &SWITCH_OFF_REPLY[..];
        let mut codec = FrameCodec::new();
        codec.push(body);
        let frame = codec.decode().unwrap().expect("should decode frame");
        assert_eq!(frame.frame_type, 0x11);
        assert_eq!(frame.payload.len(), 24);

        let encoded = frame.encode().unwrap();
        assert_eq!(encoded, SWITCH_OFF_REPLY);
    }

    #[test]
    fn test_length_counts_unescaped_bytes() {
        let encoded = FrameCodec::encode(0x7E, &[0x7D, 0x11, 0x13]).unwrap();
        assert_eq!(&encoded[..3], &[0x7E, 0x00, 0x04]);
        // 4 escaped body bytes, checksum 0xFF - 0x1F = 0xE0 is not escaped
        assert_eq!(encoded.len(), 3 + 8 + 1);
        assert_eq!(encoded[3], ESCAPE);
        assert_eq!(encoded[4], 0x7E ^ ESCAPE_XOR);
    }

    #[test]
    fn test_escaped_checksum() {
        // sum 0x81 -> checksum 0x7E, which must be escaped
        let encoded = FrameCodec::encode(0x01, &[0x80]).unwrap();
        assert_eq!(encoded, vec![0x7E, 0x00, 0x02, 0x01, 0x80, 0x7D, 0x5E]);

        let mut codec = FrameCodec::new();
        codec.push(&encoded);
        let frame = codec.decode().unwrap().unwrap();
        assert_eq!(frame, Frame::new(0x01, vec![0x80]));
    }

    #[test]
    fn test_partial_frame_is_not_consumed() {
        let encoded = FrameCodec::encode(0x10, b"partial data").unwrap();
        let mut codec = FrameCodec::new();

        codec.push(&encoded[..5]);
        assert_eq!(codec.decode(), Ok(None));
        assert_eq!(codec.buffered_len(), 5);

        codec.push(&encoded[5..]);
        let frame = codec.decode().unwrap().expect("should decode frame");
        assert_eq!(frame.payload, b"partial data");
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_split_escape_sequence() {
        let encoded = FrameCodec::encode(0x10, &[0x7D]).unwrap();
        let split = encoded.iter().position(|&b| b == ESCAPE).unwrap() + 1;

        let mut codec = FrameCodec::new();
        codec.push(&encoded[..split]);
        assert_eq!(codec.decode(), Ok(None));
        codec.push(&encoded[split..]);
        assert_eq!(codec.decode().unwrap().unwrap().payload, vec![0x7D]);
    }

    #[test]
    fn test_resync_discards_garbage() {
        let mut codec = FrameCodec::new();
        codec.push(&[0x00, 0x42, 0xFF]);
        codec.push(&FrameCodec::encode(0x20, b"ok").unwrap());

        let frame = codec.decode().unwrap().expect("should decode frame");
        assert_eq!(frame.payload, b"ok");
        assert_eq!(codec.decode(), Ok(None));
    }

    #[test]
    fn test_checksum_error_drops_frame() {
        let mut bad = FrameCodec::encode(0x20, b"first").unwrap();
        let last = bad.len() - 1;
        bad[last] ^= 0x01;

        let mut codec = FrameCodec::new();
        codec.push(&bad);
        codec.push(&FrameCodec::encode(0x20, b"second").unwrap());

        assert!(matches!(
            codec.decode(),
            Err(FrameError::ChecksumMismatch { .. })
        ));
        let frame = codec.decode().unwrap().expect("next frame survives");
        assert_eq!(frame.payload, b"second");
    }

    #[test]
    fn test_truncated_frame_resyncs() {
        let full = FrameCodec::encode(0x20, b"truncated frame").unwrap();
        let mut codec = FrameCodec::new();
        codec.push(&full[..8]);
        codec.push(&FrameCodec::encode(0x20, b"next").unwrap());

        assert!(matches!(codec.decode(), Err(FrameError::Framing(_))));
        let frame = codec.decode().unwrap().expect("next frame survives");
        assert_eq!(frame.payload, b"next");
    }

    #[test]
    fn test_zero_length_frame() {
        let mut codec = FrameCodec::new();
        codec.push(&[0x7E, 0x00, 0x00, 0xFF]);
        assert!(matches!(codec.decode(), Err(FrameError::Framing(_))));
        assert_eq!(codec.decode(), Ok(None));
    }

    #[test]
    fn test_too_long() {
        let payload = vec![0u8; MAX_FRAME_BODY];
        assert!(matches!(
            FrameCodec::encode(0x10, &payload),
            Err(FrameError::FrameTooLong { .. })
        ));
        assert!(FrameCodec::encode(0x10, &payload[1..]).is_ok());
    }
}
