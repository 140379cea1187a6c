//! Conversion between the ASCII-hex wire representation and binary messages.
//!
//! On the wire every frame is a linefeed followed by hex digit pairs:
//!
//! ```text
//! \n LL CC [CC] PP .. PP KK
//! ```
//!
//! `LL` is the number of bytes following it (command bytes, payload and the
//! checksum `KK`). The checksum closes the sum of all frame bytes to zero
//! modulo 256.

use crate::protocol::Identity;
use crate::{Error, Result};
use std::fmt;

/// Start of every frame on the wire.
pub const LINE_FEED: u8 = 0x0a;
/// Positive acknowledgement, written after each valid frame.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement. Only ever received from the panel.
pub const NAK: u8 = 0x15;

/// Decodes a string of hex digit pairs (no linefeed) into message bytes.
pub fn decode_message_from_ascii(text: &str) -> Result<Vec<u8>> {
    let digits = text.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(Error::MalformedFrame(format!(
            "odd number of hex digits ({})",
            digits.len()
        )));
    }
    digits
        .chunks(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(high), Some(low)) => Ok((high << 4) | low),
            _ => Err(Error::MalformedFrame(format!(
                "invalid hex pair {:?}",
                String::from_utf8_lossy(pair)
            ))),
        })
        .collect()
}

/// Renders message bytes as uppercase hex digit pairs.
pub fn encode_message_to_ascii(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Checksum byte that, appended to `bytes`, makes the total sum zero modulo 256.
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(sum(bytes))
}

/// Verifies a complete message whose final byte is the checksum.
pub fn verify_checksum(bytes: &[u8]) -> bool {
    !bytes.is_empty() && sum(bytes) == 0
}

/// Appends the checksum byte to an outbound message.
pub fn append_checksum(message: &mut Vec<u8>) {
    let checksum = compute_checksum(message);
    message.push(checksum);
}

/// How the actual message length is compared with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Exact,
    /// Trailing variable-length data (text) is allowed.
    AtLeast,
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LengthRule::Exact => write!(f, "exactly"),
            LengthRule::AtLeast => write!(f, "at least"),
        }
    }
}

/// Validates the size of a decoded message before its payload is accessed.
///
/// `desired` is the value the length byte would carry, the message itself is
/// one byte longer because of the length byte.
pub fn check_length(
    msg: &[u8],
    command: Identity,
    desired: usize,
    rule: LengthRule,
) -> Result<()> {
    let bad_len = match rule {
        LengthRule::Exact => msg.len() != desired + 1,
        LengthRule::AtLeast => msg.len() < desired + 1,
    };
    if bad_len {
        log::warn!(
            "Invalid message size for {} - required {} {} received={}",
            command,
            rule,
            desired,
            msg.len().saturating_sub(1)
        );
        return Err(Error::BadMessageLength {
            command,
            expected: desired,
            actual: msg.len().saturating_sub(1),
            rule,
        });
    }
    Ok(())
}

/// Big-endian value of the first four bytes of `data`, `None` when shorter.
pub fn be_u32(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// What the [`FrameReader`] recognised in the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete frame, hex-decoded, checksum not yet verified.
    Frame(Vec<u8>),
    Ack,
    Nak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Between frames, waiting for a linefeed.
    Idle,
    /// Collecting the hex digits of a frame.
    InFrame,
}

/// Assembles frames from single bytes as they arrive from the transport.
///
/// Partial reads are fine: the reader keeps its state between calls. Garbage
/// resynchronises on the next linefeed.
#[derive(Debug)]
pub struct FrameReader {
    state: ReadState,
    digits: String,
    expected_digits: Option<usize>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: ReadState::Idle,
            digits: String::with_capacity(64),
            expected_digits: None,
        }
    }

    /// True when no frame is partially received.
    pub fn is_idle(&self) -> bool {
        self.state == ReadState::Idle
    }

    /// Drops a partially received frame.
    pub fn reset(&mut self) {
        self.state = ReadState::Idle;
        self.digits.clear();
        self.expected_digits = None;
    }

    fn start_frame(&mut self) {
        self.state = ReadState::InFrame;
        self.digits.clear();
        self.expected_digits = None;
    }

    fn abandon(&mut self, reason: String) -> Result<Option<FrameEvent>> {
        self.reset();
        Err(Error::MalformedFrame(reason))
    }

    /// Feeds one byte into the reader.
    ///
    /// Returns `Ok(None)` while more bytes are needed and an error when the
    /// frame in progress had to be discarded.
    pub fn push(&mut self, byte: u8) -> Result<Option<FrameEvent>> {
        match self.state {
            ReadState::Idle => match byte {
                LINE_FEED => {
                    self.start_frame();
                    Ok(None)
                }
                ACK => Ok(Some(FrameEvent::Ack)),
                NAK => Ok(Some(FrameEvent::Nak)),
                _ => {
                    log::trace!("Discarding stray byte {:02X?} between frames", byte);
                    Ok(None)
                }
            },
            ReadState::InFrame => {
                if byte == LINE_FEED {
                    let partial = std::mem::take(&mut self.digits);
                    self.start_frame();
                    return Err(Error::MalformedFrame(format!(
                        "frame {partial:?} interrupted by linefeed"
                    )));
                }
                if hex_value(byte).is_none() {
                    return self.abandon(format!("non-hex byte {byte:02X?} inside frame"));
                }
                self.digits.push(byte as char);

                if self.expected_digits.is_none() && self.digits.len() == 2 {
                    let length = decode_message_from_ascii(&self.digits)?[0] as usize;
                    if length == 0 {
                        return self.abandon("zero frame length".to_string());
                    }
                    self.expected_digits = Some(2 + 2 * length);
                }

                match self.expected_digits {
                    Some(expected) if self.digits.len() == expected => {
                        let frame = decode_message_from_ascii(&self.digits);
                        self.reset();
                        log::trace!("Frame complete: {:02X?}", frame);
                        frame.map(|bytes| Some(FrameEvent::Frame(bytes)))
                    }
                    _ => Ok(None),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(reader: &mut FrameReader, bytes: &[u8]) -> Vec<Result<Option<FrameEvent>>> {
        bytes.iter().map(|b| reader.push(*b)).collect()
    }

    fn events(results: Vec<Result<Option<FrameEvent>>>) -> Vec<FrameEvent> {
        results.into_iter().filter_map(|r| r.ok().flatten()).collect()
    }

    #[test]
    fn hex_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = encode_message_to_ascii(&bytes);
        assert_eq!(text.len(), 512);
        assert_eq!(decode_message_from_ascii(&text).unwrap(), bytes);
    }

    #[test]
    fn encodes_uppercase_and_decodes_either_case() {
        assert_eq!(encode_message_to_ascii(&[0x0a, 0xff, 0x00]), "0AFF00");
        assert_eq!(
            decode_message_from_ascii("0aFf00").unwrap(),
            vec![0x0a, 0xff, 0x00]
        );
    }

    #[test]
    fn rejects_odd_length_and_non_hex() {
        assert!(matches!(
            decode_message_from_ascii("123"),
            Err(Error::MalformedFrame(_))
        ));
        assert!(matches!(
            decode_message_from_ascii("12zz"),
            Err(Error::MalformedFrame(_))
        ));
        assert_eq!(decode_message_from_ascii("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn appended_checksum_always_verifies() {
        for msg in [
            vec![0x02, 0x20],
            vec![0x03, 0x02, 0x03],
            vec![0x07, 0x21, 0x05, 0x00, 0x00, 0xa7, 0x19],
            vec![0xff; 40],
            vec![],
        ] {
            let mut framed = msg.clone();
            append_checksum(&mut framed);
            assert!(verify_checksum(&framed), "{framed:02X?}");
        }
    }

    #[test]
    fn checksum_closes_sum_to_zero() {
        assert_eq!(compute_checksum(&[0x02, 0x20]), 0xde);
        assert_eq!(compute_checksum(&[]), 0x00);
        assert_eq!(compute_checksum(&[0x80, 0x80]), 0x00);
    }

    #[test]
    fn single_bit_flip_is_detected() {
        let mut framed = vec![0x08, 0x22, 0x01, 0x04, 0x00, 0x00, 0x50, 0x03];
        append_checksum(&mut framed);
        for index in 0..framed.len() {
            for bit in 0..8 {
                let mut corrupted = framed.clone();
                corrupted[index] ^= 1 << bit;
                assert!(!verify_checksum(&corrupted), "byte {index} bit {bit}");
            }
        }
    }

    #[test]
    fn check_length_exact_and_at_least() {
        let msg = [0x07, 0x21, 0x05, 0x00, 0x00, 0xa7, 0x19, 0x00];
        let id = Identity::Single(0x21);
        assert!(check_length(&msg, id, 0x07, LengthRule::Exact).is_ok());
        assert!(check_length(&msg, id, 0x05, LengthRule::AtLeast).is_ok());
        match check_length(&msg, id, 0x09, LengthRule::AtLeast) {
            Err(Error::BadMessageLength {
                command,
                expected,
                actual,
                rule,
            }) => {
                assert_eq!(command, id);
                assert_eq!(expected, 9);
                assert_eq!(actual, 7);
                assert_eq!(rule, LengthRule::AtLeast);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_length(&msg, id, 0x06, LengthRule::Exact).is_err());
    }

    #[test]
    fn be_u32_reads_big_endian() {
        assert_eq!(be_u32(&[0x00, 0x01, 0x02, 0x03, 0xff]), Some(0x0001_0203));
        assert_eq!(be_u32(&[0xff, 0xff, 0xff, 0xff]), Some(u32::MAX));
        assert_eq!(be_u32(&[0x01, 0x02, 0x03]), None);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let mut reader = FrameReader::new();
        feed(&mut reader, b"\n0721");
        assert!(!reader.is_idle());
        reader.reset();
        assert!(reader.is_idle());
        let results = feed(&mut reader, b"0220DE\n0220DE");
        assert_eq!(events(results), vec![FrameEvent::Frame(vec![0x02, 0x20, 0xde])]);
    }

    #[test]
    fn reader_assembles_frame_across_pushes() {
        let mut reader = FrameReader::new();
        let results = feed(&mut reader, b"\n0220DE");
        let last = results.last().unwrap().as_ref().unwrap().clone();
        assert_eq!(last, Some(FrameEvent::Frame(vec![0x02, 0x20, 0xde])));
        assert!(reader.is_idle());
    }

    #[test]
    fn reader_reports_ack_and_nak_between_frames() {
        let mut reader = FrameReader::new();
        let got = events(feed(&mut reader, &[ACK, b'x', NAK]));
        assert_eq!(got, vec![FrameEvent::Ack, FrameEvent::Nak]);
    }

    #[test]
    fn reader_resyncs_after_garbage() {
        let mut reader = FrameReader::new();
        let results = feed(&mut reader, b"\n07zz21\n0220DE");
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::MalformedFrame(_)))));
        assert_eq!(
            events(results),
            vec![FrameEvent::Frame(vec![0x02, 0x20, 0xde])]
        );
    }

    #[test]
    fn reader_restarts_on_linefeed_inside_frame() {
        let mut reader = FrameReader::new();
        let results = feed(&mut reader, b"\n0721\n0220DE");
        let errors = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(errors, 1);
        assert_eq!(
            events(results),
            vec![FrameEvent::Frame(vec![0x02, 0x20, 0xde])]
        );
    }

    #[test]
    fn reader_is_busy_mid_frame() {
        let mut reader = FrameReader::new();
        feed(&mut reader, b"\n07");
        assert!(!reader.is_idle());
    }
}
