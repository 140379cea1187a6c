use crate::framing::LengthRule;
use crate::protocol::Identity;

/// Errors raised by the framing codec, the decoders, the request builders and
/// the panel message loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ASCII-hex representation of a frame could not be decoded.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
    /// The trailing checksum byte does not close the frame sum to zero.
    #[error("Checksum error in frame {frame:02X?}")]
    ChecksumError { frame: Vec<u8> },
    /// A decoder received a message whose size contradicts the command's shape.
    #[error("Bad message length for command {command}: expected {rule} {expected} but got {actual}")]
    BadMessageLength {
        command: Identity,
        expected: usize,
        actual: usize,
        rule: LengthRule,
    },
    /// No decoder is registered for the command identity.
    #[error("Unknown command {0}")]
    UnknownCommand(Identity),
    /// A keypress sequence contains a code missing from the keypress table.
    #[error("Invalid key code 0x{0:02x}")]
    InvalidKeyCode(u8),
    /// A keypress sequence does not fit into a single frame.
    #[error("Too many keys: {count} (max {max})")]
    TooManyKeys { count: usize, max: usize },
    /// An equipment list request names an unknown data category.
    #[error("Invalid equipment list request type 0x{0:02x}")]
    InvalidRequestType(u8),
    /// The transport reached end of input or was closed.
    #[error("Transport closed")]
    TransportClosed,
    /// An I/O error, typically from the serial port communication.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// An error from the `serialport` crate.
    #[cfg(feature = "serialport")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl Error {
    /// Whether the message loop has to stop because of this error.
    ///
    /// Everything concerning a single frame is recoverable: the frame is
    /// dropped and the loop goes on with the next one.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::TransportClosed | Error::Io(_) => true,
            #[cfg(feature = "serialport")]
            Error::Serial(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_level_errors_are_not_fatal() {
        assert!(!Error::ChecksumError { frame: vec![1, 2] }.is_fatal());
        assert!(!Error::UnknownCommand(Identity::Single(0x7f)).is_fatal());
        assert!(!Error::MalformedFrame("x".into()).is_fatal());
        assert!(!Error::BadMessageLength {
            command: Identity::Single(0x21),
            expected: 7,
            actual: 3,
            rule: LengthRule::Exact,
        }
        .is_fatal());
    }

    #[test]
    fn transport_errors_are_fatal() {
        assert!(Error::TransportClosed.is_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(Error::from(io).is_fatal());
    }

    #[test]
    fn bad_length_message_names_the_command() {
        let err = Error::BadMessageLength {
            command: Identity::Extended(0x22, 0x01),
            expected: 8,
            actual: 5,
            rule: LengthRule::Exact,
        };
        assert_eq!(
            err.to_string(),
            "Bad message length for command 0x22/0x01: expected exactly 8 but got 5"
        );
    }
}
