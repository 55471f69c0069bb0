//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding PreMaid frames.
///
/// None of these are fatal on the receive path: the receiver drops the frame
/// and keeps going, since foreign frame types are ordinary traffic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// A frame needs at least a length byte.
    #[error("empty frame")]
    EmptyFrame,

    /// Leading length byte disagrees with the bytes actually present.
    #[error("length mismatch: frame declares {declared} bytes, got {actual}")]
    LengthMismatch {
        /// Length declared by the leading byte.
        declared: usize,
        /// Bytes present.
        actual: usize,
    },

    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame is some other response type (battery status and friends).
    #[error("not a telemetry response: length 0x{length:02X}, command 0x{command:02X}")]
    NotTelemetry {
        /// Leading length/opcode byte.
        length: u8,
        /// Command byte.
        command: u8,
    },

    /// Board flagged an error in the status byte.
    #[error("board reported status 0x{0:02X}")]
    StatusError(u8),

    /// Identifier outside 0x00..=0x1F.
    #[error("invalid servo id: 0x{0:02X}")]
    InvalidServoId(u8),

    /// Record identifiers do not form one contiguous page.
    #[error("record slot {slot}: expected servo id 0x{expected:02X}, found 0x{found:02X}")]
    IdentifierLayout {
        /// Slot index within the page.
        slot: usize,
        /// Identifier that slot must carry.
        expected: u8,
        /// Identifier found.
        found: u8,
    },

    /// Servo record cut short.
    #[error("servo record too short: expected {expected} bytes, got {actual}")]
    RecordTooShort {
        /// Record size.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Text span was not valid hex.
    #[error("invalid hex text: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
