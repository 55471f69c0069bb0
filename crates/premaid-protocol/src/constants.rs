//! Protocol constants
//!
//! Byte values and layout sizes used on the PreMaid AI serial link. All
//! multi-byte fields on the wire are little-endian.

// ============================================================================
// Frame Layout
// ============================================================================

/// Number of header bytes preceding the payload: length, command, status.
pub const FRAME_HEADER_LEN: usize = 3;
/// Smallest frame that carries a header and a checksum byte.
pub const MIN_FRAME_LEN: usize = FRAME_HEADER_LEN + 1;
/// Hex characters used to encode one byte on the bridge text stream.
pub const HEX_CHARS_PER_BYTE: usize = 2;

// ============================================================================
// Telemetry Response (board → host)
// ============================================================================

/// Leading byte of a servo telemetry response.
///
/// This is the declared frame length (228 bytes) and doubles as the
/// response opcode.
pub const TELEMETRY_LENGTH: u8 = 0xE4;
/// Command byte of a servo status response.
pub const CMD_SERVO_STATUS: u8 = 0x01;
/// Status byte reported when the board raised no error.
pub const STATUS_OK: u8 = 0x00;
/// Size of one servo record in a telemetry payload.
pub const SERVO_RECORD_SIZE: usize = 14;
/// Servo records carried by one telemetry response.
pub const SERVOS_PER_PAGE: usize = 16;
/// Minimum length of a telemetry frame holding a full page of records.
pub const TELEMETRY_FRAME_LEN: usize = FRAME_HEADER_LEN + SERVOS_PER_PAGE * SERVO_RECORD_SIZE + 1;
/// Flag bit marking a record's encoder reading as valid.
pub const SERVO_FLAG_VALID: u8 = 0x80;

// Offsets inside a servo record.
pub(crate) const RECORD_ID: usize = 0;
pub(crate) const RECORD_FLAGS: usize = 1;
pub(crate) const RECORD_RAW: usize = 2;
pub(crate) const RECORD_OFFSET: usize = 4;
pub(crate) const RECORD_COMMANDED: usize = 6;

// ============================================================================
// Commands (host → board)
// ============================================================================

/// Servo status read request, up to the page offset byte.
pub const READ_REQUEST_PREFIX: [u8; 4] = [0x07, 0x01, 0x00, 0x05];
/// Byte following the page offset in a read request.
pub const READ_REQUEST_SUFFIX: u8 = 0xE0;
/// Header of the all-servo torque release command.
pub const ALL_STOP_HEADER: [u8; 4] = [0x50, 0x18, 0x00, 0x06];
/// Trailing placeholder replaced by the XOR seal before transmission.
pub const XOR_PLACEHOLDER: u8 = 0xFF;
