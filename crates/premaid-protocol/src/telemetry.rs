//! Servo telemetry responses.
//!
//! A telemetry response reports one page of servos:
//!
//! ```text
//! E4 01 00 [record 0] [record 1] ... [record 15] checksum
//! ```
//!
//! Each 14-byte record is laid out as:
//!
//! ```text
//! +----+-------+-----+--------+-----------+----------+----------+---------+
//! | id | flags | raw | offset | commanded | reserved | velocity | stretch |
//! | 1  | 1     | 2   | 2      | 2         | 4        | 1        | 1       |
//! +----+-------+-----+--------+-----------+----------+----------+---------+
//! ```
//!
//! The 16-bit fields are signed little-endian. Bit 7 of `flags` marks the
//! reading as valid. Velocity and stretch are not decoded.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::{Page, ServoId};

/// Decode a signed little-endian 16-bit value.
///
/// Spelled out rather than going through `i16::from_le_bytes` so the two's
/// complement step is visible: `low + high * 256`, then folded into
/// `-32768..=32767`.
pub fn decode_i16_le(low: u8, high: u8) -> i16 {
    let value = i32::from(low) + i32::from(high) * 256;
    let signed = if value < 32768 { value } else { value - 65536 };
    signed as i16
}

/// One servo's state as reported in a telemetry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoSample {
    /// Servo identifier.
    pub id: ServoId,
    /// Whether the encoder reading is valid.
    pub is_valid: bool,
    /// Raw encoder value.
    pub raw: i16,
    /// Calibration offset.
    pub offset: i16,
    /// Commanded target value; zero while torque is released.
    pub commanded: i16,
}

impl ServoSample {
    /// Decode a record from the start of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < SERVO_RECORD_SIZE {
            return Err(ProtocolError::RecordTooShort {
                expected: SERVO_RECORD_SIZE,
                actual: data.len(),
            });
        }

        let field = |at: usize| decode_i16_le(data[at], data[at + 1]);
        Ok(ServoSample {
            id: ServoId::try_from(data[RECORD_ID])?,
            is_valid: data[RECORD_FLAGS] & SERVO_FLAG_VALID != 0,
            raw: field(RECORD_RAW),
            offset: field(RECORD_OFFSET),
            commanded: field(RECORD_COMMANDED),
        })
    }

    /// Encoder value with the calibration offset removed.
    pub fn calibrated(&self) -> i16 {
        self.raw.wrapping_sub(self.offset)
    }
}

/// A decoded telemetry response covering one page of servos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPage {
    page: Page,
    samples: Vec<ServoSample>,
}

impl TelemetryPage {
    /// Decode a telemetry frame.
    ///
    /// Checks, in order: the `E4 01 00` signature, the minimum length for a
    /// full page, and that the sixteen record identifiers run contiguously
    /// through exactly one page. Any failure rejects the whole frame.
    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let data = frame.as_bytes();
        if data.len() < FRAME_HEADER_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: TELEMETRY_FRAME_LEN,
                actual: data.len(),
            });
        }
        if data[0] != TELEMETRY_LENGTH || data[1] != CMD_SERVO_STATUS {
            return Err(ProtocolError::NotTelemetry {
                length: data[0],
                command: data[1],
            });
        }
        if data[2] != STATUS_OK {
            return Err(ProtocolError::StatusError(data[2]));
        }
        if data.len() < TELEMETRY_FRAME_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: TELEMETRY_FRAME_LEN,
                actual: data.len(),
            });
        }

        let page = match data[FRAME_HEADER_LEN] {
            id if id == Page::Low.first_id() => Page::Low,
            id if id == Page::High.first_id() => Page::High,
            found => {
                return Err(ProtocolError::IdentifierLayout {
                    slot: 0,
                    expected: Page::Low.first_id(),
                    found,
                })
            }
        };

        for (slot, expected) in page.ids().enumerate() {
            let found = data[record_start(slot)];
            if found != expected.raw() {
                return Err(ProtocolError::IdentifierLayout {
                    slot,
                    expected: expected.raw(),
                    found,
                });
            }
        }

        // A record that fails to decode only loses itself.
        let samples = (0..SERVOS_PER_PAGE)
            .filter_map(|slot| data.get(record_start(slot)..))
            .filter_map(|record| ServoSample::decode(record).ok())
            .collect();

        Ok(TelemetryPage { page, samples })
    }

    /// Page the response covers.
    pub fn page(&self) -> Page {
        self.page
    }

    /// Decoded records in identifier order.
    pub fn samples(&self) -> &[ServoSample] {
        &self.samples
    }

    /// Consume into the decoded records.
    pub fn into_samples(self) -> Vec<ServoSample> {
        self.samples
    }
}

fn record_start(slot: usize) -> usize {
    FRAME_HEADER_LEN + slot * SERVO_RECORD_SIZE
}
