//! Commands to send to the board.
//!
//! Commands are built with a trailing `FF` placeholder. Before transmission
//! the placeholder is overwritten with the XOR of every preceding byte
//! ([`seal_xor`]); the board discards commands whose seal does not match.

use bytes::BufMut;

use crate::constants::*;
use crate::types::{Joint, Page};

/// Commands that can be sent to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request the status records of one page of servos.
    ReadServoStatus {
        /// Page to read.
        page: Page,
    },

    /// Release torque on every fitted servo (commanded value 0).
    AllServoStop,
}

impl Command {
    /// Encode the command without the XOR seal.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::ReadServoStatus { page } => {
                let mut buf = Vec::with_capacity(READ_REQUEST_PREFIX.len() + 3);
                buf.put_slice(&READ_REQUEST_PREFIX);
                buf.put_u8(page.first_id());
                buf.put_u8(READ_REQUEST_SUFFIX);
                buf.put_u8(XOR_PLACEHOLDER);
                buf
            }
            Command::AllServoStop => {
                let mut buf = Vec::with_capacity(ALL_STOP_HEADER.len() + Joint::ALL.len() * 3 + 1);
                buf.put_slice(&ALL_STOP_HEADER);
                for joint in Joint::ALL {
                    buf.put_u8(joint.id().raw());
                    buf.put_u16_le(0);
                }
                buf.put_u8(XOR_PLACEHOLDER);
                buf
            }
        }
    }

    /// Encode the command ready for the wire.
    pub fn seal(&self) -> Vec<u8> {
        let mut bytes = self.encode();
        seal_xor(&mut bytes);
        bytes
    }

    /// Sealed command as space-separated uppercase hex, the form the serial
    /// bridge accepts after `SEND:`.
    pub fn to_hex_line(&self) -> String {
        to_hex_line(&self.seal())
    }
}

/// Overwrite the final byte with the XOR of all bytes before it.
///
/// Encode direction only; applying it twice is not an inverse.
pub fn seal_xor(bytes: &mut [u8]) {
    if let Some((last, body)) = bytes.split_last_mut() {
        *last = body.iter().fold(0, |acc, b| acc ^ b);
    }
}

/// Render bytes as space-separated uppercase hex pairs.
pub fn to_hex_line(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_encoding() {
        let cmd = Command::ReadServoStatus { page: Page::Low };
        assert_eq!(cmd.encode(), vec![0x07, 0x01, 0x00, 0x05, 0x00, 0xE0, 0xFF]);

        let cmd = Command::ReadServoStatus { page: Page::High };
        assert_eq!(cmd.encode(), vec![0x07, 0x01, 0x00, 0x05, 0x10, 0xE0, 0xFF]);
    }

    #[test]
    fn test_read_request_sealed() {
        assert_eq!(
            Command::ReadServoStatus { page: Page::Low }.to_hex_line(),
            "07 01 00 05 00 E0 E3"
        );
        assert_eq!(
            Command::ReadServoStatus { page: Page::High }.to_hex_line(),
            "07 01 00 05 10 E0 F3"
        );
    }

    #[test]
    fn test_all_stop_layout() {
        let bytes = Command::AllServoStop.encode();
        assert_eq!(bytes.len(), 80);
        assert_eq!(bytes[0] as usize, bytes.len());
        assert_eq!(&bytes[..4], &[0x50, 0x18, 0x00, 0x06]);
        assert_eq!(&bytes[4..7], &[0x02, 0x00, 0x00]);
        assert_eq!(&bytes[73..79], &[0x1A, 0x00, 0x00, 0x1C, 0x00, 0x00]);
        assert_eq!(bytes[79], 0xFF);
    }

    #[test]
    fn test_all_stop_seal() {
        let sealed = Command::AllServoStop.seal();
        let expected = sealed[..79].iter().fold(0u8, |acc, b| acc ^ b);
        assert_eq!(sealed[79], expected);
        assert_eq!(&sealed[..79], &Command::AllServoStop.encode()[..79]);
    }

    #[test]
    fn test_seal_is_not_self_inverse() {
        let mut bytes = vec![0x01, 0x02, 0xFF];
        seal_xor(&mut bytes);
        assert_eq!(bytes, vec![0x01, 0x02, 0x03]);
        seal_xor(&mut bytes);
        assert_eq!(bytes, vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_seal_empty() {
        let mut bytes: Vec<u8> = Vec::new();
        seal_xor(&mut bytes);
        assert!(bytes.is_empty());
    }
}
