//! Frame assembly over the bridge's hex text stream.
//!
//! The serial bridge reports received bytes as hex text with no separators,
//! and it splits that text into lines wherever the serial read happened to
//! return. A frame's first byte is its total length in bytes:
//!
//! ```text
//! +--------+---------+--------+-------------------+----------+
//! | length | command | status | payload           | checksum |
//! +--------+---------+--------+-------------------+----------+
//! ```
//!
//! [`FrameAssembler`] rebuilds frames from arbitrarily fragmented text.

use bytes::BytesMut;
use log::{debug, trace};

use crate::constants::*;
use crate::error::ProtocolError;

/// Initial capacity of the pending text buffer (two telemetry frames).
pub const PENDING_CAPACITY: usize = TELEMETRY_FRAME_LEN * HEX_CHARS_PER_BYTE * 2;

/// One complete protocol frame.
///
/// The leading length byte always equals the number of bytes held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    /// Wrap decoded frame bytes, checking the declared length.
    pub fn new(data: Vec<u8>) -> Result<Self, ProtocolError> {
        let declared = *data.first().ok_or(ProtocolError::EmptyFrame)? as usize;
        if declared != data.len() {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }
        Ok(Frame { data })
    }

    /// Parse a frame from contiguous hex text.
    pub fn from_hex(text: &str) -> Result<Self, ProtocolError> {
        Frame::new(hex::decode(text)?)
    }

    /// Declared frame length in bytes.
    pub fn length(&self) -> u8 {
        self.data[0]
    }

    /// Command byte, if the frame is long enough to carry one.
    pub fn command(&self) -> Option<u8> {
        self.data.get(1).copied()
    }

    /// Status (error flag) byte.
    pub fn status(&self) -> Option<u8> {
        self.data.get(2).copied()
    }

    /// Bytes between the header and the checksum.
    pub fn payload(&self) -> &[u8] {
        if self.data.len() < MIN_FRAME_LEN {
            return &[];
        }
        &self.data[FRAME_HEADER_LEN..self.data.len() - 1]
    }

    /// Trailing checksum byte.
    pub fn checksum(&self) -> Option<u8> {
        if self.data.len() < MIN_FRAME_LEN {
            return None;
        }
        self.data.last().copied()
    }

    /// The whole frame, length byte included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes in the frame.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Frames are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Rebuilds frames from the bridge's hex text.
///
/// At most one frame is extracted per [`feed`](Self::feed) call. Whatever is
/// left over waits for the next call, so a caller that feeds one line per tick
/// drains a burst of frames over several ticks.
#[derive(Debug)]
pub struct FrameAssembler {
    /// Hex characters not yet consumed by a frame.
    buffer: BytesMut,
    /// Times the buffer was discarded on a bad length byte.
    desyncs: u64,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        FrameAssembler {
            buffer: BytesMut::with_capacity(PENDING_CAPACITY),
            desyncs: 0,
        }
    }

    /// Append received text, dropping whitespace and line terminators.
    pub fn push(&mut self, data: &[u8]) {
        for &byte in data {
            if !byte.is_ascii_whitespace() {
                self.buffer.extend_from_slice(&[byte]);
            }
        }
    }

    /// Append one received line and try to extract a frame.
    pub fn feed(&mut self, line: &str) -> Option<Frame> {
        self.push(line.as_bytes());
        self.next_frame()
    }

    /// Try to extract the next complete frame from the buffer.
    ///
    /// A leading length byte of zero (or a pair that is not hex at all) means
    /// the stream lost sync; the whole buffer is discarded.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.buffer.len() < HEX_CHARS_PER_BYTE {
            return None;
        }

        let declared = match hex_byte(self.buffer[0], self.buffer[1]) {
            Some(0) | None => {
                debug!(
                    "stream desync, discarding {} buffered chars",
                    self.buffer.len()
                );
                self.buffer.clear();
                self.desyncs += 1;
                return None;
            }
            Some(len) => len as usize,
        };

        let span = declared * HEX_CHARS_PER_BYTE;
        if self.buffer.len() < span {
            return None;
        }

        let text = self.buffer.split_to(span);
        match hex::decode(&text[..]).map_err(ProtocolError::from).and_then(Frame::new) {
            Ok(frame) => Some(frame),
            Err(e) => {
                trace!("dropping {} byte frame: {}", declared, e);
                None
            }
        }
    }

    /// Get the number of buffered hex characters.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Times the buffer was discarded because of a bad length byte.
    pub fn desync_count(&self) -> u64 {
        self.desyncs
    }

    /// Discard everything buffered.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

fn hex_byte(high: u8, low: u8) -> Option<u8> {
    let high = (high as char).to_digit(16)?;
    let low = (low as char).to_digit(16)?;
    Some((high * 16 + low) as u8)
}
