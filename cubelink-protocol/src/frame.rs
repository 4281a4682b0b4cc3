//! Framing for the UART link to the radio network processor.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-48)
//! - TYPE (1 byte): request or event identifier
//! - PAYLOAD (0-48 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, and all PAYLOAD bytes
//!
//! The payload limit covers the largest over-the-air message plus the
//! status and link bytes the network processor prepends.

use heapless::Vec;

use crate::messages::MAX_MESSAGE_LEN;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 48;

/// Bytes around the payload (START + LENGTH + TYPE + CHECKSUM)
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

const _: () = assert!(MAX_MESSAGE_LEN + 2 <= MAX_PAYLOAD_SIZE);

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// Invalid frame structure
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// XOR checksum over length, type and payload
fn checksum(length: u8, kind: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ kind, |acc, byte| acc ^ byte)
}

/// One frame on the network-processor link
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Request or event identifier
    pub kind: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a frame, rejecting oversized payloads
    pub fn new(kind: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { kind, payload })
    }

    /// Create a frame with no payload
    pub fn empty(kind: u8) -> Self {
        Self {
            kind,
            payload: Vec::new(),
        }
    }

    /// Create a frame from a header and a body, concatenated
    pub fn with_header(kind: u8, header: &[u8], body: &[u8]) -> Result<Self, FrameError> {
        let mut payload = Vec::new();
        payload
            .extend_from_slice(header)
            .and_then(|_| payload.extend_from_slice(body))
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { kind, payload })
    }

    /// Bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let wire_len = self.wire_len();
        if buffer.len() < wire_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = self.payload.len() as u8;
        let end = 3 + self.payload.len();

        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.kind;
        buffer[3..end].copy_from_slice(&self.payload);
        buffer[end] = checksum(length, self.kind, &self.payload);

        Ok(wire_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Hunting for START
    Idle,
    Length,
    Kind,
    Payload,
    Checksum,
}

/// Byte-at-a-time frame parser that resynchronises on START
#[derive(Debug, Clone)]
pub struct FrameParser {
    stage: Stage,
    length: u8,
    kind: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            stage: Stage::Idle,
            length: 0,
            kind: 0,
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame and hunt for the next START
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.length = 0;
        self.kind = 0;
        self.payload.clear();
    }

    /// True while a frame is partially received
    pub fn in_frame(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// After an error the parser is back to hunting for START.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.stage {
            Stage::Idle => {
                if byte == FRAME_START {
                    self.stage = Stage::Length;
                }
                Ok(None)
            }
            Stage::Length => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.length = byte;
                self.stage = Stage::Kind;
                Ok(None)
            }
            Stage::Kind => {
                self.kind = byte;
                self.payload.clear();
                self.stage = if self.length == 0 {
                    Stage::Checksum
                } else {
                    Stage::Payload
                };
                Ok(None)
            }
            Stage::Payload => {
                if self.payload.push(byte).is_err() {
                    self.reset();
                    return Err(FrameError::PayloadTooLarge);
                }
                if self.payload.len() == self.length as usize {
                    self.stage = Stage::Checksum;
                }
                Ok(None)
            }
            Stage::Checksum => {
                let valid = byte == checksum(self.length, self.kind, &self.payload);
                let frame = Frame {
                    kind: self.kind,
                    payload: core::mem::take(&mut self.payload),
                };
                self.reset();

                if valid {
                    Ok(Some(frame))
                } else {
                    Err(FrameError::InvalidChecksum)
                }
            }
        }
    }

    /// Feed bytes until the first complete frame
    ///
    /// Returns the frame and how many bytes were consumed, so the caller
    /// can continue with the remainder.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<(Option<Frame>, usize), FrameError> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = self.feed(byte)? {
                return Ok((Some(frame), i + 1));
            }
        }
        Ok((None, bytes.len()))
    }
}
