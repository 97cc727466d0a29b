//! On-disk layout.
//!
//! ```text
//! file   := header frame*
//! header := "TCJ1" | version u16 LE | reserved u16 | created_at i64 LE (unix seconds)
//! frame  := kind u8 | reserved [u8; 3] | len u32 LE | payload [u8; len]
//! ```

use chrono::{DateTime, TimeZone, Utc};

use crate::errors::JournalError;

/// Journal file magic bytes.
pub const MAGIC: [u8; 4] = *b"TCJ1";

/// Current journal format version.
pub const VERSION: u16 = 1;

/// File header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest accepted payload.
///
/// An evidence entry can be several times larger than the upload it came
/// from: ECMAScript number formatting expands exponents (`1e20` becomes 21
/// digits) and the normalized text is escaped again inside the JSON entry.
/// The ingestion service checks its body limit against this value.
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

const KIND_ENTRY_JSON: u8 = 0x01;

/// Journal file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Format version.
    pub version: u16,
    /// When the journal file was created, in unix seconds.
    pub created_at: i64,
}

impl JournalHeader {
    /// Header for a journal created now.
    pub fn new() -> Self {
        Self {
            version: VERSION,
            created_at: Utc::now().timestamp(),
        }
    }

    /// Creation time, if representable.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_at, 0).single()
    }

    /// Encodes the header.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..].copy_from_slice(&self.created_at.to_le_bytes());
        bytes
    }

    /// Decodes and checks a header.
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Result<Self, JournalError> {
        if bytes[..4] != MAGIC {
            return Err(JournalError::InvalidHeader(
                "not a tracechain journal (bad magic)".to_string(),
            ));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(JournalError::InvalidHeader(format!(
                "unsupported version {}, expected {}",
                version, VERSION
            )));
        }
        if bytes[6..8] != [0, 0] {
            return Err(JournalError::InvalidHeader(
                "reserved header bytes are set".to_string(),
            ));
        }

        let mut created_at = [0u8; 8];
        created_at.copy_from_slice(&bytes[8..]);
        Ok(Self {
            version,
            created_at: i64::from_le_bytes(created_at),
        })
    }
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload type of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 JSON [`JournalEntry`](crate::JournalEntry).
    EntryJson,
    /// Kind written by a newer format; readers skip it.
    Unknown(u8),
}

impl From<u8> for FrameKind {
    fn from(byte: u8) -> Self {
        match byte {
            KIND_ENTRY_JSON => FrameKind::EntryJson,
            other => FrameKind::Unknown(other),
        }
    }
}

impl From<FrameKind> for u8 {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::EntryJson => KIND_ENTRY_JSON,
            FrameKind::Unknown(byte) => byte,
        }
    }
}

/// Header preceding each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload type.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl FrameHeader {
    /// Header for a payload of `len` bytes.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        match u32::try_from(len) {
            Ok(len) if len <= MAX_PAYLOAD_SIZE => Ok(Self { kind, len }),
            _ => Err(JournalError::PayloadTooLarge {
                size: len as u64,
                max: MAX_PAYLOAD_SIZE,
            }),
        }
    }

    /// Encodes the frame header.
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = self.kind.into();
        bytes[4..].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    /// Decodes the frame header found at byte `offset` of the file.
    pub fn decode(bytes: &[u8; FRAME_HEADER_SIZE], offset: u64) -> Result<Self, JournalError> {
        let invalid = |reason: String| JournalError::InvalidFrame { offset, reason };

        if bytes[1..4] != [0, 0, 0] {
            return Err(invalid("reserved frame bytes are set".to_string()));
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len > MAX_PAYLOAD_SIZE {
            return Err(invalid(format!(
                "payload length {} exceeds maximum {}",
                len, MAX_PAYLOAD_SIZE
            )));
        }

        Ok(Self {
            kind: FrameKind::from(bytes[0]),
            len,
        })
    }

    /// Total bytes the frame occupies on disk.
    pub fn frame_len(&self) -> u64 {
        FRAME_HEADER_SIZE as u64 + u64::from(self.len)
    }
}
