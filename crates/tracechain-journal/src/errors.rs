use thiserror::Error;

/// Errors raised while reading or writing a journal.
#[derive(Error, Debug)]
pub enum JournalError {
    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file does not start with a valid journal header.
    #[error("invalid journal header: {0}")]
    InvalidHeader(String),
    /// The file is not empty yet too short to hold a header, so it cannot be
    /// initialized without losing data.
    #[error("file has {len} bytes, too few for a journal header")]
    ShortHeader {
        /// File length.
        len: u64,
    },
    /// A frame header is malformed.
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// Offset of the frame header.
        offset: u64,
        /// What is wrong with it.
        reason: String,
    },
    /// A payload is too large to frame.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Payload size.
        size: u64,
        /// Frame size limit.
        max: u32,
    },
    /// An entry payload is not UTF-8.
    #[error("entry payload is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// An entry payload is not a journal entry.
    #[error("malformed journal entry: {0}")]
    JsonParse(#[from] serde_json::Error),
    /// The journal ends inside a frame (strict mode only).
    #[error("truncated frame at offset {offset}")]
    TruncatedFrame {
        /// Offset of the partial frame.
        offset: u64,
    },
}
