use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::entry::JournalEntry;
use crate::errors::JournalError;
use crate::frame::{FrameHeader, FrameKind, JournalHeader, FRAME_HEADER_SIZE, HEADER_SIZE};

/// How to treat a journal that ends in the middle of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// A partial frame is an error.
    Strict,
    /// A partial frame ends the journal.
    Permissive,
}

/// Reads journal entries in append order.
///
/// A crash during an append can leave a partial frame at the end of the
/// file. [`ReadMode::Permissive`] stops cleanly before it, and
/// [`JournalReader::position`] then tells where the valid data ends.
pub struct JournalReader {
    input: BufReader<File>,
    header: JournalHeader,
    mode: ReadMode,
    position: u64,
}

/// Outcome of filling a buffer from the current position.
enum Fill {
    Complete,
    Eof,
    Partial,
}

impl JournalReader {
    /// Opens a journal and checks its header.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, is shorter than a header, or is
    /// not a journal.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let mut input = BufReader::new(File::open(path)?);

        let mut bytes = [0u8; HEADER_SIZE];
        match fill(&mut input, &mut bytes)? {
            Fill::Complete => {}
            Fill::Eof | Fill::Partial => {
                return Err(JournalError::InvalidHeader(
                    "file is shorter than a journal header".to_string(),
                ))
            }
        }
        let header = JournalHeader::decode(&bytes)?;

        Ok(Self {
            input,
            header,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Header of the open journal.
    pub fn header(&self) -> &JournalHeader {
        &self.header
    }

    /// Byte offset just past the last complete frame read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` at end of file, and on a partial frame in
    /// permissive mode.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        let frame_offset = self.position;

        let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
        match fill(&mut self.input, &mut header_bytes)? {
            Fill::Complete => {}
            Fill::Eof => return Ok(None),
            Fill::Partial => return self.truncated(frame_offset),
        }
        let frame = FrameHeader::decode(&header_bytes, frame_offset)?;

        let mut payload = vec![0u8; frame.len as usize];
        match fill(&mut self.input, &mut payload)? {
            Fill::Complete => {}
            Fill::Eof | Fill::Partial => return self.truncated(frame_offset),
        }

        self.position = frame_offset + frame.frame_len();
        Ok(Some((frame.kind, payload)))
    }

    fn truncated<T>(&self, offset: u64) -> Result<Option<T>, JournalError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(JournalError::TruncatedFrame { offset }),
        }
    }

    /// Reads the next entry, skipping frames of unknown kind.
    ///
    /// # Errors
    ///
    /// Fails on malformed frames, payloads that are not journal entries, and
    /// (in strict mode) a partial frame.
    pub fn read_entry(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        while let Some((kind, payload)) = self.read_frame()? {
            if kind == FrameKind::EntryJson {
                let text = std::str::from_utf8(&payload)?;
                return Ok(Some(serde_json::from_str(text)?));
            }
        }
        Ok(None)
    }

    /// Reads all remaining entries.
    pub fn read_all(&mut self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Reads exactly `buf.len()` bytes, distinguishing a clean end of file from
/// a short read.
fn fill(input: &mut impl Read, buf: &mut [u8]) -> io::Result<Fill> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(match filled {
        n if n == buf.len() => Fill::Complete,
        0 => Fill::Eof,
        _ => Fill::Partial,
    })
}
