use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::entry::JournalEntry;
use crate::errors::JournalError;
use crate::frame::{FrameHeader, FrameKind, JournalHeader, FRAME_HEADER_SIZE, HEADER_SIZE};

/// Options for [`JournalWriter::open`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// fsync after every append (default: false).
    pub sync: bool,
    /// Create the file if it is missing (default: true).
    pub create: bool,
    /// Keep existing entries; `false` discards them (default: true).
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
        }
    }
}

/// Appends entries to a journal file.
///
/// Every frame is written with a single `write_all`, so an interrupted
/// append leaves at most one partial frame at the tail.
pub struct JournalWriter {
    file: File,
    header: JournalHeader,
    sync: bool,
}

impl JournalWriter {
    /// Opens a journal for appending, writing a fresh header into an empty
    /// file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, is non-empty but shorter than a
    /// header, or holds something other than a journal.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let mut file = OpenOptions::new()
            .create(options.create)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let header = match len {
            0 => {
                let header = JournalHeader::new();
                file.write_all(&header.encode())?;
                header
            }
            len if len < HEADER_SIZE as u64 => return Err(JournalError::ShortHeader { len }),
            _ => {
                let mut bytes = [0u8; HEADER_SIZE];
                file.seek(SeekFrom::Start(0))?;
                file.read_exact(&mut bytes)?;
                JournalHeader::decode(&bytes)?
            }
        };

        if !options.append {
            file.set_len(HEADER_SIZE as u64)?;
        }
        file.seek(SeekFrom::End(0))?;

        let mut writer = Self {
            file,
            header,
            sync: options.sync,
        };
        writer.flush()?;
        Ok(writer)
    }

    /// Header of the open journal.
    pub fn header(&self) -> &JournalHeader {
        &self.header
    }

    /// Appends one entry as a JSON frame.
    pub fn append_entry(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        let payload = serde_json::to_vec(entry)?;
        self.append_raw(FrameKind::EntryJson, &payload)
    }

    /// Appends a frame of any kind.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = FrameHeader::new(kind, payload.len())?;
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&frame.encode());
        buf.extend_from_slice(payload);
        self.file.write_all(&buf)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Flushes and closes the journal.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.flush()
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
