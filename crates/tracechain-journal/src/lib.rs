//! Append-only journal format for evidence records.
//!
//! This crate provides:
//! - Framed, append-only storage of journal entries as JSON
//! - Reader/writer APIs with strict and permissive truncation handling
//!
//! A journal holds two kinds of entries: an `evidence` entry when a batch is
//! first stored, and a `status` entry each time its proof status changes.
//! Replaying the entries in order yields the current state of every record.
//!
//! ## Quick Start
//!
//! ```rust
//! use tracechain_journal::{JournalEntry, JournalReader, JournalWriter, ReadMode, WriteOptions};
//! use tracechain_core::{BatchId, EvidenceStatus};
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("evidence.tcj");
//!
//! let mut writer = JournalWriter::open(&path, WriteOptions::default())?;
//! writer.append_entry(&JournalEntry::status(
//!     BatchId::generate(),
//!     EvidenceStatus::Failed { reason: "timeout".into() },
//! ))?;
//! writer.finish()?;
//!
//! let mut reader = JournalReader::open(&path, ReadMode::Strict)?;
//! while let Some(entry) = reader.read_entry()? {
//!     println!("{:?}", entry);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! - [`JournalWriter`] - Append entries to journal files
//! - [`JournalReader`] - Read entries back in order
//! - [`JournalEntry`] - Evidence and status entries

#![deny(missing_docs)]

/// Journal entry payloads.
pub mod entry;
/// Error types for journal operations.
pub mod errors;
/// Frame structure and serialization.
pub mod frame;
/// Journal reader implementation.
pub mod reader;
/// Journal writer implementation.
pub mod writer;

pub use entry::JournalEntry;
pub use errors::JournalError;
pub use frame::{FrameHeader, FrameKind, JournalHeader};
pub use reader::{JournalReader, ReadMode};
pub use writer::{JournalWriter, WriteOptions};
