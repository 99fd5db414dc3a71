//! Error types for vloop-seq
//!
//! Per-entry playback problems (bad URL, player not ready, player error) are
//! not errors here: the sequencer turns them into status messages and skips.
//! These variants cover rejected intents and plumbing failures.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for vloop-seq
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Intent not allowed in the current sequencer state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No entry with this identifier is listed
    #[error("Entry not found: {0}")]
    EntryNotFound(Uuid),

    /// No schedule window slot with this index
    #[error("Schedule window not found: {0}")]
    WindowNotFound(usize),

    /// Unknown field name in an edit intent
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Malformed time-of-day value
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Console command that could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Engine task is gone
    #[error("Engine channel closed")]
    ChannelClosed,

    /// Errors bubbled up from vloop-common
    #[error(transparent)]
    Common(#[from] vloop_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using vloop-seq Error
pub type Result<T> = std::result::Result<T, Error>;
