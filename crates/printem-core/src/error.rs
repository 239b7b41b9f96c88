// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-02-09

//! Error type for the protocol engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The frame accumulator received a byte past its capacity without a
    /// delimiter resetting it. Surfaced rather than panicking; the caller
    /// (the state machine) resyncs to `SsUnknown` on this error.
    #[error("accumulator overflow: {len} bytes already buffered, capacity {capacity}")]
    BufferOverflow { len: usize, capacity: usize },

    /// The wire sink wrote fewer bytes than requested.
    #[error("short write to wire: expected {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },

    /// A payload file could not be opened or written.
    #[error("payload write error for {path}: {source}")]
    PayloadWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The IPC transport was torn down or lost underneath the caller.
    #[error("ipc transport lost: {0}")]
    TransportLost(String),

    /// A non-blocking IPC receive found nothing queued.
    #[error("ipc receive would block")]
    WouldBlock,

    /// A replay capture file could not be parsed.
    #[error("malformed capture at line {line}: {reason}")]
    MalformedCapture { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
