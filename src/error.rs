//! Error types for stream processing.

use thiserror::Error;

use crate::protocol::FramingError;

/// Fatal conditions of one connection's stream.
///
/// Incomplete frames are never an error: the stream simply waits for more
/// bytes. Frames that fail to decode are dropped by the server and do not
/// surface here either.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// Fixed header unreadable, frame alignment is lost.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// A frame larger than the buffer can ever hold.
    #[error("frame of {frame_len} bytes exceeds stream capacity of {capacity} bytes")]
    CapacityExceeded {
        /// Total size declared by the frame's fixed header.
        frame_len: usize,
        /// Fixed buffer capacity.
        capacity: usize,
    },

    /// Offered bytes did not fit in the buffer.
    #[error("stream buffer full: accepted {accepted} of {offered} bytes")]
    BufferFull {
        /// Bytes copied into the buffer.
        accepted: usize,
        /// Bytes the caller tried to ingest.
        offered: usize,
    },

    /// Caller committed more bytes than were ever written.
    #[error("commit of {count} bytes exceeds writable region of {available} bytes")]
    CommitOverrun {
        /// Count passed to `handle_messages`.
        count: usize,
        /// Bytes committable at that moment.
        available: usize,
    },
}

/// Result type alias using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
