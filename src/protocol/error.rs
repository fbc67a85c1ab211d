//! Error types untuk protocol layer.
//!
//! - [`FramingError`]: the fixed header itself is unreadable, so the stream
//!   loses frame alignment and cannot continue.
//! - [`DecodeError`]: one complete frame has a known extent but its contents
//!   are inconsistent. Only that frame is dropped.

use thiserror::Error;

use super::message::PacketType;

/// Wire-level errors in the fixed header.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Continuation bit still set on the last permitted length byte
    /// ([`MAX_LENGTH_BYTES`](super::MAX_LENGTH_BYTES)).
    #[error("malformed remaining length: more than 4 length bytes")]
    MalformedRemainingLength,
}

/// Errors produced while decoding one complete frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Packet type nibble is reserved (0 or 15).
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),

    /// Packet type only ever flows from broker to client.
    #[error("unexpected {0:?} packet from client")]
    UnexpectedPacket(PacketType),

    /// Frame byte count disagrees with its fixed header.
    #[error("frame length mismatch: header declares {declared} bytes, frame has {actual}")]
    LengthMismatch {
        /// Total size implied by the fixed header.
        declared: usize,
        /// Bytes actually handed to the decoder.
        actual: usize,
    },

    /// A length-prefixed or fixed-width field runs past the end of the frame.
    #[error("{field} runs past end of frame: need {need} bytes, have {have}")]
    Truncated {
        /// Field being read.
        field: &'static str,
        /// Bytes the field requires.
        need: usize,
        /// Bytes left in the frame.
        have: usize,
    },

    /// QoS bits or requested QoS byte outside 0..=2.
    #[error("invalid QoS level: {0}")]
    InvalidQos(u8),

    /// Topic bytes are not UTF-8.
    #[error("topic is not valid UTF-8")]
    InvalidUtf8,

    /// SUBSCRIBE or UNSUBSCRIBE without a single topic.
    #[error("{0:?} packet carries no topics")]
    NoTopics(PacketType),

    /// A packet that must have remaining length zero carries a body.
    #[error("{packet:?} packet must be empty, got {len} bytes")]
    UnexpectedBody {
        /// Offending packet type.
        packet: PacketType,
        /// Body length received.
        len: usize,
    },

    /// Fixed header could not be parsed at all.
    #[error(transparent)]
    Framing(#[from] FramingError),
}
