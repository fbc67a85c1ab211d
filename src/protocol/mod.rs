//! Protocol Layer: MQTT framed binary protocol
//!
//! Prinsip desain:
//! - Zero-Copy: topic dan payload dipinjam langsung dari frame
//! - Closed set: setiap control packet adalah varian [`Packet`], dispatcher
//!   wajib menangani semuanya
//! - Stateless: decoder tidak menyimpan apa-apa di antara frame

mod decoder;
mod encoder;
mod error;
mod message;
pub mod reply;

pub use decoder::{decode, Packet, Publish, Subscribe, TopicRequest, Unsubscribe};
pub use encoder::Encoder;
pub use error::{DecodeError, FramingError};
pub use message::{
    decode_remaining_length, encode_remaining_length, FixedHeader, PacketType, QoS,
    MAX_LENGTH_BYTES, MAX_REMAINING_LENGTH, MIN_FRAME_SIZE,
};
