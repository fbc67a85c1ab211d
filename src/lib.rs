//! Hermes MQTT - frame reassembly and pub/sub dispatch core
//!
//! Arsitektur:
//! - Bounded: satu buffer berkapasitas tetap per connection
//! - Zero-Copy: frame di-decode langsung dari buffer
//! - Closed packet set: dispatcher match semua varian [`Packet`]
//! - Shared table: satu subscription table per broker, di bawah satu lock
//!
//! Pipeline per connection:
//!
//! ```text
//! socket bytes ──▶ MqttStream ──frame──▶ Server ──decode──▶ Packet
//!                  (reassembly)          (dispatch)
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod protocol;

pub use config::{MalformedPolicy, OverflowPolicy, ServerConfig, StreamConfig};
pub use error::{Result, StreamError};
pub use network::{Connection, ConnectionId, MqttStream, Server};
pub use protocol::{decode, DecodeError, Encoder, Packet, QoS};
