//! Network Layer: reassembly dan dispatch per connection
//!
//! Socket, TLS dan event loop ada di luar crate ini. Transport cukup:
//! - menulis bytes ke [`MqttStream`] (atau read langsung ke `spare_mut`)
//! - memanggil `handle_messages` dengan jumlah bytes yang diterima
//! - menutup socket kalau `handle_messages` mengembalikan error
//!
//! Semua operasi non-blocking dan langsung return kalau bytes belum cukup.

mod connection;
mod server;
mod stream;

pub use connection::{Connection, ConnectionId};
pub use server::Server;
pub use stream::MqttStream;
