//! Stream and server configuration

use crate::protocol::MIN_FRAME_SIZE;

/// Default per-connection buffer: 64KB
pub const DEFAULT_STREAM_CAPACITY: usize = 64 * 1024;

/// Smallest usable buffer: one empty frame (PINGREQ, DISCONNECT)
pub const MIN_STREAM_CAPACITY: usize = MIN_FRAME_SIZE;

/// What happens when a frame cannot fit in the connection buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Disconnect via the server (drop subscriptions, clear connected flag)
    /// and discard buffered bytes. The caller still closes the socket.
    #[default]
    Disconnect,
    /// Only report the error; buffer and connection are left untouched.
    Report,
}

/// What the server does with a frame that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Drop the frame and keep the connection.
    #[default]
    Drop,
    /// Drop the frame and disconnect the connection.
    Disconnect,
}

/// Per-connection stream configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_STREAM_CAPACITY,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl StreamConfig {
    /// Capacity di bawah [`MIN_STREAM_CAPACITY`] dinaikkan ke minimum itu.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(MIN_STREAM_CAPACITY);
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }
}

/// Broker-wide configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub malformed: MalformedPolicy,
    /// Send CONNACK / SUBACK / UNSUBACK / PINGRESP through `Connection::send`
    pub send_replies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            malformed: MalformedPolicy::default(),
            send_replies: true,
        }
    }
}

impl ServerConfig {
    pub fn with_malformed(mut self, malformed: MalformedPolicy) -> Self {
        self.malformed = malformed;
        self
    }

    pub fn with_replies(mut self, send_replies: bool) -> Self {
        self.send_replies = send_replies;
        self
    }
}
