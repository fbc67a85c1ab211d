//! Connection collaborator
//!
//! Connection dimiliki oleh transport layer (socket, TLS, write buffer).
//! Broker hanya melihat interface sempit ini dan menyimpan `Weak` handle,
//! jadi tidak ada reference cycle antara connection dan broker.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of one connection for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh, never reused id.
    #[inline]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One client connection as seen by the broker.
///
/// Methods take `&self`: connections are shared as `Arc<C>` between the
/// transport loop and the subscription table, so state lives behind atomics
/// or locks in the implementation.
pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;

    fn is_connected(&self) -> bool;

    fn set_connected(&self, connected: bool);

    /// Append one published payload (topic and headers stripped).
    fn deliver(&self, payload: &[u8]);

    /// Queue a broker reply frame (CONNACK, SUBACK, ...) for the socket.
    ///
    /// Default membuang frame; transport yang menulis ke socket override ini.
    fn send(&self, _frame: &[u8]) {}
}
