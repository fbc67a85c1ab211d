//! Frame reassembly per connection
//!
//! TCP tidak punya message boundary: satu read bisa berisi setengah header,
//! beberapa frame sekaligus, atau body yang terpotong. `MqttStream` menyimpan
//! bytes di [`StreamBuffer`] dan hanya mengirim frame ke [`Server`] kalau
//! seluruh `header + remaining length` sudah ada.
//!
//! Typical transport loop:
//!
//! ```ignore
//! let n = socket.read(stream.spare_mut())?;
//! if let Err(e) = stream.handle_messages(n, &server, &connection) {
//!     // close the socket
//! }
//! ```

use std::sync::Arc;

use tracing::{trace, warn};

use super::connection::Connection;
use super::server::Server;
use crate::config::{OverflowPolicy, StreamConfig, MIN_STREAM_CAPACITY};
use crate::core::StreamBuffer;
use crate::error::{Result, StreamError};
use crate::protocol::FixedHeader;

/// Reassembler for one connection. Never shared between connections.
pub struct MqttStream {
    buffer: StreamBuffer,
    overflow: OverflowPolicy,
}

impl MqttStream {
    /// Membuat stream dengan kapasitas buffer tertentu
    pub fn new(capacity: usize) -> Self {
        Self::with_config(StreamConfig::default().with_capacity(capacity))
    }

    /// Capacity di bawah [`MIN_STREAM_CAPACITY`] dinaikkan ke minimum itu.
    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            buffer: StreamBuffer::new(config.capacity.max(MIN_STREAM_CAPACITY)),
            overflow: config.overflow,
        }
    }

    /// Copy bytes yang baru datang ke buffer. Returns jumlah yang diterima.
    ///
    /// Bytes belum terlihat oleh parser sampai di-commit lewat
    /// [`handle_messages`](Self::handle_messages). Kalau return value lebih
    /// kecil dari `bytes.len()`, sisanya tidak disimpan: buffer penuh oleh
    /// frame yang belum lengkap.
    #[inline]
    pub fn ingest(&mut self, bytes: &[u8]) -> usize {
        let accepted = self.buffer.write(bytes);
        if accepted < bytes.len() {
            warn!(
                accepted,
                offered = bytes.len(),
                buffered = self.buffer.len(),
                "stream buffer full"
            );
        }
        accepted
    }

    /// Writable region for reading straight from a socket.
    #[inline]
    pub fn spare_mut(&mut self) -> &mut [u8] {
        self.buffer.spare_mut()
    }

    /// Commit `count` bytes, lalu dispatch semua frame yang sudah lengkap.
    ///
    /// Frame terakhir yang belum lengkap tetap di buffer untuk call
    /// berikutnya. Decode error satu frame tidak menghentikan loop.
    pub fn handle_messages<C: Connection>(
        &mut self,
        count: usize,
        server: &Server<C>,
        connection: &Arc<C>,
    ) -> Result<()> {
        let available = self.buffer.committable();
        if count > available {
            return Err(StreamError::CommitOverrun { count, available });
        }
        self.buffer.commit(count);

        loop {
            let frame_len = match self.next_frame_len() {
                Ok(Some(len)) => len,
                Ok(None) => return Ok(()),
                Err(e) => return Err(self.fail(e, server, connection.as_ref())),
            };

            let Some(frame) = self.buffer.peek(frame_len) else {
                trace!(
                    connection = %connection.id(),
                    frame_len,
                    buffered = self.buffer.len(),
                    "waiting for rest of frame"
                );
                return Ok(());
            };

            // Decode error sudah di-log dan di-handle oleh server
            let _ = server.handle_message(connection, frame);
            self.buffer.consume(frame_len);
        }
    }

    /// [`ingest`](Self::ingest) + [`handle_messages`](Self::handle_messages)
    /// sampai seluruh `bytes` masuk.
    ///
    /// Chunk yang lebih besar dari sisa buffer diproses bertahap: setiap
    /// frame lengkap di-dispatch dulu untuk membuat ruang. Returns
    /// [`StreamError::BufferFull`] hanya kalau buffer penuh oleh satu frame
    /// yang belum lengkap dan tidak ada byte lagi yang bisa diterima.
    pub fn feed<C: Connection>(
        &mut self,
        bytes: &[u8],
        server: &Server<C>,
        connection: &Arc<C>,
    ) -> Result<usize> {
        let mut offset = 0;
        while offset < bytes.len() {
            let accepted = self.buffer.write(&bytes[offset..]);
            self.handle_messages(accepted, server, connection)?;

            if accepted == 0 {
                warn!(
                    accepted = offset,
                    offered = bytes.len(),
                    buffered = self.buffer.len(),
                    "stream buffer full"
                );
                return Err(StreamError::BufferFull {
                    accepted: offset,
                    offered: bytes.len(),
                });
            }
            offset += accepted;
        }
        Ok(offset)
    }

    /// Committed bytes menunggu diproses (frame belum lengkap)
    #[inline(always)]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Total size of the frame at the read position, once its fixed header
    /// is complete. Only the unread region is inspected.
    #[inline]
    fn next_frame_len(&self) -> Result<Option<usize>> {
        let Some(header) = FixedHeader::parse(self.buffer.readable())? else {
            return Ok(None);
        };

        let frame_len = header.frame_len();
        if frame_len > self.buffer.capacity() {
            return Err(StreamError::CapacityExceeded {
                frame_len,
                capacity: self.buffer.capacity(),
            });
        }
        Ok(Some(frame_len))
    }

    fn fail<C: Connection>(
        &mut self,
        error: StreamError,
        server: &Server<C>,
        connection: &C,
    ) -> StreamError {
        warn!(connection = %connection.id(), error = %error, "stream error");

        let fatal = match error {
            StreamError::Framing(_) => true,
            _ => self.overflow == OverflowPolicy::Disconnect,
        };
        if fatal {
            self.buffer.clear();
            server.disconnect(connection);
        }
        error
    }
}
