//! Bounded per-connection byte buffer
//!
//! Satu alokasi saat connection diterima, setelah itu tidak ada alokasi lagi.
//!
//! ```text
//!  0        read_pos     write_pos    staged_end        capacity
//!  │ consumed │   unread   │   staged   │     spare     │
//! ```
//!
//! - `unread`: bytes committed but not yet consumed by frame extraction
//! - `staged`: bytes written by [`StreamBuffer::write`] or a direct read into
//!   [`StreamBuffer::spare_mut`], waiting for [`StreamBuffer::commit`]
//!
//! Invariant: `read_pos <= write_pos <= staged_end <= capacity`.

/// Fixed-capacity byte buffer with persistent read/write cursors.
pub struct StreamBuffer {
    buffer: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
    staged_end: usize,
}

impl StreamBuffer {
    /// Membuat buffer dengan kapasitas tetap
    ///
    /// # Panics
    /// Panic jika `capacity == 0`
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be non-zero");

        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
            staged_end: 0,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Jumlah bytes committed yang belum dikonsumsi
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.write_pos - self.read_pos
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.read_pos == self.write_pos
    }

    /// Bytes that can still be staged once consumed space is reclaimed.
    #[inline(always)]
    pub fn spare_capacity(&self) -> usize {
        self.capacity() - (self.staged_end - self.read_pos)
    }

    /// Most bytes [`commit`](Self::commit) accepts right now.
    #[inline(always)]
    pub fn committable(&self) -> usize {
        self.capacity() - self.write_pos
    }

    /// Writable region after everything already staged.
    ///
    /// Compacts first, so the slice is as large as the capacity allows.
    #[inline]
    pub fn spare_mut(&mut self) -> &mut [u8] {
        self.compact();
        &mut self.buffer[self.staged_end..]
    }

    /// Copy bytes ke area staged. Returns jumlah bytes yang diterima.
    ///
    /// Bytes yang tidak muat tidak disalin sama sekali; caller harus melihat
    /// return value ini.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        if self.staged_end + bytes.len() > self.capacity() {
            self.compact();
        }

        let accepted = bytes.len().min(self.capacity() - self.staged_end);
        self.buffer[self.staged_end..self.staged_end + accepted]
            .copy_from_slice(&bytes[..accepted]);
        self.staged_end += accepted;
        accepted
    }

    /// Make the next `n` written bytes readable.
    ///
    /// Clamped to [`committable`](Self::committable).
    #[inline]
    pub fn commit(&mut self, n: usize) -> usize {
        let n = n.min(self.committable());
        self.write_pos += n;
        self.staged_end = self.staged_end.max(self.write_pos);
        n
    }

    /// Get readable data slice (zero-copy)
    #[inline(always)]
    pub fn readable(&self) -> &[u8] {
        &self.buffer[self.read_pos..self.write_pos]
    }

    /// Lihat `n` bytes berikutnya tanpa mengkonsumsi
    #[inline(always)]
    pub fn peek(&self, n: usize) -> Option<&[u8]> {
        self.readable().get(..n)
    }

    /// Consume n bytes dari read buffer
    #[inline]
    pub fn consume(&mut self, n: usize) {
        self.read_pos += n.min(self.len());

        // Buffer kosong: reset cursor tanpa copy
        if self.read_pos == self.staged_end {
            self.read_pos = 0;
            self.write_pos = 0;
            self.staged_end = 0;
        }
    }

    /// Buang semua isi buffer, termasuk bytes staged
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.staged_end = 0;
    }

    /// Geser unread + staged bytes ke awal buffer
    #[inline]
    fn compact(&mut self) {
        if self.read_pos == 0 {
            return;
        }

        self.buffer.copy_within(self.read_pos..self.staged_end, 0);
        self.write_pos -= self.read_pos;
        self.staged_end -= self.read_pos;
        self.read_pos = 0;
    }
}
