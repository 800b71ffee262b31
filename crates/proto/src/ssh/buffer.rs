//! Fixed-capacity receive buffer with a front-consume contract.
//!
//! Each connection accumulates peer bytes here until the codec can carve a
//! complete frame off the front. The contract the codec relies on:
//!
//! - consumed bytes are removed from the front,
//! - unconsumed bytes retain their relative order,
//! - capacity is never exceeded.
//!
//! The buffer is allocated once per connection and never grows; a peer that
//! fills it without completing a frame has violated the protocol.

/// Fixed-capacity byte buffer for one connection's inbound stream.
#[derive(Debug)]
pub struct RecvBuffer {
    buf: Box<[u8]>,
    len: usize,
}

impl RecvBuffer {
    /// Creates a buffer with the given fixed capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether the buffer has no room left.
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// Returns the buffered bytes.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns the writable tail, for the transport to receive into.
    ///
    /// Call [`advance`](Self::advance) with the number of bytes actually
    /// received.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Records `n` bytes received into the writable tail.
    pub fn advance(&mut self, n: usize) {
        assert!(self.len + n <= self.buf.len(), "receive past capacity");
        self.len += n;
    }

    /// Removes `n` bytes from the front, shifting the remainder down.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.len, "consume past fill level");
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }
}
