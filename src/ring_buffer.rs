//! Fixed capacity FIFO byte buffer backing the receive loop.

/// Circular byte buffer. Pushing into a full buffer is rejected, nothing is
/// overwritten.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buffer: Box<[u8]>,
    start: usize,
    len: usize,
}

impl RingBuffer {
    /// Create an empty buffer holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            len: 0,
        }
    }

    /// Maximum number of bytes held
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bytes are held
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if the next push would be rejected
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append a byte. Returns false if the buffer is full and the byte was dropped.
    pub fn push_back(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }

        let end = (self.start + self.len) % self.capacity();
        self.buffer[end] = byte;
        self.len += 1;
        true
    }

    /// Remove and return the oldest byte
    pub fn pop_front(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }

        let byte = self.buffer[self.start];
        self.buffer[self.start] = 0;
        self.start = (self.start + 1) % self.capacity();
        self.len -= 1;
        Some(byte)
    }

    /// Discard up to `count` bytes from the front, returning how many were removed
    pub fn drain_front(&mut self, count: usize) -> usize {
        let count = count.min(self.len);
        for _ in 0..count {
            self.pop_front();
        }
        count
    }

    /// Copy of the contents in FIFO order
    pub fn snapshot_to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter());
        out
    }

    /// Iterate over the contents in FIFO order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let capacity = self.capacity();
        (0..self.len).map(move |i| self.buffer[(self.start + i) % capacity])
    }

    pub fn clear(&mut self) {
        self.drain_front(self.len);
        self.start = 0;
    }
}
