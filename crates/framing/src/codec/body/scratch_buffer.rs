//! Fixed-capacity staging area for chunked body blocks.
//!
//! Bytes are written into a region of the buffer ([`ScratchBuffer::prepare`]),
//! committed ([`ScratchBuffer::consume`]) and finally handed out
//! ([`ScratchBuffer::detach`]). Detaching splits the committed bytes off the
//! shared allocation as an owned [`Bytes`] and keeps writing into the rest of
//! it, so one allocation serves many small blocks and no block is ever
//! overwritten after it has been handed out.

use bytes::{Bytes, BytesMut};
use tracing::trace;

#[derive(Debug)]
pub struct ScratchBuffer {
    /// Capacity of every freshly allocated region
    capacity: usize,
    /// Current region; `[0, written)` is committed, the rest is writable
    buf: BytesMut,
    written: usize,
}

/// Outcome of [`ScratchBuffer::prepare`].
#[derive(Debug)]
pub struct Prepared<'a> {
    /// Writable region of the requested size, absent when the request exceeds the capacity
    pub slice: Option<&'a mut [u8]>,
    /// Committed bytes split off because the current region ran out of room
    pub detached: Option<Bytes>,
}

impl ScratchBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, buf: BytesMut::zeroed(capacity), written: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes committed but not yet detached.
    pub fn committed(&self) -> usize {
        self.written
    }

    /// Bytes still writable in the current region.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    /// Returns a writable region of exactly `size` bytes.
    ///
    /// When the current region is too small, the committed bytes are detached
    /// and a new region of full capacity is allocated first. If `size` exceeds
    /// the capacity no slice is returned, but the detached bytes still are.
    pub fn prepare(&mut self, size: usize) -> Prepared<'_> {
        if self.remaining() >= size {
            let start = self.written;
            return Prepared { slice: Some(&mut self.buf[start..start + size]), detached: None };
        }

        let detached = (self.written > 0).then(|| self.buf.split_to(self.written).freeze());
        trace!(detached = detached.as_ref().map_or(0, Bytes::len), size, "scratch buffer exhausted, allocating");
        self.buf = BytesMut::zeroed(self.capacity);
        self.written = 0;

        if size > self.capacity {
            return Prepared { slice: None, detached };
        }

        Prepared { slice: Some(&mut self.buf[..size]), detached }
    }

    /// Commits `size` bytes written into the region returned by the last [`prepare`](Self::prepare).
    ///
    /// # Panics
    ///
    /// Panics if `size` runs past the end of the current region.
    pub fn consume(&mut self, size: usize) {
        assert!(size <= self.remaining(), "consumed {size} bytes, only {} prepared", self.remaining());
        self.written += size;
    }

    /// Hands out the committed bytes; the uncommitted tail becomes the new region.
    pub fn detach(&mut self) -> Bytes {
        let detached = self.buf.split_to(self.written).freeze();
        self.written = 0;
        detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(scratch: &mut ScratchBuffer, data: &[u8]) -> Option<Bytes> {
        let prepared = scratch.prepare(data.len());
        prepared.slice.unwrap().copy_from_slice(data);
        let detached = prepared.detached;
        scratch.consume(data.len());
        detached
    }

    #[test]
    fn prepare_within_capacity_reuses_region() {
        let mut scratch = ScratchBuffer::new(16);

        assert!(write(&mut scratch, b"abcd").is_none());
        assert!(write(&mut scratch, b"efgh").is_none());
        assert_eq!(scratch.committed(), 8);
        assert_eq!(scratch.remaining(), 8);
    }

    #[test]
    fn overflow_detaches_committed_bytes_once() {
        let mut scratch = ScratchBuffer::new(8);

        assert!(write(&mut scratch, b"12345").is_none());
        let detached = write(&mut scratch, b"6789");
        assert_eq!(detached, Some(Bytes::from_static(b"12345")));

        // the new region starts at offset 0 with only the latest bytes committed
        assert_eq!(scratch.committed(), 4);
        assert_eq!(scratch.remaining(), 4);
        assert_eq!(scratch.detach(), Bytes::from_static(b"6789"));
    }

    #[test]
    fn detach_rebases_tail() {
        let mut scratch = ScratchBuffer::new(8);

        write(&mut scratch, b"abc");
        let first = scratch.detach();
        assert_eq!(first, Bytes::from_static(b"abc"));
        assert_eq!(scratch.committed(), 0);
        assert_eq!(scratch.remaining(), 5);

        write(&mut scratch, b"de");
        assert_eq!(scratch.detach(), Bytes::from_static(b"de"));
        // handed out blocks are never touched again
        assert_eq!(first, Bytes::from_static(b"abc"));
    }

    #[test]
    fn oversized_request_returns_no_slice() {
        let mut scratch = ScratchBuffer::new(4);
        write(&mut scratch, b"ab");

        let prepared = scratch.prepare(5);
        assert!(prepared.slice.is_none());
        assert_eq!(prepared.detached, Some(Bytes::from_static(b"ab")));
        assert_eq!(scratch.committed(), 0);
        assert_eq!(scratch.remaining(), 4);
    }

    #[test]
    fn empty_detach() {
        let mut scratch = ScratchBuffer::new(4);
        assert!(scratch.detach().is_empty());
        assert_eq!(scratch.remaining(), 4);
    }
}
