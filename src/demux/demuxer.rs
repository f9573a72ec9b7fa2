//! # FrameDemuxer: trailing-marker frame reassembly.
//!
//! One demuxer serves one channel and owns that channel's accumulation buffer.
//!
//! ## Algorithm
//! ```text
//! feed(chunk)
//!   ├─ chunk ends with marker?
//!   │     ├─ buffer empty  → emit chunk as-is
//!   │     └─ buffer filled → emit buffer ++ chunk, clear buffer
//!   └─ otherwise            → buffer ++= chunk, emit nothing
//! ```
//!
//! ## Known limitation
//! Only the **last two bytes of each chunk** are inspected. A marker pair inside a
//! chunk is never mistaken for a boundary, but a chunk that happens to end with the
//! marker pair in the middle of an image is treated as a boundary and the image is
//! cut short. The image format is never parsed to rule that out.

use bytes::{Bytes, BytesMut};

use super::codec::Marker;

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Reassembles frames from an arbitrarily chunked byte stream.
#[derive(Debug)]
pub struct FrameDemuxer {
    marker: Marker,
    buf: BytesMut,
}

impl FrameDemuxer {
    /// Creates a demuxer with an empty buffer.
    pub fn new(marker: Marker) -> Self {
        Self {
            marker,
            buf: BytesMut::new(),
        }
    }

    /// Marker this demuxer splits on.
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Feeds the next chunk, in arrival order.
    ///
    /// Returns a complete frame when `chunk` closes one.
    ///
    /// # Example
    /// ```
    /// use bytes::Bytes;
    /// use pipevisor::FrameDemuxer;
    ///
    /// let mut demux = FrameDemuxer::new([0xFF, 0xD9]);
    /// assert!(demux.feed(Bytes::from_static(b"AB")).is_none());
    /// let frame = demux.feed(Bytes::from_static(b"CD\xFF\xD9")).unwrap();
    /// assert_eq!(&frame[..], b"ABCD\xFF\xD9");
    /// ```
    pub fn feed(&mut self, chunk: Bytes) -> Option<Bytes> {
        if !chunk.ends_with(&self.marker) {
            if self.buf.is_empty() {
                self.buf.reserve(INITIAL_BUFFER_CAPACITY.max(chunk.len()));
            }
            self.buf.extend_from_slice(&chunk);
            return None;
        }
        if self.buf.is_empty() {
            return Some(chunk);
        }
        self.buf.extend_from_slice(&chunk);
        // split() leaves `buf` empty and keeps its spare capacity for the next frame.
        Some(self.buf.split().freeze())
    }

    /// Number of bytes waiting for a marker.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drops any unterminated bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
