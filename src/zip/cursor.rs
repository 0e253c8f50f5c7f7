//! Incremental reader over a queue of byte chunks.
//!
//! The cursor never blocks and never half-consumes a read: a request for
//! `n` bytes either yields exactly `n` bytes and advances, or leaves the
//! cursor untouched so the same request can be retried once more input has
//! been pushed.

use std::borrow::Cow;
use std::collections::VecDeque;

use super::error::DecodeError;

/// A growing sequence of byte chunks with a single logical read position.
#[derive(Debug, Default)]
pub struct ByteCursor {
    /// Unconsumed chunks, oldest first
    chunks: VecDeque<Vec<u8>>,
    /// Read index into the front chunk
    head: usize,
    /// Total unconsumed bytes across all chunks
    buffered: usize,
    /// Absolute stream offset of the next byte to be read
    position: u64,
    /// Whether the producer has signalled end of input
    finished: bool,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the end of the buffered input.
    ///
    /// Empty chunks are ignored.
    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.buffered += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Mark the input as complete. Reads that cannot be satisfied from the
    /// remaining bytes fail with [`DecodeError::TruncatedInput`] from now on.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stream offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    /// Number of chunks still held in the queue.
    pub fn queued_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Drop every buffered byte without advancing the position.
    pub fn discard(&mut self) {
        self.chunks.clear();
        self.head = 0;
        self.buffered = 0;
    }

    /// Read exactly `n` bytes starting at the current position.
    ///
    /// Returns `Ok(None)` if fewer than `n` bytes are buffered and more input
    /// may still arrive. A region that lies inside the front chunk is
    /// borrowed; one that spans chunks is copied into a single buffer.
    pub fn try_read(&mut self, n: usize) -> Result<Option<Cow<'_, [u8]>>, DecodeError> {
        if n > self.buffered {
            if self.finished {
                return Err(DecodeError::TruncatedInput {
                    offset: self.position,
                    needed: n as u64,
                    available: self.buffered as u64,
                });
            }
            return Ok(None);
        }
        if n == 0 {
            return Ok(Some(Cow::Borrowed(&[])));
        }

        let head = self.head;
        let front_available = match self.chunks.front() {
            Some(chunk) => chunk.len() - head,
            None => return Ok(None),
        };

        self.buffered -= n;
        self.position += n as u64;

        if n < front_available {
            self.head += n;
            return Ok(self
                .chunks
                .front()
                .map(|chunk| Cow::Borrowed(&chunk[head..head + n])));
        }

        if n == front_available {
            return Ok(self.take_front().map(Cow::Owned));
        }

        // The total was checked above, so this loop always fills the region.
        let mut region = Vec::with_capacity(n);
        while region.len() < n {
            let Some(chunk) = self.chunks.front() else {
                break;
            };
            let wanted = n - region.len();
            let available = chunk.len() - self.head;
            if wanted < available {
                region.extend_from_slice(&chunk[self.head..self.head + wanted]);
                self.head += wanted;
            } else {
                region.extend_from_slice(&chunk[self.head..]);
                self.chunks.pop_front();
                self.head = 0;
            }
        }

        Ok(Some(Cow::Owned(region)))
    }

    /// Read a fixed-width region into an array.
    pub fn try_read_array<const N: usize>(&mut self) -> Result<Option<[u8; N]>, DecodeError> {
        Ok(self.try_read(N)?.map(|region| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(&region);
            bytes
        }))
    }

    /// Take up to `max` bytes from the front chunk without crossing into the
    /// next one.
    ///
    /// Returns `None` when nothing is buffered. Never fails: callers decide
    /// what an empty, finished cursor means for them.
    pub fn take_contiguous(&mut self, max: usize) -> Option<Vec<u8>> {
        if max == 0 {
            return None;
        }
        let available = self.chunks.front()?.len() - self.head;
        let n = available.min(max);

        self.buffered -= n;
        self.position += n as u64;

        if n == available {
            return self.take_front();
        }

        let start = self.head;
        self.head += n;
        self.chunks
            .front()
            .map(|chunk| chunk[start..start + n].to_vec())
    }

    /// Remove the front chunk, trimming the part that was already read.
    fn take_front(&mut self) -> Option<Vec<u8>> {
        let mut chunk = self.chunks.pop_front()?;
        if self.head > 0 {
            chunk.drain(..self.head);
            self.head = 0;
        }
        Some(chunk)
    }
}
