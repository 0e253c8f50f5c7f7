//! Per-entry payload channel.

use log::trace;

use super::event::{ArchiveEvent, EventQueue};

/// Push channel for one entry's compressed bytes.
///
/// Opened when a local header has been decoded, it receives fragments until
/// `compressed_size` bytes have passed through and is then closed. There is
/// no backpressure: fragments are published as fast as input arrives.
#[derive(Debug)]
pub struct EntryPayloadSink {
    total: u64,
    delivered: u64,
    closed: bool,
}

impl EntryPayloadSink {
    pub fn open(total: u64) -> Self {
        Self {
            total,
            delivered: 0,
            closed: false,
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Bytes still owed before the entry is complete.
    pub fn remaining(&self) -> u64 {
        self.total - self.delivered
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn deliver(&mut self, fragment: Vec<u8>, events: &mut EventQueue) {
        debug_assert!(!self.closed, "payload delivered to a closed sink");
        debug_assert!(fragment.len() as u64 <= self.remaining());

        self.delivered += fragment.len() as u64;
        trace!(
            "payload fragment of {} bytes ({}/{})",
            fragment.len(),
            self.delivered,
            self.total
        );
        events.publish(ArchiveEvent::Payload(fragment));
    }

    /// Publish the end of the payload. Closing twice is a no-op.
    pub(crate) fn close(&mut self, events: &mut EventQueue) {
        if self.closed {
            return;
        }
        self.closed = true;
        events.publish(ArchiveEvent::PayloadEnd);
    }
}
