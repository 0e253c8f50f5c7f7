//! Events published by the decoder, in stream order.

use std::collections::VecDeque;
use std::collections::vec_deque::Drain;

use super::error::DecodeError;
use super::structures::{CentralDirectoryRecord, EndOfCentralDirectoryRecord, LocalFileHeader};

/// Something the decoder recognized in the input.
///
/// A `FileEntry` opens the entry's payload: it is followed by zero or more
/// `Payload` fragments and then exactly one `PayloadEnd`, unless the entry
/// is rejected with an error first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEvent {
    FileEntry(LocalFileHeader),
    /// A run of still-compressed bytes belonging to the open entry
    Payload(Vec<u8>),
    PayloadEnd,
    CentralDirectoryEntry(CentralDirectoryRecord),
    EndOfArchive(EndOfCentralDirectoryRecord),
    Error(DecodeError),
    /// Always the last event; published exactly once
    Finished,
}

/// Pull side of an event publisher.
pub trait EventSource {
    fn next_event(&mut self) -> Option<ArchiveEvent>;
}

/// FIFO of published events waiting for the caller.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    events: VecDeque<ArchiveEvent>,
}

impl EventQueue {
    pub fn publish(&mut self, event: ArchiveEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<ArchiveEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> Drain<'_, ArchiveEvent> {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
