//! Helpers for building archives byte by byte.

#![allow(dead_code)]

use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use zipstream::{ArchiveEvent, ZipStreamDecoder};

pub const STORED: u16 = 0;
pub const DEFLATE: u16 = 8;

/// 2024-02-29 12:34:56
pub const MOD_DATE: u16 = ((2024 - 1980) << 9) | (2 << 5) | 29;
pub const MOD_TIME: u16 = (12 << 11) | (34 << 5) | (56 / 2);

pub struct Entry {
    pub name: String,
    pub method: u16,
    pub flags: u16,
    pub crc32: u32,
    pub compressed: Vec<u8>,
    pub uncompressed_size: u32,
    pub extra: Vec<u8>,
    pub comment: String,
}

impl Entry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        let mut crc = Crc::new();
        crc.update(data);
        Self {
            name: name.to_string(),
            method: STORED,
            flags: 0,
            crc32: crc.sum(),
            compressed: data.to_vec(),
            uncompressed_size: data.len() as u32,
            extra: Vec::new(),
            comment: String::new(),
        }
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        let mut entry = Self::stored(name, data);
        entry.method = DEFLATE;
        entry.compressed = encoder.finish().unwrap();
        entry
    }

    pub fn with_extra(mut self, extra: Vec<u8>) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }
}

/// Writes local records as entries are added, then the central directory
/// and end record on `finish`.
#[derive(Default)]
pub struct ArchiveBuilder {
    out: Vec<u8>,
    central: Vec<(Entry, u32)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, entry: Entry) -> Self {
        let offset = self.out.len() as u32;
        let out = &mut self.out;
        out.extend_from_slice(&0x04034b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&entry.flags.to_le_bytes());
        out.extend_from_slice(&entry.method.to_le_bytes());
        out.extend_from_slice(&MOD_TIME.to_le_bytes());
        out.extend_from_slice(&MOD_DATE.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&(entry.compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(entry.extra.len() as u16).to_le_bytes());
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.extra);
        out.extend_from_slice(&entry.compressed);
        self.central.push((entry, offset));
        self
    }

    /// Local records only, as a truncated download would see them.
    pub fn local_only(self) -> Vec<u8> {
        self.out
    }

    pub fn finish(self, comment: &str) -> Vec<u8> {
        let mut out = self.out;
        let cd_offset = out.len() as u32;

        for (entry, offset) in &self.central {
            out.extend_from_slice(&0x02014b50u32.to_le_bytes());
            out.extend_from_slice(&0x031eu16.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&entry.flags.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&MOD_TIME.to_le_bytes());
            out.extend_from_slice(&MOD_DATE.to_le_bytes());
            out.extend_from_slice(&entry.crc32.to_le_bytes());
            out.extend_from_slice(&(entry.compressed.len() as u32).to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&(entry.extra.len() as u16).to_le_bytes());
            out.extend_from_slice(&(entry.comment.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&(0o100644u32 << 16).to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.extra);
            out.extend_from_slice(entry.comment.as_bytes());
        }

        let cd_size = out.len() as u32 - cd_offset;
        let count = self.central.len() as u16;
        out.extend_from_slice(&0x06054b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        out.extend_from_slice(comment.as_bytes());
        out
    }
}

/// One `id(2) length(2) payload` extra field sub-record.
pub fn extra_record(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Feed `data` in chunks of `chunk_size` bytes, then finish.
pub fn decode_chunked(decoder: &mut ZipStreamDecoder, data: &[u8], chunk_size: usize) -> Vec<ArchiveEvent> {
    let mut events = Vec::new();
    for chunk in data.chunks(chunk_size) {
        decoder.feed(chunk);
        events.extend(decoder.drain_events());
    }
    decoder.finish();
    events.extend(decoder.drain_events());
    events
}

/// Merge adjacent payload fragments so sequences from different chunkings
/// can be compared.
pub fn merge_payloads(events: Vec<ArchiveEvent>) -> Vec<ArchiveEvent> {
    let mut merged: Vec<ArchiveEvent> = Vec::new();
    for event in events {
        match (merged.last_mut(), event) {
            (Some(ArchiveEvent::Payload(acc)), ArchiveEvent::Payload(more)) => acc.extend(more),
            (_, event) => merged.push(event),
        }
    }
    merged
}
