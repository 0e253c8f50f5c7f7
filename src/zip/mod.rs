//! Streaming ZIP decoding.
//!
//! This module walks a ZIP archive front to back as its bytes arrive, without
//! seeking and without buffering the whole file.
//!
//! ## Architecture
//!
//! - [`cursor`]: Incremental reader over queued byte chunks
//! - [`structures`]: Fixed-layout records (local header, central directory, EOCD)
//! - [`extra`]: Extra field sub-records (Unix timestamps, Unix owner)
//! - [`decoder`]: The record state machine, fed with chunks
//! - [`sink`]: Per-entry payload channel
//! - [`stream`]: Async driver pulling chunks from a [`ChunkSource`](crate::io::ChunkSource)
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Read in order, the local headers alone are enough to enumerate entries
//! and pass their compressed data along. The central directory and EOCD are
//! decoded in extended mode.
//!
//! ## Limitations
//!
//! - No decompression: payloads are published still compressed
//! - No data descriptors (entries whose sizes follow their data)
//! - No ZIP64; such archives are reported, not misread
//! - No multi-disk archive support

pub mod cursor;
pub mod decoder;
pub mod error;
pub mod event;
pub mod extra;
pub mod sink;
pub mod stream;
pub mod structures;

pub use cursor::ByteCursor;
pub use decoder::{ChunkSink, DecoderOptions, ZipStreamDecoder};
pub use error::{DecodeError, ErrorKind};
pub use event::{ArchiveEvent, EventSource};
pub use extra::{
    ExtendedTimestamp, ExtraFieldData, ExtraFieldEntry, ExtraFieldList, UnixOwner,
    parse_extra_fields,
};
pub use sink::EntryPayloadSink;
pub use stream::ZipStream;
pub use structures::*;
