//! # zipstream
//!
//! Incremental ZIP decoding from a stream of byte chunks.
//!
//! This library walks a ZIP archive in the order its bytes arrive: chunks of
//! any size are pushed into a [`ZipStreamDecoder`], which publishes an event
//! for every local file header, a run of payload fragments per entry, and
//! (in extended mode) each central directory record and the end record.
//! Nothing is seeked and nothing beyond the unconsumed backlog is buffered,
//! so entries can be listed or piped while the archive is still downloading.
//!
//! ## Features
//!
//! - Chunk-size independent decoding, including fields split across chunks
//! - Local headers, central directory records and the end record
//! - Info-ZIP extended timestamp and Unix UID/GID extra fields
//! - Async driver over local files and HTTP/HTTPS bodies
//!
//! Payloads are published still compressed; decompression is up to the
//! consumer (see [`pipe`] for the stored/deflate consumer the CLI uses).
//!
//! ## Example
//!
//! ```
//! use zipstream::{ArchiveEvent, DecoderOptions, ZipStreamDecoder};
//!
//! # fn archive_bytes() -> Vec<Vec<u8>> { vec![b"PK\x01\x02".to_vec()] }
//! let mut decoder = ZipStreamDecoder::new(DecoderOptions::default());
//! for chunk in archive_bytes() {
//!     decoder.feed(chunk);
//!     for event in decoder.drain_events() {
//!         match event {
//!             ArchiveEvent::FileEntry(header) => println!("{}", header.file_name),
//!             ArchiveEvent::Payload(bytes) => println!("  {} bytes", bytes.len()),
//!             ArchiveEvent::Error(err) => eprintln!("{err}"),
//!             _ => {}
//!         }
//!     }
//! }
//! decoder.finish();
//! ```

pub mod cli;
pub mod io;
pub mod pipe;
pub mod zip;

pub use cli::Cli;
pub use io::{ChunkList, ChunkSource, HttpStreamSource, LocalFileSource};
pub use zip::{
    ArchiveEvent, DecodeError, DecoderOptions, ErrorKind, LocalFileHeader, ZipStream,
    ZipStreamDecoder,
};
