//! Turning an entry's compressed payload back into file contents.
//!
//! The decoder only routes compressed bytes; this is the consumer the CLI
//! plugs in for `-p`. Stored and deflate entries are supported.

use anyhow::Result;
use flate2::write::DeflateDecoder;
use std::io::Write;

use crate::zip::CompressionMethod;

/// Per-entry payload consumer producing uncompressed bytes.
pub enum PayloadWriter {
    Stored,
    Deflate(DeflateDecoder<Vec<u8>>),
}

impl PayloadWriter {
    /// Writer for `method`, or `None` if the method is not supported
    pub fn for_method(method: CompressionMethod) -> Option<Self> {
        match method {
            CompressionMethod::Stored => Some(PayloadWriter::Stored),
            CompressionMethod::Deflate => Some(PayloadWriter::Deflate(DeflateDecoder::new(Vec::new()))),
            _ => None,
        }
    }

    /// Decode one payload fragment, returning whatever output it completed
    pub fn write_fragment(&mut self, fragment: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            PayloadWriter::Stored => Ok(fragment),
            PayloadWriter::Deflate(decoder) => {
                decoder.write_all(&fragment)?;
                Ok(std::mem::take(decoder.get_mut()))
            }
        }
    }

    /// Flush the remaining output at the end of the entry
    pub fn finish(self) -> Result<Vec<u8>> {
        match self {
            PayloadWriter::Stored => Ok(Vec::new()),
            PayloadWriter::Deflate(decoder) => Ok(decoder.finish()?),
        }
    }
}
