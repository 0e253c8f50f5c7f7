use anyhow::Result;
use log::debug;

use crate::io::ChunkSource;

use super::decoder::{DecoderOptions, ZipStreamDecoder};
use super::event::ArchiveEvent;

/// Drives a [`ZipStreamDecoder`] from an async chunk source.
///
/// Chunks are only pulled while no events are waiting, so at most one chunk
/// beyond the decoder's unconsumed backlog is held in memory. Once the
/// decoder stops (for instance at the central directory in streaming mode)
/// the source is not read any further.
pub struct ZipStream<S: ChunkSource> {
    source: S,
    decoder: ZipStreamDecoder,
    source_exhausted: bool,
    finished: bool,
}

impl<S: ChunkSource> ZipStream<S> {
    pub fn new(source: S, options: DecoderOptions) -> Self {
        Self {
            source,
            decoder: ZipStreamDecoder::new(options),
            source_exhausted: false,
            finished: false,
        }
    }

    /// Next event from the archive, or `None` after [`ArchiveEvent::Finished`].
    ///
    /// Errors are only returned for failures of the source itself; problems
    /// with the archive arrive as [`ArchiveEvent::Error`].
    pub async fn next_event(&mut self) -> Result<Option<ArchiveEvent>> {
        loop {
            if let Some(event) = self.decoder.next_event() {
                if event == ArchiveEvent::Finished {
                    self.finished = true;
                }
                return Ok(Some(event));
            }
            if self.finished || self.source_exhausted {
                return Ok(None);
            }
            if self.decoder.is_done() {
                // Stopped on an error: everything else the source has would be dropped
                debug!(
                    "decoder stopped after {} bytes, not reading further",
                    self.source.transferred_bytes()
                );
                self.source_exhausted = true;
                self.decoder.finish();
                continue;
            }

            match self.source.next_chunk().await? {
                Some(chunk) => self.decoder.feed(chunk),
                None => {
                    debug!(
                        "source exhausted after {} bytes",
                        self.source.transferred_bytes()
                    );
                    self.source_exhausted = true;
                    self.decoder.finish();
                }
            }
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn decoder(&self) -> &ZipStreamDecoder {
        &self.decoder
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
