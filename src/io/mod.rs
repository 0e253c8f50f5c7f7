mod http;
mod local;

pub use http::HttpStreamSource;
pub use local::LocalFileSource;

use anyhow::Result;
use async_trait::async_trait;

/// Default read size for sources that choose their own chunking
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Trait for sequential, chunked reading from a data source
#[async_trait]
pub trait ChunkSource: Send {
    /// Return the next chunk, or `None` once the source is exhausted
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Total bytes handed out so far
    fn transferred_bytes(&self) -> u64;
}

/// In-memory source that replays a fixed list of chunks
pub struct ChunkList {
    chunks: std::collections::VecDeque<Vec<u8>>,
    transferred: u64,
}

impl ChunkList {
    pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            transferred: 0,
        }
    }

    /// Split `data` into chunks of `chunk_size` bytes
    pub fn split(data: &[u8], chunk_size: usize) -> Self {
        Self::new(data.chunks(chunk_size.max(1)).map(<[u8]>::to_vec))
    }
}

#[async_trait]
impl ChunkSource for ChunkList {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self.chunks.pop_front();
        if let Some(chunk) = &chunk {
            self.transferred += chunk.len() as u64;
        }
        Ok(chunk)
    }

    fn transferred_bytes(&self) -> u64 {
        self.transferred
    }
}
