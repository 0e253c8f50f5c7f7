use super::ChunkSource;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Local file reader that yields fixed-size chunks in file order
pub struct LocalFileSource {
    file: File,
    chunk_size: usize,
    transferred: u64,
}

impl LocalFileSource {
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("Chunk size must be greater than zero");
        }
        let file = File::open(path).await?;
        Ok(Self {
            file,
            chunk_size,
            transferred: 0,
        })
    }
}

#[async_trait]
impl ChunkSource for LocalFileSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self.file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.transferred += n as u64;
        Ok(Some(buf))
    }

    fn transferred_bytes(&self) -> u64 {
        self.transferred
    }
}
