use async_trait::async_trait;
use log::warn;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use super::ChunkSource;
use anyhow::{Result, bail};

/// HTTP body reader for remote ZIP files
///
/// The body is consumed in the order the server sends it. If the connection
/// drops mid-body, the download resumes with a Range request from the first
/// byte not yet handed out.
pub struct HttpStreamSource {
    client: Client,
    url: String,
    response: Option<Response>,
    transferred_bytes: u64,
    max_retry: u32,
}

impl HttpStreamSource {
    /// Create a new HTTP stream reader
    ///
    /// This sends the initial GET request; the body is read lazily.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let response = Self::request(&client, &url, 0).await?;

        Ok(Self {
            client,
            url,
            response: Some(response),
            transferred_bytes: 0,
            max_retry: 10,
        })
    }

    async fn request(client: &Client, url: &str, offset: u64) -> Result<Response> {
        let mut request = client.get(url);
        if offset > 0 {
            request = request.header("Range", format!("bytes={}-", offset));
        }
        let resp = request.send().await?;

        if offset > 0 && resp.status() != StatusCode::PARTIAL_CONTENT {
            bail!(
                "Cannot resume download at byte {}: server answered {}",
                offset,
                resp.status()
            );
        }
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }
        Ok(resp)
    }
}

#[async_trait]
impl ChunkSource for HttpStreamSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut retry_count = 0;

        loop {
            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };

            match response.chunk().await {
                Ok(Some(bytes)) => {
                    self.transferred_bytes += bytes.len() as u64;
                    return Ok(Some(bytes.to_vec()));
                }
                Ok(None) => {
                    self.response = None;
                    return Ok(None);
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_body() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    warn!(
                        "Connection error at byte {}, retry {}/{}: {}",
                        self.transferred_bytes, retry_count, self.max_retry, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                    self.response =
                        Some(Self::request(&self.client, &self.url, self.transferred_bytes).await?);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }
}
