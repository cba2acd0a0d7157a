use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{ArchiveSource, MAX_ARCHIVE_SIZE};
use anyhow::{Result, bail};

/// Archive downloaded in full from an HTTP(S) URL
pub struct HttpSource {
    client: Client,
    url: String,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpSource {
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            url,
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Body bytes received so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ArchiveSource for HttpSource {
    async fn load(&self) -> Result<Vec<u8>> {
        let mut retry_count = 0;

        loop {
            let result = self.client.get(&self.url).send().await;

            match result {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    // Refuse before downloading when the server tells us the size
                    if let Some(len) = resp.content_length() {
                        if len > MAX_ARCHIVE_SIZE {
                            bail!("{len} bytes is too large for a ZIP archive without ZIP64");
                        }
                    }

                    let bytes = resp.bytes().await?;
                    self.transferred_bytes
                        .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                    if bytes.len() as u64 > MAX_ARCHIVE_SIZE {
                        bail!(
                            "{} bytes is too large for a ZIP archive without ZIP64",
                            bytes.len()
                        );
                    }

                    log::debug!("downloaded {} bytes from {}", bytes.len(), self.url);
                    return Ok(bytes.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("{}: gave up after {} attempts: {e}", self.url, retry_count);
                    }
                    log::warn!("{}: {e}, retrying ({retry_count}/{})", self.url, self.max_retry);
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn location(&self) -> &str {
        &self.url
    }
}
