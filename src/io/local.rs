use super::{ArchiveSource, MAX_ARCHIVE_SIZE};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Archive stored in a local file
pub struct LocalSource {
    path: PathBuf,
    display: String,
    size: u64,
}

impl LocalSource {
    pub fn new(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_ARCHIVE_SIZE {
            bail!(
                "{}: {} bytes is too large for a ZIP archive without ZIP64",
                path.display(),
                size
            );
        }
        Ok(Self {
            path: path.to_path_buf(),
            display: path.display().to_string(),
            size,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
impl ArchiveSource for LocalSource {
    async fn load(&self) -> Result<Vec<u8>> {
        let data = tokio::fs::read(&self.path).await?;
        log::debug!("read {} bytes from {}", data.len(), self.display);
        Ok(data)
    }

    fn location(&self) -> &str {
        &self.display
    }
}
