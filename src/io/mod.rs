//! Where the command-line tool gets archive bytes from.
//!
//! The codec needs the whole archive as one contiguous buffer, so every
//! source loads the archive completely before it is opened.

mod http;
mod local;

pub use http::HttpSource;
pub use local::LocalSource;

use anyhow::Result;
use async_trait::async_trait;

/// Largest archive the codec can address without ZIP64 (4 GiB - 1).
pub const MAX_ARCHIVE_SIZE: u64 = u32::MAX as u64;

/// A location an archive can be loaded from.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Read the entire archive into memory.
    async fn load(&self) -> Result<Vec<u8>>;

    /// Human-readable location, for messages.
    fn location(&self) -> &str;
}
