use anyhow::Result;
use std::{fmt::Debug, sync::Arc};

pub type BlobWriter = Arc<dyn BlobWriterBackend>;

/// Persists named, uninterpreted byte sequences.
#[async_trait::async_trait]
pub trait BlobWriterBackend: Debug + Send + Sync {
    /// Write `contents` under `name`, replacing anything already stored there.
    async fn write(&self, name: &str, contents: &[u8]) -> Result<()>;
}
