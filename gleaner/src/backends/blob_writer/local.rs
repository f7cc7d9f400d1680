use anyhow::{ensure, Result};
use std::{path::PathBuf, sync::Arc};
use tokio::fs;

use gleaner_core::backends::blob_writer;

/// Writes blobs as plain files directly under a base directory.
///
/// Names are appended to the base directory verbatim. The directory is never
/// created and existing files are truncated.
#[derive(Clone, Debug)]
pub struct LocalBlobWriter {
    location: PathBuf,
}

impl Default for LocalBlobWriter {
    fn default() -> Self {
        LocalBlobWriter::new(".")
    }
}

impl LocalBlobWriter {
    pub fn new(location: impl Into<PathBuf>) -> LocalBlobWriter {
        LocalBlobWriter {
            location: location.into(),
        }
    }

    /// Use `location` as the base directory, or the working directory if unset.
    pub fn open(location: Option<PathBuf>) -> blob_writer::BlobWriter {
        let writer = location.map(LocalBlobWriter::new).unwrap_or_default();
        Arc::new(writer)
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.location.clone().into_os_string();
        path.push("/");
        path.push(name);
        PathBuf::from(path)
    }
}

#[async_trait::async_trait]
impl blob_writer::BlobWriterBackend for LocalBlobWriter {
    async fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
        ensure!(!name.is_empty(), "blob name must not be empty");

        let path = self.path_for(name);

        tracing::info!("attempting to write {} bytes to {}", contents.len(), name);

        fs::write(&path, contents).await?;

        tracing::info!("the write was successful");

        Ok(())
    }
}
