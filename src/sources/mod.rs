//! Text acquisition for the command-line host.
//!
//! Reading input is the only asynchronous step: a [`TextSource`] delivers one
//! complete text blob, after which extraction, matching and formatting run
//! synchronously.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::models::{ReferenceBatch, StoreError};

/// Name used for standard input on the command line
pub const STDIN_NAME: &str = "-";

/// Errors raised while acquiring text
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// IO error (file system, stdin)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(String),
}

/// A one-shot supplier of text.
#[async_trait]
pub trait TextSource: Send + Sync + std::fmt::Debug {
    /// Human-readable name for messages
    fn name(&self) -> &str;

    /// Deliver the complete text, or fail the load
    async fn acquire_text(&self) -> Result<String, SourceError>;
}

fn decode(name: &str, bytes: Vec<u8>) -> Result<String, SourceError> {
    let text = String::from_utf8(bytes).map_err(|_| SourceError::InvalidUtf8(name.to_string()))?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// A file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TextSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire_text(&self) -> Result<String, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(self.name.clone())
            } else {
                SourceError::Io(e)
            }
        })?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), self.name);
        decode(&self.name, bytes)
    }
}

/// Standard input, read to the end
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

#[async_trait]
impl TextSource for StdinSource {
    fn name(&self) -> &str {
        "<stdin>"
    }

    async fn acquire_text(&self) -> Result<String, SourceError> {
        let mut bytes = Vec::new();
        tokio::io::stdin().read_to_end(&mut bytes).await?;
        decode(self.name(), bytes)
    }
}

/// Text already in memory
#[derive(Debug, Clone)]
pub struct StringSource {
    name: String,
    text: String,
}

impl StringSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl TextSource for StringSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire_text(&self) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }
}

/// Source for a command-line argument: `-` is stdin, anything else a path.
pub fn source_for(arg: &str) -> Box<dyn TextSource> {
    if arg == STDIN_NAME {
        Box::new(StdinSource)
    } else {
        Box::new(FileSource::new(arg))
    }
}

/// Errors from loading a reference batch through a source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{name}: {error}")]
    Store { name: String, error: StoreError },
}

/// Acquire text and parse it as a reference batch.
pub async fn load_batch(source: &dyn TextSource) -> Result<ReferenceBatch, LoadError> {
    let text = source.acquire_text().await?;
    ReferenceBatch::from_json(&text).map_err(|error| LoadError::Store {
        name: source.name().to_string(),
        error,
    })
}
