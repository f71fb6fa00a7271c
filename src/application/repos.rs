//! Source adapters the post repository reads from.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content directory `{}` is unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.into(),
            source,
        }
    }
}

/// Raw bytes of one candidate post plus what the filesystem knows about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    pub modified: Option<OffsetDateTime>,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: OffsetDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// File name without its extension, or the empty string when there is none.
    pub fn file_stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Every candidate document, sorted by path.
    ///
    /// A document that cannot be read is left out; only an unreadable
    /// collection is an error.
    async fn documents(&self) -> Result<Vec<SourceDocument>, SourceError>;
}
