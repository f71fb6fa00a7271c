//! Post sources read from a directory on disk.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::repos::{ContentSource, SourceDocument, SourceError};
use crate::config::ContentSettings;

/// Every file directly inside `directory` whose extension matches.
///
/// Subdirectories are not descended into. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct FsContentSource {
    directory: PathBuf,
    extension: String,
}

impl FsContentSource {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            directory: directory.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.extension))
    }

    async fn list_candidates(&self) -> Result<Vec<PathBuf>, SourceError> {
        let unavailable = |source: std::io::Error| SourceError::unavailable(&self.directory, source);
        let mut entries = fs::read_dir(&self.directory).await.map_err(unavailable)?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if self.matches(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl From<&ContentSettings> for FsContentSource {
    fn from(settings: &ContentSettings) -> Self {
        Self::new(settings.directory.clone(), settings.extension.clone())
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn documents(&self) -> Result<Vec<SourceDocument>, SourceError> {
        let paths = self.list_candidates().await?;
        let mut documents = Vec::with_capacity(paths.len());

        for path in paths {
            match read_document(&path).await {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => debug!(path = %path.display(), "skipping non-file entry"),
                Err(error) => warn!(
                    path = %path.display(),
                    error = %error,
                    "skipping unreadable post file"
                ),
            }
        }

        debug!(
            directory = %self.directory.display(),
            documents = documents.len(),
            "content directory scanned"
        );
        Ok(documents)
    }
}

async fn read_document(path: &Path) -> std::io::Result<Option<SourceDocument>> {
    let metadata = fs::metadata(path).await?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let contents = fs::read(path).await?;
    let mut document = SourceDocument::new(path, contents);
    if let Ok(modified) = metadata.modified() {
        document = document.with_modified(OffsetDateTime::from(modified));
    }
    Ok(Some(document))
}
