//! Cached access to the parsed post corpus.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::frontmatter::{self, SourceContext};
use crate::application::repos::{ContentSource, SourceError};
use crate::cache::TtlCache;
use crate::domain::entities::Post;
use crate::domain::posts::sort_newest_first;

/// Cache key under which the whole corpus is stored.
pub const CORPUS_CACHE_KEY: &str = "all_posts";

pub const METRIC_CORPUS_RELOAD_MS: &str = "folio_corpus_reload_ms";
pub const METRIC_CORPUS_POSTS: &str = "folio_corpus_posts";
pub const METRIC_POSTS_SKIPPED: &str = "folio_posts_skipped_total";

/// An immutable, sorted snapshot of every parsed post.
pub type Corpus = Arc<[Post]>;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Loads posts from a [`ContentSource`] and keeps the result in a [`TtlCache`].
///
/// A cache hit returns the stored snapshot without looking at the source.
/// Concurrent misses each scan the source; the last writer wins.
#[derive(Clone)]
pub struct PostRepository {
    source: Arc<dyn ContentSource>,
    cache: Arc<TtlCache<String, Corpus>>,
    ttl: Duration,
}

impl PostRepository {
    pub fn new(
        source: Arc<dyn ContentSource>,
        cache: Arc<TtlCache<String, Corpus>>,
        ttl: Duration,
    ) -> Self {
        Self { source, cache, ttl }
    }

    pub async fn load_all(&self) -> Result<Corpus, CorpusError> {
        if let Some(corpus) = self.cache.get(CORPUS_CACHE_KEY) {
            debug!(posts = corpus.len(), "serving cached corpus");
            return Ok(corpus);
        }

        let started = Instant::now();
        let corpus = self.scan().await?;
        self.cache
            .set(CORPUS_CACHE_KEY.to_string(), Arc::clone(&corpus), self.ttl);

        let elapsed = started.elapsed();
        histogram!(METRIC_CORPUS_RELOAD_MS).record(elapsed.as_secs_f64() * 1000.0);
        gauge!(METRIC_CORPUS_POSTS).set(corpus.len() as f64);
        info!(
            posts = corpus.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "post corpus reloaded"
        );
        Ok(corpus)
    }

    pub async fn get_by_id(&self, id: u32) -> Result<Option<Post>, CorpusError> {
        let corpus = self.load_all().await?;
        Ok(corpus.iter().find(|post| post.id == id).cloned())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, CorpusError> {
        let corpus = self.load_all().await?;
        Ok(corpus.iter().find(|post| post.slug == slug).cloned())
    }

    /// Drop the cached corpus so the next read rescans the source.
    pub fn invalidate(&self) {
        self.cache.delete(CORPUS_CACHE_KEY);
        debug!("corpus cache invalidated");
    }

    /// Rescan the source now, replacing any cached corpus.
    pub async fn reload(&self) -> Result<Corpus, CorpusError> {
        self.invalidate();
        self.load_all().await
    }

    async fn scan(&self) -> Result<Corpus, CorpusError> {
        let documents = self.source.documents().await?;
        let mut posts = Vec::with_capacity(documents.len());
        let mut next_id: u32 = 1;

        for document in &documents {
            let context = SourceContext {
                file_stem: document.file_stem(),
                modified: document.modified,
            };
            match frontmatter::parse(&document.contents, next_id, context) {
                Ok(post) => {
                    posts.push(post);
                    next_id += 1;
                }
                Err(error) => {
                    counter!(METRIC_POSTS_SKIPPED).increment(1);
                    warn!(
                        path = %document.path.display(),
                        error = %error,
                        "skipping post that failed to parse"
                    );
                }
            }
        }

        sort_newest_first(&mut posts);
        Ok(Arc::from(posts))
    }
}
