//! Domain entities produced by the content store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{PostStatus, ShareChannel};

/// A parsed, rendered post. Immutable once a corpus snapshot is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Position in the sorted file listing among successfully parsed files, starting at 1.
    pub id: u32,
    pub slug: String,
    pub title: String,
    pub author: String,
    /// Sanitised HTML rendered from the markdown body.
    pub body_html: String,
    pub excerpt: String,
    /// Tags in source order; duplicates and case are preserved.
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub featured: bool,
    pub status: PostStatus,
    pub read_time_minutes: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Present iff `status` is [`PostStatus::Published`].
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Case-insensitive exact tag match.
    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|candidate| candidate.to_lowercase() == needle)
    }

    pub fn shares_tag_with(&self, other: &Post) -> bool {
        other.tags.iter().any(|tag| self.has_tag(tag))
    }
}

/// Metadata block decoded from the head of a source file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub status: Option<PostStatus>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
}

impl FrontMatter {
    pub fn status(&self) -> PostStatus {
        PostStatus::derive(self.status, self.published)
    }
}

/// Engagement counters for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMetrics {
    pub post_id: u32,
    pub view_count: u64,
    pub share_count: u64,
    pub facebook_shares: u64,
    pub twitter_shares: u64,
    pub linkedin_shares: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_viewed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_shared_at: Option<OffsetDateTime>,
}

impl PostMetrics {
    pub fn new(post_id: u32) -> Self {
        Self {
            post_id,
            view_count: 0,
            share_count: 0,
            facebook_shares: 0,
            twitter_shares: 0,
            linkedin_shares: 0,
            last_viewed_at: None,
            last_shared_at: None,
        }
    }

    pub(crate) fn record_view(&mut self, at: OffsetDateTime) {
        self.view_count += 1;
        self.last_viewed_at = Some(at);
    }

    pub(crate) fn record_share(&mut self, channel: ShareChannel, at: OffsetDateTime) {
        self.share_count += 1;
        self.last_shared_at = Some(at);
        match channel {
            ShareChannel::Facebook => self.facebook_shares += 1,
            ShareChannel::Twitter => self.twitter_shares += 1,
            ShareChannel::LinkedIn => self.linkedin_shares += 1,
            ShareChannel::Other => {}
        }
    }
}
