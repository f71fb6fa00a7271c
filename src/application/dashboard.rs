//! Aggregate figures for the admin overview.

use serde::Serialize;

use crate::application::post_metrics::PostMetricsService;
use crate::domain::entities::{Post, PostMetrics};
use crate::domain::types::PostStatus;

#[derive(Debug, Clone, Serialize)]
pub struct PostWithMetrics {
    pub post: Post,
    pub metrics: PostMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_posts: usize,
    pub published_posts: usize,
    pub draft_posts: usize,
    pub archived_posts: usize,
    pub total_views: u64,
    pub total_shares: u64,
    pub today_views: u64,
    pub today_shares: u64,
    pub popular_posts: Vec<PostWithMetrics>,
    pub recent_posts: Vec<Post>,
}

impl DashboardStats {
    /// Summarise `corpus`, which must be in corpus order.
    ///
    /// Popular posts are the `popular_limit` most viewed; equal view counts
    /// keep corpus order. Recent posts are the first `recent_limit` entries.
    pub fn collect(
        corpus: &[Post],
        metrics: &PostMetricsService,
        popular_limit: usize,
        recent_limit: usize,
    ) -> Self {
        let count = |status: PostStatus| corpus.iter().filter(|post| post.status == status).count();

        let mut ranked: Vec<PostWithMetrics> = corpus
            .iter()
            .map(|post| PostWithMetrics {
                post: post.clone(),
                metrics: metrics.metrics(post.id),
            })
            .collect();
        ranked.sort_by(|a, b| b.metrics.view_count.cmp(&a.metrics.view_count));
        ranked.truncate(popular_limit);

        Self {
            total_posts: corpus.len(),
            published_posts: count(PostStatus::Published),
            draft_posts: count(PostStatus::Draft),
            archived_posts: count(PostStatus::Archived),
            total_views: metrics.total_views(),
            total_shares: metrics.total_shares(),
            today_views: metrics.today_views(),
            today_shares: metrics.today_shares(),
            popular_posts: ranked,
            recent_posts: corpus.iter().take(recent_limit).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::ShareChannel;

    fn post(id: u32, status: PostStatus) -> Post {
        Post {
            id,
            slug: format!("post-{id}"),
            title: format!("Post {id}"),
            author: String::new(),
            body_html: String::new(),
            excerpt: String::new(),
            tags: Vec::new(),
            category: None,
            featured: false,
            status,
            read_time_minutes: 1,
            date: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            published_at: None,
        }
    }

    #[test]
    fn counts_statuses_and_ranks_by_views() {
        let corpus = vec![
            post(1, PostStatus::Published),
            post(2, PostStatus::Draft),
            post(3, PostStatus::Published),
            post(4, PostStatus::Archived),
        ];
        let metrics = PostMetricsService::new();
        for _ in 0..3 {
            metrics.record_view(3);
        }
        metrics.record_view(2);
        metrics.record_view(4);
        metrics.record_share(3, ShareChannel::Facebook);

        let stats = DashboardStats::collect(&corpus, &metrics, 3, 2);

        assert_eq!(stats.total_posts, 4);
        assert_eq!(stats.published_posts, 2);
        assert_eq!(stats.draft_posts, 1);
        assert_eq!(stats.archived_posts, 1);
        assert_eq!(stats.total_views, 5);
        assert_eq!(stats.total_shares, 1);
        assert_eq!(stats.today_views, 5);
        assert_eq!(stats.today_shares, 1);

        let popular: Vec<u32> = stats.popular_posts.iter().map(|entry| entry.post.id).collect();
        assert_eq!(popular, vec![3, 2, 4]);
        let recent: Vec<u32> = stats.recent_posts.iter().map(|post| post.id).collect();
        assert_eq!(recent, vec![1, 2]);
    }

    #[test]
    fn empty_corpus_yields_zeroes() {
        let stats = DashboardStats::collect(&[], &PostMetricsService::new(), 5, 5);

        assert_eq!(stats.total_posts, 0);
        assert!(stats.popular_posts.is_empty());
        assert!(stats.recent_posts.is_empty());
    }
}
