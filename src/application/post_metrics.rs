//! View and share counters per post.
//!
//! Counters live in memory only and start over when the process restarts.
//! "Today" means the current UTC calendar day.

use std::collections::HashMap;
use std::sync::RwLock;

use metrics::counter;
use time::OffsetDateTime;
use tracing::trace;

use crate::cache::{rw_read, rw_write};
use crate::domain::entities::PostMetrics;
use crate::domain::types::ShareChannel;

pub const METRIC_POST_VIEWS: &str = "folio_post_views_total";
pub const METRIC_POST_SHARES: &str = "folio_post_shares_total";

const SOURCE: &str = "application::post_metrics";

#[derive(Default)]
pub struct PostMetricsService {
    records: RwLock<HashMap<u32, PostMetrics>>,
}

impl PostMetricsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_view(&self, post_id: u32) {
        self.record_view_at(post_id, OffsetDateTime::now_utc());
    }

    pub fn record_share(&self, post_id: u32, channel: ShareChannel) {
        self.record_share_at(post_id, channel, OffsetDateTime::now_utc());
    }

    pub(crate) fn record_view_at(&self, post_id: u32, at: OffsetDateTime) {
        rw_write(&self.records, SOURCE, "record_view")
            .entry(post_id)
            .or_insert_with(|| PostMetrics::new(post_id))
            .record_view(at);
        counter!(METRIC_POST_VIEWS).increment(1);
        trace!(post_id, "post view recorded");
    }

    pub(crate) fn record_share_at(&self, post_id: u32, channel: ShareChannel, at: OffsetDateTime) {
        rw_write(&self.records, SOURCE, "record_share")
            .entry(post_id)
            .or_insert_with(|| PostMetrics::new(post_id))
            .record_share(channel, at);
        counter!(METRIC_POST_SHARES, "channel" => channel.as_str()).increment(1);
        trace!(post_id, channel = channel.as_str(), "post share recorded");
    }

    /// Counters for `post_id`; a post never seen gets a zeroed record.
    pub fn metrics(&self, post_id: u32) -> PostMetrics {
        rw_read(&self.records, SOURCE, "metrics")
            .get(&post_id)
            .cloned()
            .unwrap_or_else(|| PostMetrics::new(post_id))
    }

    /// Every record, ordered by post ID.
    pub fn all(&self) -> Vec<PostMetrics> {
        let mut records: Vec<PostMetrics> = rw_read(&self.records, SOURCE, "all")
            .values()
            .cloned()
            .collect();
        records.sort_by_key(|record| record.post_id);
        records
    }

    pub fn total_views(&self) -> u64 {
        self.sum(|record| record.view_count)
    }

    pub fn total_shares(&self) -> u64 {
        self.sum(|record| record.share_count)
    }

    /// Views of posts whose most recent view happened today.
    pub fn today_views(&self) -> u64 {
        self.today_views_at(OffsetDateTime::now_utc())
    }

    /// Shares of posts whose most recent share happened today.
    pub fn today_shares(&self) -> u64 {
        self.today_shares_at(OffsetDateTime::now_utc())
    }

    pub(crate) fn today_views_at(&self, now: OffsetDateTime) -> u64 {
        self.sum_on_day(now, |record| (record.last_viewed_at, record.view_count))
    }

    pub(crate) fn today_shares_at(&self, now: OffsetDateTime) -> u64 {
        self.sum_on_day(now, |record| (record.last_shared_at, record.share_count))
    }

    fn sum(&self, field: impl Fn(&PostMetrics) -> u64) -> u64 {
        rw_read(&self.records, SOURCE, "sum")
            .values()
            .map(field)
            .sum()
    }

    /// Sum the counter of every record whose last event fell on `now`'s UTC day.
    fn sum_on_day(
        &self,
        now: OffsetDateTime,
        field: impl Fn(&PostMetrics) -> (Option<OffsetDateTime>, u64),
    ) -> u64 {
        let today = now.to_offset(time::UtcOffset::UTC).date();
        rw_read(&self.records, SOURCE, "sum_on_day")
            .values()
            .map(field)
            .filter_map(|(last, count)| {
                last.filter(|at| at.to_offset(time::UtcOffset::UTC).date() == today)
                    .map(|_| count)
            })
            .sum()
    }
}
