use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use folio::application::post_metrics::PostMetricsService;
use folio::application::posts::PostRepository;
use folio::application::sessions::SessionManager;
use folio::cache::TtlCache;
use folio::domain::types::ShareChannel;
use folio::infra::content::FsContentSource;
use metrics_util::debugging::DebuggingRecorder;
use tempfile::TempDir;

#[tokio::test(start_paused = true)]
async fn store_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Corpus reload, skipped file, cache miss then hit, then a sweep.
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("good.md"),
        "---\ntitle: Good\ndate: 2024-01-01\n---\nbody",
    )
    .expect("write");
    std::fs::write(dir.path().join("bad.md"), "no metadata").expect("write");

    let cache = Arc::new(TtlCache::new());
    let repo = PostRepository::new(
        Arc::new(FsContentSource::new(dir.path(), "md")),
        Arc::clone(&cache),
        Duration::from_secs(10),
    );
    assert_eq!(repo.load_all().await.expect("load").len(), 1);
    assert_eq!(repo.load_all().await.expect("load").len(), 1);
    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(cache.sweep(), 1);

    // Sessions: one rejected login, one accepted.
    let sessions = SessionManager::new("admin", "pw", Duration::from_secs(60));
    assert!(sessions.login("admin", "nope").is_err());
    sessions.login("admin", "pw").expect("login");

    // Engagement counters.
    let engagement = PostMetricsService::new();
    engagement.record_view(1);
    engagement.record_share(1, ShareChannel::LinkedIn);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "folio_cache_hit_total",
        "folio_cache_miss_total",
        "folio_cache_swept_total",
        "folio_corpus_reload_ms",
        "folio_corpus_posts",
        "folio_posts_skipped_total",
        "folio_sessions_active",
        "folio_login_failed_total",
        "folio_post_views_total",
        "folio_post_shares_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
