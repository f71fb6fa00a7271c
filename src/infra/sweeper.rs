//! Periodic removal of expired entries from in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// A store that can drop its expired entries in one pass.
pub trait Sweep: Send + Sync + 'static {
    /// Returns the number of entries removed.
    fn sweep(&self) -> usize;
}

/// Run `store.sweep()` every `every` until the returned handle is aborted.
///
/// The first sweep happens one full period after spawning. `every` must be
/// non-zero.
pub fn spawn_sweeper<S>(store: Arc<S>, every: Duration, name: &'static str) -> JoinHandle<()>
where
    S: Sweep + ?Sized,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            let removed = store.sweep();
            debug!(store = name, removed, "periodic sweep finished");
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::TtlCache;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Sweep for Counting {
        fn sweep(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_once_per_period() {
        let store = Arc::new(Counting::default());
        let handle = spawn_sweeper(Arc::clone(&store), Duration::from_secs(10), "counting");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.0.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.0.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn removes_expired_cache_entries() {
        let cache: Arc<TtlCache<&'static str, u8>> = Arc::new(TtlCache::new());
        cache.set("short", 1, Duration::from_secs(5));
        cache.set("long", 2, Duration::from_secs(600));
        let handle = spawn_sweeper(Arc::clone(&cache), Duration::from_secs(10), "cache");

        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(2));
        handle.abort();
    }
}
