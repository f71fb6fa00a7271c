//! Cache configuration.
//!
//! Controls how long a loaded corpus stays fresh and how often expired
//! entries are physically removed.

use std::time::Duration;

const DEFAULT_CORPUS_TTL_SECS: u64 = 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of the cached post corpus.
    pub corpus_ttl: Duration,
    /// Cadence of the background sweep that drops expired entries.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            corpus_ttl: Duration::from_secs(DEFAULT_CORPUS_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            corpus_ttl: settings.ttl,
            sweep_interval: settings.sweep_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;

    #[test]
    fn defaults_follow_documented_cadence() {
        let config = CacheConfig::default();
        assert_eq!(config.corpus_ttl, Duration::from_secs(3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn settings_are_carried_over() {
        let settings = CacheSettings {
            ttl: Duration::from_secs(90),
            sweep_interval: Duration::from_secs(15),
        };
        let config = CacheConfig::from(&settings);
        assert_eq!(config.corpus_ttl, Duration::from_secs(90));
        assert_eq!(config.sweep_interval, Duration::from_secs(15));
    }
}
