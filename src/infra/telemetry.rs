use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::post_metrics::{METRIC_POST_SHARES, METRIC_POST_VIEWS};
use crate::application::posts::{
    METRIC_CORPUS_POSTS, METRIC_CORPUS_RELOAD_MS, METRIC_POSTS_SKIPPED,
};
use crate::application::sessions::{METRIC_LOGIN_FAILED, METRIC_SESSIONS_ACTIVE};
use crate::cache::{METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_SWEPT};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of cache reads that found a live entry."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of cache reads that found nothing or an expired entry."
        );
        describe_counter!(
            METRIC_CACHE_SWEPT,
            Unit::Count,
            "Total number of expired cache entries removed by sweeps."
        );
        describe_histogram!(
            METRIC_CORPUS_RELOAD_MS,
            Unit::Milliseconds,
            "Time spent scanning and parsing the content directory."
        );
        describe_gauge!(
            METRIC_CORPUS_POSTS,
            Unit::Count,
            "Number of posts in the most recently loaded corpus."
        );
        describe_counter!(
            METRIC_POSTS_SKIPPED,
            Unit::Count,
            "Total number of source files skipped because they failed to parse."
        );
        describe_gauge!(
            METRIC_SESSIONS_ACTIVE,
            Unit::Count,
            "Number of stored admin sessions."
        );
        describe_counter!(
            METRIC_LOGIN_FAILED,
            Unit::Count,
            "Total number of rejected admin logins."
        );
        describe_counter!(
            METRIC_POST_VIEWS,
            Unit::Count,
            "Total number of recorded post views."
        );
        describe_counter!(
            METRIC_POST_SHARES,
            Unit::Count,
            "Total number of recorded post shares, labelled by channel."
        );
    });
}
