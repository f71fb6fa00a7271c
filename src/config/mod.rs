//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::warn;

pub use cli::{
    CliArgs, Command, GlobalOverrides, ListArgs, OutputArgs, RelatedArgs, SearchArgs, ServeArgs,
    ServeOverrides, ShowArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";
const DEFAULT_CONTENT_DIR: &str = "posts";
const DEFAULT_CONTENT_EXTENSION: &str = "md";
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_CACHE_SWEEP_SECS: u64 = 5 * 60;
const DEFAULT_SESSION_DURATION_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 60 * 60;
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub content: ContentSettings,
    pub cache: CacheSettings,
    pub session: SessionSettings,
    pub admin: AdminSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub directory: PathBuf,
    /// File extension without the leading dot.
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub duration: Duration,
    pub sweep_interval: Duration,
}

#[derive(Clone)]
pub struct AdminSettings {
    pub username: String,
    pub password: String,
}

impl AdminSettings {
    pub fn uses_default_credentials(&self) -> bool {
        self.username == DEFAULT_ADMIN_USERNAME && self.password == DEFAULT_ADMIN_PASSWORD
    }
}

impl fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_global_overrides(&cli.overrides);
    if let Some(Command::Serve(args)) = cli.command.as_ref() {
        raw.apply_serve_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            content,
            cache,
            session,
            admin,
            logging,
        } = raw;

        Ok(Self {
            content: build_content_settings(content)?,
            cache: build_cache_settings(cache)?,
            session: build_session_settings(session)?,
            admin: build_admin_settings(admin)?,
            logging: build_logging_settings(logging)?,
        })
    }

    /// Log a warning when the built-in admin credentials are still active.
    pub fn warn_on_default_credentials(&self) {
        if self.admin.uses_default_credentials() {
            warn!(
                username = %self.admin.username,
                "admin credentials are the built-in defaults; set FOLIO__ADMIN__USERNAME and FOLIO__ADMIN__PASSWORD"
            );
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    content: RawContentSettings,
    cache: RawCacheSettings,
    session: RawSessionSettings,
    admin: RawAdminSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_global_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(directory) = overrides.content_dir.as_ref() {
            self.content.directory = Some(directory.clone());
        }
        if let Some(extension) = overrides.content_extension.as_ref() {
            self.content.extension = Some(extension.clone());
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(seconds) = overrides.cache_sweep_interval_seconds {
            self.cache.sweep_interval_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.session_duration_seconds {
            self.session.duration_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.session_sweep_interval_seconds {
            self.session.sweep_interval_seconds = Some(seconds);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    directory: Option<PathBuf>,
    extension: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    duration_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let directory = content
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "content.directory",
            "must not be empty",
        ));
    }

    let extension = content
        .extension
        .as_deref()
        .map(|value| value.trim().trim_start_matches('.'))
        .unwrap_or(DEFAULT_CONTENT_EXTENSION)
        .to_string();
    if extension.is_empty() {
        return Err(LoadError::invalid(
            "content.extension",
            "must not be empty",
        ));
    }

    Ok(ContentSettings {
        directory,
        extension,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    Ok(CacheSettings {
        ttl: non_zero_secs(
            cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            "cache.ttl_seconds",
        )?,
        sweep_interval: non_zero_secs(
            cache
                .sweep_interval_seconds
                .unwrap_or(DEFAULT_CACHE_SWEEP_SECS),
            "cache.sweep_interval_seconds",
        )?,
    })
}

fn build_session_settings(session: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    Ok(SessionSettings {
        duration: non_zero_secs(
            session
                .duration_seconds
                .unwrap_or(DEFAULT_SESSION_DURATION_SECS),
            "session.duration_seconds",
        )?,
        sweep_interval: non_zero_secs(
            session
                .sweep_interval_seconds
                .unwrap_or(DEFAULT_SESSION_SWEEP_SECS),
            "session.sweep_interval_seconds",
        )?,
    })
}

fn build_admin_settings(admin: RawAdminSettings) -> Result<AdminSettings, LoadError> {
    let username = admin
        .username
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
    if username.trim().is_empty() {
        return Err(LoadError::invalid("admin.username", "must not be empty"));
    }

    let password = admin
        .password
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());
    if password.is_empty() {
        return Err(LoadError::invalid("admin.password", "must not be empty"));
    }

    Ok(AdminSettings { username, password })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn non_zero_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}
