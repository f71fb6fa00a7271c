use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Markdown blog content store")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FOLIO_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List posts, newest first. Only published posts unless --all is given.
    List(ListArgs),
    /// Print one post by slug.
    Show(ShowArgs),
    /// Find posts whose title, excerpt, tags or body contain a query.
    Search(SearchArgs),
    /// Print every tag in use.
    Tags(OutputArgs),
    /// Print posts sharing a tag with the given post.
    Related(RelatedArgs),
    /// Keep the corpus warm and run the expiry sweeps until interrupted.
    Serve(ServeArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::List(ListArgs::default())
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct OutputArgs {
    /// Print JSON instead of plain text.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListArgs {
    /// Include drafts and archived posts.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub all: bool,

    /// Only posts carrying this tag (case-insensitive).
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Stop after this many posts.
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    pub slug: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    pub query: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RelatedArgs {
    pub slug: String,

    /// Maximum number of related posts.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(usize))]
    pub limit: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

/// Overrides accepted by every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the directory holding post files.
    #[arg(
        long = "content-dir",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub content_dir: Option<PathBuf>,

    /// Override the post file extension.
    #[arg(long = "content-extension", value_name = "EXT", global = true)]
    pub content_extension: Option<String>,

    /// Override how long a loaded corpus is reused.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the cache sweep interval.
    #[arg(long = "cache-sweep-interval-seconds", value_name = "SECONDS")]
    pub cache_sweep_interval_seconds: Option<u64>,

    /// Override the admin session lifetime.
    #[arg(long = "session-duration-seconds", value_name = "SECONDS")]
    pub session_duration_seconds: Option<u64>,

    /// Override the session sweep interval.
    #[arg(long = "session-sweep-interval-seconds", value_name = "SECONDS")]
    pub session_sweep_interval_seconds: Option<u64>,
}
