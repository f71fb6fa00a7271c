use std::{process, sync::Arc};

use folio::{
    application::{
        dashboard::DashboardStats,
        error::AppError,
        post_metrics::PostMetricsService,
        posts::{Corpus, PostRepository},
        sessions::SessionManager,
    },
    cache::{CacheConfig, TtlCache},
    config::{self, Command, ListArgs, RelatedArgs, SearchArgs, Settings, ShowArgs},
    domain::{entities::Post, posts},
    infra::{content::FsContentSource, error::InfraError, sweeper::spawn_sweeper, telemetry},
};
use serde::Serialize;
use time::macros::format_description;
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const DASHBOARD_POPULAR_LIMIT: usize = 5;
const DASHBOARD_RECENT_LIMIT: usize = 5;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.report().chain();
    if dispatcher::has_been_set() {
        error!(error = %chain, "{}", error.presentation_message());
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %chain, "{}", error.presentation_message());
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let store = ContentStore::build(&settings);
    match cli_args.command.unwrap_or_default() {
        Command::List(args) => run_list(&store.repository, args).await,
        Command::Show(args) => run_show(&store.repository, args).await,
        Command::Search(args) => run_search(&store.repository, args).await,
        Command::Tags(output) => {
            let corpus = store.repository.load_all().await?;
            let tags = posts::all_tags(posts::published_only(corpus.iter()));
            if output.json {
                print_json(&tags)
            } else {
                tags.iter().for_each(|tag| println!("{tag}"));
                Ok(())
            }
        }
        Command::Related(args) => run_related(&store.repository, args).await,
        Command::Serve(_) => run_serve(&settings, store).await,
    }
}

/// The shared corpus cache and the repository reading through it.
struct ContentStore {
    cache: Arc<TtlCache<String, Corpus>>,
    repository: PostRepository,
    cache_config: CacheConfig,
}

impl ContentStore {
    fn build(settings: &Settings) -> Self {
        let cache_config = CacheConfig::from(&settings.cache);
        let cache = Arc::new(TtlCache::new());
        let source = Arc::new(FsContentSource::from(&settings.content));
        let repository = PostRepository::new(source, Arc::clone(&cache), cache_config.corpus_ttl);
        Self {
            cache,
            repository,
            cache_config,
        }
    }
}

async fn run_list(repository: &PostRepository, args: ListArgs) -> Result<(), AppError> {
    let corpus = repository.load_all().await?;
    let mut selected: Vec<&Post> = if args.all {
        corpus.iter().collect()
    } else {
        posts::published_only(corpus.iter())
    };
    if let Some(tag) = args.tag.as_deref() {
        selected = posts::by_tag(selected, tag);
    }
    if let Some(limit) = args.limit {
        selected = posts::latest(selected, limit);
    }
    print_posts(&selected, args.output.json)
}

async fn run_show(repository: &PostRepository, args: ShowArgs) -> Result<(), AppError> {
    let post = repository
        .get_by_slug(&args.slug)
        .await?
        .ok_or_else(|| AppError::not_found("post", args.slug.as_str()))?;

    if args.output.json {
        return print_json(&post);
    }

    println!("{}", post.title);
    println!(
        "{} · {} · {} min read · {}",
        format_date(&post)?,
        post.author,
        post.read_time_minutes,
        post.status
    );
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(", "));
    }
    println!();
    println!("{}", posts::strip_markup(&post.body_html).trim());
    Ok(())
}

async fn run_search(repository: &PostRepository, args: SearchArgs) -> Result<(), AppError> {
    let corpus = repository.load_all().await?;
    let found = posts::search(posts::published_only(corpus.iter()), &args.query);
    debug!(query = %args.query, matches = found.len(), "search finished");
    print_posts(&found, args.output.json)
}

async fn run_related(repository: &PostRepository, args: RelatedArgs) -> Result<(), AppError> {
    let corpus = repository.load_all().await?;
    let target = corpus
        .iter()
        .find(|post| post.slug == args.slug)
        .ok_or_else(|| AppError::not_found("post", args.slug.as_str()))?;
    let found = posts::related(posts::published_only(corpus.iter()), target, args.limit);
    print_posts(&found, args.output.json)
}

async fn run_serve(settings: &Settings, store: ContentStore) -> Result<(), AppError> {
    settings.warn_on_default_credentials();

    let sessions = Arc::new(SessionManager::new(
        &settings.admin.username,
        &settings.admin.password,
        settings.session.duration,
    ));
    let post_metrics = PostMetricsService::new();

    let cache_sweeper = spawn_sweeper(
        Arc::clone(&store.cache),
        store.cache_config.sweep_interval,
        "corpus_cache",
    );
    let session_sweeper = spawn_sweeper(
        Arc::clone(&sessions),
        settings.session.sweep_interval,
        "sessions",
    );

    let corpus = store.repository.load_all().await?;
    info!(
        directory = %settings.content.directory.display(),
        posts = corpus.len(),
        "content store ready; press Ctrl-C to stop"
    );

    let mut refresh = tokio::time::interval(store.cache_config.corpus_ttl);
    refresh.tick().await; // Skip the first immediate tick
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            signal = &mut shutdown => {
                break signal.map_err(|err| AppError::from(InfraError::from(err)));
            }
            _ = refresh.tick() => match store.repository.reload().await {
                Ok(corpus) => {
                    let stats = DashboardStats::collect(
                        &corpus,
                        &post_metrics,
                        DASHBOARD_POPULAR_LIMIT,
                        DASHBOARD_RECENT_LIMIT,
                    );
                    info!(
                        total = stats.total_posts,
                        published = stats.published_posts,
                        drafts = stats.draft_posts,
                        archived = stats.archived_posts,
                        sessions = sessions.active_sessions(),
                        "content store refreshed"
                    );
                }
                Err(err) => warn!(error = %err, "corpus refresh failed; keeping previous state"),
            },
        }
    };

    info!("shutting down");
    cache_sweeper.abort();
    let _ = cache_sweeper.await;
    session_sweeper.abort();
    let _ = session_sweeper.await;

    result
}

fn print_posts(posts: &[&Post], json: bool) -> Result<(), AppError> {
    if json {
        return print_json(posts);
    }

    for post in posts {
        let tags = if post.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", post.tags.join(", "))
        };
        println!("{}  {:<32}  {}{}", format_date(post)?, post.slug, post.title, tags);
    }
    Ok(())
}

fn print_json<T>(value: &T) -> Result<(), AppError>
where
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{text}");
    Ok(())
}

fn format_date(post: &Post) -> Result<String, AppError> {
    post.date
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::unexpected(format!("failed to format date: {err}")))
}
