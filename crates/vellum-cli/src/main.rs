//! Vellum CLI - operational surface for scheduled publishing and sync
//!
//! Create articles and publish tasks from the terminal, inspect the sync
//! queue, resolve conflicts, and run the background loops.

use std::collections::HashMap;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};
use serde::Serialize;
use thiserror::Error;
use vellum_core::config::{SchedulerConfig, SyncQueueConfig};
use vellum_core::credentials::CachedCredentialStore;
use vellum_core::models::{now_ms, PlatformConfig, PlatformSession, SourceType, TaskStatus};
use vellum_core::notify::LogNotifier;
use vellum_core::publish::HttpPublisher;
use vellum_core::scheduler::Scheduler;
use vellum_core::services::DatabaseService;
use vellum_core::sync::{ConflictResolution, HttpRemote, LogObserver, SyncQueue};
use vellum_core::{Article, ArticleId, Platform, ScheduledTask, TaskId, UserId};

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Schedule article publishing and sync local edits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage local articles
    Article {
        #[command(subcommand)]
        command: ArticleCommands,
    },
    /// Manage scheduled publish tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Inspect and drive the offline sync queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Resolve a sync conflict
    Conflict {
        #[command(subcommand)]
        command: ConflictCommands,
    },
    /// Record a platform session expiry for the credential cache
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Run the scheduler and sync loops until interrupted
    Run,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ArticleCommands {
    /// Create a new draft
    #[command(alias = "new")]
    Add {
        /// Article title
        title: String,
        /// Article body
        #[arg(long, default_value = "")]
        content: String,
    },
    /// List recent articles
    List {
        /// Number of articles to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one article
    Show {
        /// Article ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Schedule a publish task
    #[command(alias = "new")]
    Add {
        /// Article ID or unique ID prefix
        article: String,
        /// Target platform
        #[arg(long, value_enum)]
        platform: PlatformArg,
        /// When to publish (RFC 3339 or unix milliseconds)
        #[arg(long)]
        at: String,
        /// Tags (topics on Zhihu); repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Category (Juejin)
        #[arg(long, default_value = "")]
        category: String,
        /// Summary (Juejin)
        #[arg(long, default_value = "")]
        summary: String,
        /// Column to publish into (Zhihu)
        #[arg(long)]
        column: Option<String>,
        /// Canonical URL of the original (Medium; implies reprint)
        #[arg(long)]
        canonical_url: Option<String>,
        /// Mark as a reprint (Juejin)
        #[arg(long)]
        reprint: bool,
    },
    /// List recent tasks
    List {
        /// Number of tasks to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task
    Show {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Cancel a pending task
    Cancel {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Move a pending task to a new time
    Reschedule {
        /// Task ID or unique ID prefix
        id: String,
        /// New publish time (RFC 3339 or unix milliseconds)
        #[arg(long)]
        at: String,
    },
    /// Delete all finished tasks
    ClearHistory,
}

#[derive(Subcommand)]
enum QueueCommands {
    /// List queued local mutations
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Force a drain of eligible queue items now
    Drain,
}

#[derive(Subcommand)]
enum ConflictCommands {
    /// Settle a conflict by keeping one side
    Resolve {
        /// Article ID or unique ID prefix
        article: String,
        /// Which side to keep
        #[arg(long, value_enum)]
        keep: KeepSide,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Store the session expiry for a platform
    Set {
        /// Target platform
        #[arg(long, value_enum)]
        platform: PlatformArg,
        /// Session expiry (RFC 3339 or unix milliseconds)
        #[arg(long)]
        expires_at: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] vellum_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid time '{0}'; use RFC 3339 (2026-09-01T18:30:00+08:00) or unix milliseconds")]
    InvalidTime(String),
    #[error("Article not found for id/prefix: {0}")]
    ArticleNotFound(String),
    #[error("Task not found for id/prefix: {0}")]
    TaskNotFound(String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error(
        "No publish endpoints configured. Set VELLUM_PUBLISH_ENDPOINT_JUEJIN, \
         VELLUM_PUBLISH_ENDPOINT_ZHIHU and/or VELLUM_PUBLISH_ENDPOINT_MEDIUM."
    )]
    PublishNotConfigured,
    #[error("Sync is not configured. Set VELLUM_SYNC_ENDPOINT to enable this command.")]
    SyncNotConfigured,
    #[error("{0}")]
    Publish(String),
    #[error("{0}")]
    Remote(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum PlatformArg {
    Juejin,
    Zhihu,
    Medium,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Juejin => Self::Juejin,
            PlatformArg::Zhihu => Self::Zhihu,
            PlatformArg::Medium => Self::Medium,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum KeepSide {
    Local,
    Remote,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vellum=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let db = DatabaseService::open_path(&db_path)?;

    match cli.command {
        Commands::Article { command } => run_article(command, &db).await,
        Commands::Task { command } => run_task(command, &db).await,
        Commands::Queue { command } => run_queue(command, &db).await,
        Commands::Conflict { command } => run_conflict(command, &db).await,
        Commands::Session { command } => run_session(command, &db).await,
        Commands::Run => run_loops(&db).await,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}

// --- article ---

async fn run_article(command: ArticleCommands, db: &DatabaseService) -> Result<(), CliError> {
    match command {
        ArticleCommands::Add { title, content } => {
            let article = Article::new(default_user(), title, content);
            db.insert_article(&article).await?;
            println!("{}", article.id);
            Ok(())
        }
        ArticleCommands::List { limit, json } => {
            let articles = db.list_articles(limit, 0).await?;
            if json {
                let items: Vec<ArticleListItem> =
                    articles.iter().map(article_to_list_item).collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for line in format_article_lines(&articles) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        ArticleCommands::Show { id } => {
            let article = resolve_article(db, &id).await?;
            println!("{}", serde_json::to_string_pretty(&article)?);
            Ok(())
        }
    }
}

// --- task ---

async fn run_task(command: TaskCommands, db: &DatabaseService) -> Result<(), CliError> {
    let scheduler = local_scheduler(db);

    match command {
        TaskCommands::Add {
            article,
            platform,
            at,
            tags,
            category,
            summary,
            column,
            canonical_url,
            reprint,
        } => {
            let article = resolve_article(db, &article).await?;
            let config = build_platform_config(
                platform, tags, category, summary, column, canonical_url, reprint,
            );
            let scheduled_at = parse_time(&at)?;
            let task = scheduler.create_task(&article.id, config, scheduled_at).await?;
            println!("{}", task.id);
            Ok(())
        }
        TaskCommands::List { limit, json } => {
            let tasks = scheduler.list_tasks(limit).await?;
            if json {
                let items: Vec<TaskListItem> = tasks.iter().map(task_to_list_item).collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for line in format_task_lines(&tasks) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        TaskCommands::Show { id } => {
            let task = resolve_task(db, &id).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
            Ok(())
        }
        TaskCommands::Cancel { id } => {
            let task = resolve_task(db, &id).await?;
            let cancelled = scheduler.cancel_task(&task.id).await?;
            println!("{}", cancelled.id);
            Ok(())
        }
        TaskCommands::Reschedule { id, at } => {
            let task = resolve_task(db, &id).await?;
            let scheduled_at = parse_time(&at)?;
            let updated = scheduler
                .update_task(&task.id, Some(scheduled_at), None)
                .await?;
            println!("{} -> {}", updated.id, format_time(updated.scheduled_at));
            Ok(())
        }
        TaskCommands::ClearHistory => {
            let removed = scheduler.clear_history().await?;
            println!("Removed {removed} finished task(s)");
            Ok(())
        }
    }
}

// --- queue / conflict ---

async fn run_queue(command: QueueCommands, db: &DatabaseService) -> Result<(), CliError> {
    match command {
        QueueCommands::List { json } => {
            let items = db.list_queue_items().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("Queue is empty");
            } else {
                for item in items {
                    let error = item
                        .last_error
                        .map_or_else(String::new, |e| format!("  last error: {e}"));
                    println!(
                        "{:<13} {:<7} retries: {}  next: {}{}",
                        short_id(&item.entity_client_id),
                        item.action.as_str(),
                        item.retry_count,
                        format_time(item.next_attempt_at),
                        error
                    );
                }
            }
            Ok(())
        }
        QueueCommands::Drain => {
            let queue = sync_queue(db)?;
            let synced = queue.drain(now_ms()).await?;
            println!("Synced {synced} item(s)");
            Ok(())
        }
    }
}

async fn run_conflict(command: ConflictCommands, db: &DatabaseService) -> Result<(), CliError> {
    match command {
        ConflictCommands::Resolve { article, keep } => {
            let article = resolve_article(db, &article).await?;
            let resolution = match keep {
                KeepSide::Local => ConflictResolution::KeepLocal,
                KeepSide::Remote => ConflictResolution::KeepRemote,
            };
            let queue = sync_queue(db)?;
            let resolved = queue.resolve_conflict(&article.id, resolution).await?;
            println!("{} kept {:?}", resolved.id, keep);
            Ok(())
        }
    }
}

async fn run_session(command: SessionCommands, db: &DatabaseService) -> Result<(), CliError> {
    match command {
        SessionCommands::Set {
            platform,
            expires_at,
        } => {
            let expires_at = parse_time(&expires_at)?;
            let session = PlatformSession {
                user_id: default_user(),
                platform: platform.into(),
                expires_at,
                updated_at: now_ms(),
            };
            db.upsert_session(&session).await?;
            println!(
                "Session for {} valid until {}",
                session.platform,
                format_time(expires_at)
            );
            Ok(())
        }
    }
}

// --- run ---

async fn run_loops(db: &DatabaseService) -> Result<(), CliError> {
    let endpoints = publish_endpoints_from_env();
    if endpoints.is_empty() {
        return Err(CliError::PublishNotConfigured);
    }
    let publisher =
        HttpPublisher::new(endpoints).map_err(|e| CliError::Publish(e.to_string()))?;

    let scheduler = Scheduler::new(
        db.clone(),
        Arc::new(publisher),
        Arc::new(LogNotifier),
        Arc::new(CachedCredentialStore::new(db.clone())),
        SchedulerConfig::default(),
    );
    let scheduler_handle = scheduler.start();

    let queue_handle = match sync_queue(db) {
        Ok(queue) => Some(queue.start()),
        Err(CliError::SyncNotConfigured) => {
            tracing::info!("VELLUM_SYNC_ENDPOINT not set; sync loop disabled");
            None
        }
        Err(e) => return Err(e),
    };

    println!("Running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    scheduler_handle.stop();
    if let Some(handle) = queue_handle {
        handle.stop();
    }
    Ok(())
}

fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let mut command = Cli::command();
    let mut buffer = Vec::new();

    match shell {
        CompletionShell::Bash => generate_for_shell(shells::Bash, &mut command, &mut buffer),
        CompletionShell::Zsh => generate_for_shell(shells::Zsh, &mut command, &mut buffer),
        CompletionShell::Fish => generate_for_shell(shells::Fish, &mut command, &mut buffer),
    }

    if let Some(path) = output_path {
        std::fs::write(path, &buffer)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(&buffer)?;
    }

    Ok(())
}

fn generate_for_shell<G: Generator>(
    generator: G,
    command: &mut clap::Command,
    buffer: &mut Vec<u8>,
) {
    generate(generator, command, "vellum", buffer);
}

// --- wiring helpers ---

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = env::var("VELLUM_DB_PATH") {
        return PathBuf::from(path);
    }
    dirs::data_dir().map_or_else(
        || PathBuf::from("vellum.db"),
        |dir| dir.join("vellum").join("vellum.db"),
    )
}

fn default_user() -> UserId {
    env::var("VELLUM_USER")
        .map_or_else(|_| UserId::from("local"), UserId::from)
}

fn publish_endpoints_from_env() -> HashMap<Platform, String> {
    let mut endpoints = HashMap::new();
    for platform in Platform::all() {
        let key = format!(
            "VELLUM_PUBLISH_ENDPOINT_{}",
            platform.as_str().to_uppercase()
        );
        if let Ok(endpoint) = env::var(key) {
            endpoints.insert(platform, endpoint);
        }
    }
    endpoints
}

fn local_scheduler(db: &DatabaseService) -> Scheduler {
    // Local task management does not need publish endpoints; execution only
    // happens under `vellum run`.
    Scheduler::new(
        db.clone(),
        Arc::new(NoopPublisher),
        Arc::new(LogNotifier),
        Arc::new(CachedCredentialStore::new(db.clone())),
        SchedulerConfig::default(),
    )
}

struct NoopPublisher;

#[async_trait::async_trait]
impl vellum_core::publish::Publisher for NoopPublisher {
    async fn publish(
        &self,
        _article: &Article,
        _config: &PlatformConfig,
    ) -> Result<vellum_core::publish::PublishReceipt, vellum_core::publish::PublishError> {
        Err(vellum_core::publish::PublishError::permanent(
            "publishing requires `vellum run` with endpoints configured",
        ))
    }
}

fn sync_queue(db: &DatabaseService) -> Result<SyncQueue, CliError> {
    let endpoint = env::var("VELLUM_SYNC_ENDPOINT").map_err(|_| CliError::SyncNotConfigured)?;
    let remote = HttpRemote::new(endpoint).map_err(|e| CliError::Remote(e.to_string()))?;
    Ok(SyncQueue::new(
        db.clone(),
        Arc::new(remote),
        Arc::new(LogObserver),
        SyncQueueConfig::default(),
    ))
}

fn build_platform_config(
    platform: PlatformArg,
    tags: Vec<String>,
    category: String,
    summary: String,
    column: Option<String>,
    canonical_url: Option<String>,
    reprint: bool,
) -> PlatformConfig {
    match platform {
        PlatformArg::Juejin => PlatformConfig::Juejin {
            tags,
            category,
            summary,
            source_type: if reprint {
                SourceType::Reprint
            } else {
                SourceType::Original
            },
        },
        PlatformArg::Zhihu => PlatformConfig::Zhihu {
            topics: tags,
            column,
        },
        PlatformArg::Medium => PlatformConfig::Medium {
            tags,
            canonical_url,
        },
    }
}

// --- id resolution ---

async fn resolve_article(db: &DatabaseService, query: &str) -> Result<Article, CliError> {
    if let Ok(id) = ArticleId::from_str(query) {
        if let Some(article) = db.get_article(&id).await? {
            return Ok(article);
        }
    }

    let candidates: Vec<Article> = db
        .list_articles(500, 0)
        .await?
        .into_iter()
        .filter(|a| a.id.as_str().starts_with(query))
        .collect();
    match candidates.len() {
        0 => Err(CliError::ArticleNotFound(query.to_string())),
        1 => Ok(candidates.into_iter().next().ok_or_else(|| {
            CliError::ArticleNotFound(query.to_string())
        })?),
        _ => Err(CliError::AmbiguousId(ambiguous_message(
            query,
            candidates.iter().map(|a| a.id.as_str()),
        ))),
    }
}

async fn resolve_task(db: &DatabaseService, query: &str) -> Result<ScheduledTask, CliError> {
    if let Ok(id) = TaskId::from_str(query) {
        if let Some(task) = db.get_task(&id).await? {
            return Ok(task);
        }
    }

    let candidates: Vec<ScheduledTask> = db
        .list_tasks(500)
        .await?
        .into_iter()
        .filter(|t| t.id.as_str().starts_with(query))
        .collect();
    match candidates.len() {
        0 => Err(CliError::TaskNotFound(query.to_string())),
        1 => Ok(candidates.into_iter().next().ok_or_else(|| {
            CliError::TaskNotFound(query.to_string())
        })?),
        _ => Err(CliError::AmbiguousId(ambiguous_message(
            query,
            candidates.iter().map(|t| t.id.as_str()),
        ))),
    }
}

fn ambiguous_message(query: &str, matches: impl Iterator<Item = String>) -> String {
    let options = matches
        .take(3)
        .map(|id| short_id(&id))
        .collect::<Vec<_>>()
        .join(", ");
    format!("ID prefix '{query}' is ambiguous; matches: {options}")
}

// --- formatting ---

#[derive(Debug, Serialize)]
struct ArticleListItem {
    id: String,
    title: String,
    publish_state: String,
    sync_status: String,
    has_conflict: bool,
    updated: String,
}

#[derive(Debug, Serialize)]
struct TaskListItem {
    id: String,
    article_id: String,
    platform: String,
    status: String,
    scheduled_at: String,
    retry_count: u32,
    result_url: Option<String>,
    error_message: Option<String>,
}

fn article_to_list_item(article: &Article) -> ArticleListItem {
    ArticleListItem {
        id: article.id.as_str(),
        title: article.title.clone(),
        publish_state: article.publish_state.as_str().to_string(),
        sync_status: article.sync_status.as_str().to_string(),
        has_conflict: article.has_conflict,
        updated: format_relative_time(article.local_updated_at, now_ms()),
    }
}

fn task_to_list_item(task: &ScheduledTask) -> TaskListItem {
    TaskListItem {
        id: task.id.as_str(),
        article_id: task.article_id.as_str(),
        platform: task.platform.as_str().to_string(),
        status: task.status.as_str().to_string(),
        scheduled_at: format_time(task.scheduled_at),
        retry_count: task.retry_count,
        result_url: task.result_url.clone(),
        error_message: task.error_message.clone(),
    }
}

fn format_article_lines(articles: &[Article]) -> Vec<String> {
    let now = now_ms();
    articles
        .iter()
        .map(|article| {
            let conflict = if article.has_conflict { "  CONFLICT" } else { "" };
            format!(
                "{:<13}  {:<40}  {:<9}  {:<8}  {}{}",
                short_id(&article.id.as_str()),
                preview(&article.title, 40),
                article.publish_state.as_str(),
                article.sync_status.as_str(),
                format_relative_time(article.local_updated_at, now),
                conflict
            )
        })
        .collect()
}

fn format_task_lines(tasks: &[ScheduledTask]) -> Vec<String> {
    tasks
        .iter()
        .map(|task| {
            let detail = match task.status {
                TaskStatus::Success => task.result_url.clone().unwrap_or_default(),
                TaskStatus::Failed => task.error_message.clone().unwrap_or_default(),
                _ => String::new(),
            };
            format!(
                "{:<13}  {:<7}  {:<9}  {:<16}  {}",
                short_id(&task.id.as_str()),
                task.platform.as_str(),
                task.status.as_str(),
                format_time(task.scheduled_at),
                detail
            )
        })
        .collect()
}

fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn format_time(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn format_relative_time(timestamp_ms: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Accepts RFC 3339 or raw unix milliseconds
fn parse_time(input: &str) -> Result<i64, CliError> {
    let trimmed = input.trim();
    if let Ok(ms) = trimmed.parse::<i64>() {
        return Ok(ms);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| CliError::InvalidTime(input.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_time_accepts_unix_millis() {
        assert_eq!(parse_time("1700000000000").unwrap(), 1_700_000_000_000);
        assert_eq!(parse_time(" 42 ").unwrap(), 42);
    }

    #[test]
    fn parse_time_accepts_rfc3339() {
        assert_eq!(
            parse_time("2023-11-14T22:13:20Z").unwrap(),
            1_700_000_000_000
        );
        // Offset forms resolve to the same instant
        assert_eq!(
            parse_time("2023-11-15T06:13:20+08:00").unwrap(),
            1_700_000_000_000
        );
    }

    #[test]
    fn parse_time_rejects_garbage() {
        assert!(matches!(
            parse_time("next tuesday"),
            Err(CliError::InvalidTime(_))
        ));
    }

    #[test]
    fn preview_collapses_and_truncates() {
        assert_eq!(preview("line one\nline two", 40), "line one");
        assert_eq!(preview("many   spaced    words", 40), "many spaced words");
        assert_eq!(preview("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn relative_time_buckets() {
        assert_eq!(format_relative_time(1_000, 30_000), "just now");
        assert_eq!(format_relative_time(0, 5 * 60_000), "5m ago");
        assert_eq!(format_relative_time(0, 3 * 3_600_000), "3h ago");
        assert_eq!(format_relative_time(0, 2 * 86_400_000), "2d ago");
    }

    #[test]
    fn format_time_renders_utc() {
        assert_eq!(format_time(1_700_000_000_000), "2023-11-14 22:13");
    }

    #[test]
    fn publish_config_maps_flags_per_platform() {
        let config = build_platform_config(
            PlatformArg::Medium,
            vec!["rust".into()],
            String::new(),
            String::new(),
            None,
            Some("https://blog.example.com/post".into()),
            false,
        );
        assert_eq!(config.platform(), Platform::Medium);
        assert_eq!(config.source_type(), Some(SourceType::Reprint));

        let config = build_platform_config(
            PlatformArg::Zhihu,
            vec!["rust".into()],
            String::new(),
            String::new(),
            Some("my-column".into()),
            None,
            false,
        );
        assert_eq!(config.platform(), Platform::Zhihu);
        assert_eq!(config.tags(), &["rust".to_string()]);
    }
}
