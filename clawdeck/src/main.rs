//! clawdeck - AI agent activity dashboard
//!
//! Command-line views over an agent's session transcripts and explicit
//! activity log: the merged feed, session summaries, the cross-session
//! inbox, cost analytics and the weekly rhythm. The gateway subcommands
//! talk to the running agent itself.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Store: $XDG_DATA_HOME/clawdeck/activities.json (~/.local/share/clawdeck/)
//! - Logs: $XDG_STATE_HOME/clawdeck/clawdeck.log (~/.local/state/clawdeck/)
//! - Config: $XDG_CONFIG_HOME/clawdeck/config.toml (~/.config/clawdeck/config.toml)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clawdeck_core::analytics::{cost, rhythm};
use clawdeck_core::config::StoreBackend;
use clawdeck_core::transcript::session;
use clawdeck_core::types::{ActivityType, FeedQuery, NewActivity, SinceSpec};
use clawdeck_core::{ActivityFeed, ActivityStore, Config, GatewayClient, JsonStore, SqliteStore};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "clawdeck")]
#[command(about = "AI agent activity dashboard")]
#[command(version)]
struct Cli {
    /// Config file path (defaults to the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merged activity feed (explicit log + transcript-derived)
    Feed {
        /// Keep only this activity type (e.g. file_write, build)
        #[arg(short = 't', long = "type")]
        activity_type: Option<String>,

        /// Lower time bound: "7d", "12h", "30m" or epoch milliseconds
        #[arg(long)]
        since: Option<String>,

        /// Case-insensitive text match against title and description
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Keep polling and print new entries as they appear
        #[arg(short, long)]
        watch: bool,
    },

    /// List reconstructed sessions, or show one session's messages
    Sessions {
        /// Session id (prefix is enough) to show messages for
        id: Option<String>,
    },

    /// Recent conversation messages across all sessions
    Inbox {
        /// Maximum messages
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Cost report: today, this week, all time, daily buckets, top sessions
    Cost,

    /// Weekly activity rhythm and streak
    Rhythm,

    /// Log an explicit activity
    Log {
        /// Activity type (e.g. task_completed, document_created)
        activity_type: String,

        /// Short human-readable title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Arbitrary JSON metadata
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Send a wake message to the agent through the gateway
    Send {
        /// Message text
        message: String,
    },

    /// List the agent's scheduled cron jobs
    Crons {
        /// Trigger this job immediately instead of listing
        #[arg(long)]
        run: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard = clawdeck_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    tracing::info!("clawdeck starting");

    match cli.command {
        Command::Feed {
            activity_type,
            since,
            search,
            limit,
            watch,
        } => {
            let query = FeedQuery {
                activity_type: activity_type
                    .map(|t| ActivityType::from_str(&t).expect("ActivityType::from_str is infallible")),
                since: since.map(|s| SinceSpec::parse(&s)).transpose()?,
                text: search,
                limit: limit.or(Some(config.feed.default_limit)),
            };
            let feed = ActivityFeed::new(open_store(&config)?, config.agent.resolve_sessions_dir());
            if watch {
                anyhow::ensure!(!cli.json, "--json is not supported with --watch");
                run_feed_watch(&feed, &query, config.feed.poll_interval_secs)
            } else {
                run_feed(&feed, &query, cli.json)
            }
        }
        Command::Sessions { id } => run_sessions(&config, id.as_deref(), cli.json),
        Command::Inbox { limit } => run_inbox(&config, limit, cli.json),
        Command::Cost => run_cost(&config, cli.json),
        Command::Rhythm => run_rhythm(&config, cli.json),
        Command::Log {
            activity_type,
            title,
            description,
            metadata,
        } => run_log(&config, &activity_type, title, description, metadata, cli.json),
        Command::Send { message } => run_send(&config, &message),
        Command::Crons { run } => run_crons(&config, run.as_deref(), cli.json),
    }
}

/// Build the configured activity store backend.
fn open_store(config: &Config) -> Result<Box<dyn ActivityStore>> {
    let path = config.store.resolve_path();
    Ok(match config.store.backend {
        StoreBackend::Json => Box::new(JsonStore::new(path)),
        StoreBackend::Sqlite => {
            Box::new(SqliteStore::open(&path).context("failed to open activity store")?)
        }
    })
}

fn run_feed(feed: &ActivityFeed, query: &FeedQuery, json: bool) -> Result<()> {
    let activities = feed.query(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&activities)?);
        return Ok(());
    }

    if activities.is_empty() {
        println!("No activity.");
        return Ok(());
    }
    for a in &activities {
        println!(
            "{}  {:<16}  {}",
            fmt_time(a.creation_time),
            a.activity_type.as_str(),
            a.title
        );
    }
    Ok(())
}

/// Poll the feed and print entries newer than anything already shown.
fn run_feed_watch(feed: &ActivityFeed, query: &FeedQuery, poll_secs: u64) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    println!(
        "Watching feed (poll every {}s). Press Ctrl+C to stop.",
        poll_secs
    );

    let mut newest_seen = 0i64;

    while running.load(Ordering::SeqCst) {
        let activities = feed.query(query)?;

        // Oldest first within a poll so output stays chronological
        for a in activities.iter().rev() {
            if a.creation_time <= newest_seen {
                continue;
            }
            println!(
                "{}  {:<16}  {}",
                fmt_time(a.creation_time),
                a.activity_type.as_str(),
                a.title
            );
        }
        if let Some(newest) = activities.first() {
            newest_seen = newest_seen.max(newest.creation_time);
        }

        for _ in 0..poll_secs * 10 {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }
    Ok(())
}

fn run_sessions(config: &Config, id: Option<&str>, json: bool) -> Result<()> {
    let dir = config.agent.resolve_sessions_dir();

    if let Some(id) = id {
        let messages = session::session_messages(&dir, id)
            .with_context(|| format!("no session matching {:?}", id))?;
        if json {
            println!("{}", serde_json::to_string_pretty(&messages)?);
            return Ok(());
        }
        for m in &messages {
            let when = m.timestamp.map(fmt_time).unwrap_or_else(|| "-".to_string());
            println!("[{}] {}: {}", when, m.role, m.text);
        }
        return Ok(());
    }

    let sessions = session::list_sessions(&dir);
    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    if sessions.is_empty() {
        println!("No sessions found in {}", dir.display());
        return Ok(());
    }
    for s in &sessions {
        let last = s
            .last_active_at
            .map(fmt_time)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {:>3} msgs  ${:.4}  {}",
            short_id(&s.id),
            last,
            s.message_count,
            s.total_cost,
            s.preview
        );
    }
    Ok(())
}

fn run_inbox(config: &Config, limit: usize, json: bool) -> Result<()> {
    let dir = config.agent.resolve_sessions_dir();
    let inbox = session::inbox(&dir, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&inbox)?);
        return Ok(());
    }
    for m in &inbox.messages {
        println!(
            "[{}] ({}) {}: {}",
            fmt_time(m.timestamp),
            m.channel,
            m.role,
            m.text
        );
    }
    Ok(())
}

fn run_cost(config: &Config, json: bool) -> Result<()> {
    let dir = config.agent.resolve_sessions_dir();
    let report = cost::cost_report_now(&dir);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Today:     ${:.4}  ({} sessions)",
        report.today.total, report.today.session_count
    );
    println!(
        "This week: ${:.4}  ({} sessions)",
        report.this_week.total, report.this_week.session_count
    );
    println!(
        "All time:  ${:.4}  ({} sessions)",
        report.all_time.total, report.all_time.session_count
    );

    println!("\nLast {} days:", report.by_day.len());
    for bucket in &report.by_day {
        println!(
            "  {}  ${:.4}  ({} sessions)",
            bucket.date, bucket.total, bucket.session_count
        );
    }

    if !report.top_sessions.is_empty() {
        println!("\nTop sessions:");
        for s in &report.top_sessions {
            println!("  ${:.4}  {}  {}", s.cost, short_id(&s.id), s.preview);
        }
    }
    Ok(())
}

fn run_rhythm(config: &Config, json: bool) -> Result<()> {
    // The rhythm reads the explicit timeline only; transcript-derived
    // entries would double count every polled tool call.
    let store = open_store(config)?;
    let timeline = store.list(None)?;
    let r = rhythm::rhythm_now(&timeline);

    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
        return Ok(());
    }

    for d in &r.week_days {
        let marker = if d.has_activity { "#" } else { "." };
        println!("  {} {}  {} {:>3}", d.day, d.date, marker, d.count);
    }
    println!("\nStreak: {} day(s)", r.streak);
    println!("Activities in the last 7 days: {}", r.activity_count_this_week);
    Ok(())
}

fn run_log(
    config: &Config,
    activity_type: &str,
    title: String,
    description: Option<String>,
    metadata: Option<String>,
    json: bool,
) -> Result<()> {
    let metadata = metadata
        .map(|m| serde_json::from_str(&m))
        .transpose()
        .context("metadata must be valid JSON")?;

    let store = open_store(config)?;
    let activity = store.add(NewActivity {
        activity_type: ActivityType::from_str(activity_type)
            .expect("ActivityType::from_str is infallible"),
        title,
        description,
        metadata,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&activity)?);
    } else {
        println!("Logged {} ({})", activity.id, activity.activity_type.as_str());
    }
    Ok(())
}

fn run_send(config: &Config, message: &str) -> Result<()> {
    anyhow::ensure!(
        config.gateway.is_ready(),
        "gateway is not configured; set [gateway] enabled and token in config.toml"
    );
    let client = GatewayClient::new(config.gateway.clone())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    runtime
        .block_on(client.send_wake(message))
        .context("failed to send wake message")?;
    println!("Sent.");
    Ok(())
}

fn run_crons(config: &Config, run_job: Option<&str>, json: bool) -> Result<()> {
    anyhow::ensure!(
        config.gateway.is_ready(),
        "gateway is not configured; set [gateway] enabled and token in config.toml"
    );
    let client = GatewayClient::new(config.gateway.clone())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    if let Some(job_id) = run_job {
        runtime
            .block_on(client.run_cron_job(job_id))
            .with_context(|| format!("failed to run job {:?}", job_id))?;
        println!("Triggered {}", job_id);
        return Ok(());
    }

    let jobs = runtime
        .block_on(client.list_cron_jobs())
        .context("failed to list cron jobs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }
    if jobs.is_empty() {
        println!("No scheduled jobs.");
        return Ok(());
    }
    for job in &jobs {
        let state = if job.enabled { "on " } else { "off" };
        let next = job
            .next_run
            .map(fmt_time)
            .unwrap_or_else(|| "-".to_string());
        println!("[{}] {}  next {}  {}", state, job.name, next, job.schedule);
    }
    Ok(())
}

/// Abbreviate a session id for display.
///
/// Ids are transcript file stems, so they can contain multibyte characters;
/// truncate by characters, never by bytes.
fn short_id(id: &str) -> String {
    id.chars().take(12).collect()
}

fn fmt_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates_by_characters() {
        assert_eq!(short_id("a1b2c3d4e5f6extra"), "a1b2c3d4e5f6");
        assert_eq!(short_id("short"), "short");
        // a two-byte character straddles the 12-byte mark
        assert_eq!(short_id("aaaaaaaaaaaéxyz"), "aaaaaaaaaaaé");
    }
}
