//! Core domain types for clawdeck
//!
//! These types model the two event sources the dashboard reconciles:
//!
//! | Term | Definition |
//! |------|------------|
//! | **Transcript** | Append-only JSONL file holding one agent session's conversation and tool activity |
//! | **Explicit Activity** | An activity written into the event store by an external producer (`act_` ids) |
//! | **Derived Activity** | An activity reconstructed on demand from transcript tool calls (`tc_` ids), never persisted |
//! | **Session** | The reconstructed summary of one transcript file |
//! | **Streak** | Consecutive calendar days, ending today or yesterday, with at least one explicit activity |
//!
//! The two id namespaces are disjoint by construction, which lets the feed
//! merge prefer explicit entries without a full duplicate scan.

use serde::{Deserialize, Serialize};

// ============================================
// Activity taxonomy
// ============================================

/// Kind of activity shown in the dashboard feed.
///
/// The taxonomy is open: tool classification only ever produces the named
/// variants, but explicit producers may log types we have no variant for,
/// which round-trip through [`ActivityType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    FileWrite,
    FileRead,
    WebSearch,
    MessageSent,
    MemoryUpdated,
    ToolUse,
    Build,
    TaskCompleted,
    DocumentCreated,
    CronSet,
    ConfigChanged,
    Other(String),
}

impl ActivityType {
    /// Returns the identifier used on the wire and in storage
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::FileWrite => "file_write",
            ActivityType::FileRead => "file_read",
            ActivityType::WebSearch => "web_search",
            ActivityType::MessageSent => "message_sent",
            ActivityType::MemoryUpdated => "memory_updated",
            ActivityType::ToolUse => "tool_use",
            ActivityType::Build => "build",
            ActivityType::TaskCompleted => "task_completed",
            ActivityType::DocumentCreated => "document_created",
            ActivityType::CronSet => "cron_set",
            ActivityType::ConfigChanged => "config_changed",
            ActivityType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActivityType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "file_write" => ActivityType::FileWrite,
            "file_read" => ActivityType::FileRead,
            "web_search" => ActivityType::WebSearch,
            "message_sent" => ActivityType::MessageSent,
            "memory_updated" => ActivityType::MemoryUpdated,
            "tool_use" => ActivityType::ToolUse,
            "build" => ActivityType::Build,
            "task_completed" => ActivityType::TaskCompleted,
            "document_created" => ActivityType::DocumentCreated,
            "cron_set" => ActivityType::CronSet,
            "config_changed" => ActivityType::ConfigChanged,
            other => ActivityType::Other(other.to_string()),
        })
    }
}

impl Serialize for ActivityType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().expect("ActivityType::from_str is infallible"))
    }
}

// ============================================
// Activity
// ============================================

/// One entry in the activity feed.
///
/// Explicit activities are created once via [`crate::store::ActivityStore::add`]
/// and never mutated. Derived activities are ephemeral views recomputed from
/// transcripts on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Globally unique id; `act_` prefix for explicit, `tc_` for derived
    pub id: String,
    /// Creation time in epoch milliseconds
    pub creation_time: i64,
    /// Taxonomy type
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Human-readable title
    pub title: String,
    /// Optional longer description (explicit source only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extensible metadata (explicit source only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Session the activity was derived from (derived source only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Payload for logging a new explicit activity.
///
/// The store assigns the id and creation time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

// ============================================
// Session
// ============================================

/// Reconstructed summary of one transcript file.
///
/// Counts reflect raw qualifying traffic; the preview reflects readable
/// content after presentation filtering. That asymmetry is intentional.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Session id (transcript file stem)
    pub id: String,
    /// Minimum observed message timestamp (epoch ms), if any resolved
    pub started_at: Option<i64>,
    /// Maximum observed message timestamp (epoch ms), if any resolved
    pub last_active_at: Option<i64>,
    /// Count of qualifying user + assistant messages
    pub message_count: usize,
    /// Count of qualifying user messages
    pub user_message_count: usize,
    /// Count of qualifying assistant messages
    pub assistant_message_count: usize,
    /// Summed cost across both cost representations in the file
    pub total_cost: f64,
    /// First substantive message text, truncated to 120 chars
    pub preview: String,
}

/// One displayable message from a reconstructed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMessage {
    pub role: String,
    pub text: String,
    /// Epoch milliseconds, when the record carried a timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Per-record cost, when the line carried a usage annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Cross-session recent-message view (the inbox).
#[derive(Debug, Clone, Serialize)]
pub struct Inbox {
    pub messages: Vec<InboxMessage>,
    pub last_active_at: i64,
}

/// One presentation-filtered message in the inbox.
#[derive(Debug, Clone, Serialize)]
pub struct InboxMessage {
    pub role: String,
    pub text: String,
    pub timestamp: i64,
    pub session_id: String,
    pub channel: String,
}

// ============================================
// Cost report
// ============================================

/// Cost and session count over one time window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostWindow {
    pub total: f64,
    pub session_count: usize,
}

/// Cost rolled up for one local calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct CostBucket {
    /// Local calendar day, `%Y-%m-%d`
    pub date: String,
    pub total: f64,
    pub session_count: usize,
}

/// One of the most expensive sessions.
#[derive(Debug, Clone, Serialize)]
pub struct TopSession {
    pub id: String,
    pub preview: String,
    pub cost: f64,
    pub started_at: Option<i64>,
}

/// Independent sums of the per-kind cost sub-fields.
///
/// These need not add up to the all-time total: source files populate the
/// sub-fields partially, and that is tolerated rather than reconciled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostBreakdown {
    pub input: f64,
    pub output: f64,
    pub cache_read: f64,
    pub cache_write: f64,
}

/// Full output of the cost aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    /// Window from local midnight
    pub today: CostWindow,
    /// Window from local midnight of the current week's Sunday
    pub this_week: CostWindow,
    pub all_time: CostWindow,
    /// Trailing 14 local days, oldest first, zero days included
    pub by_day: Vec<CostBucket>,
    /// Top 10 sessions by cost, costless sessions excluded
    pub top_sessions: Vec<TopSession>,
    pub breakdown: CostBreakdown,
}

// ============================================
// Rhythm
// ============================================

/// One day of the Monday-starting current week.
#[derive(Debug, Clone, Serialize)]
pub struct WeekDay {
    /// Local calendar day, `%Y-%m-%d`
    pub date: String,
    /// Short day name (Mon..Sun)
    pub day: &'static str,
    pub count: usize,
    pub has_activity: bool,
}

/// Output of the rhythm/streak calculator.
#[derive(Debug, Clone, Serialize)]
pub struct Rhythm {
    /// Monday through Sunday of the current week
    pub week_days: Vec<WeekDay>,
    /// Consecutive days with activity ending today or yesterday
    pub streak: u32,
    /// Explicit activities in the trailing 7 local days
    pub activity_count_this_week: usize,
}

// ============================================
// Feed query
// ============================================

/// Lower time bound for a feed query: relative to now, or absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinceSpec {
    /// Milliseconds before "now"
    Relative(i64),
    /// Absolute epoch milliseconds
    Absolute(i64),
}

impl SinceSpec {
    /// Parse a caller-supplied `since` value.
    ///
    /// Accepts `"<n>d"`, `"<n>h"`, `"<n>m"` for relative windows, or a bare
    /// integer treated as absolute epoch milliseconds. Anything else is a
    /// rejected request.
    pub fn parse(s: &str) -> crate::error::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(crate::error::Error::InvalidQuery(
                "since must not be empty".to_string(),
            ));
        }
        if let Ok(ms) = s.parse::<i64>() {
            return Ok(SinceSpec::Absolute(ms));
        }
        if !s.is_ascii() {
            return Err(crate::error::Error::InvalidQuery(format!(
                "unrecognized since value: {:?}",
                s
            )));
        }
        let (digits, unit) = s.split_at(s.len() - 1);
        let n: i64 = digits.parse().map_err(|_| {
            crate::error::Error::InvalidQuery(format!("unrecognized since value: {:?}", s))
        })?;
        let ms_per = match unit {
            "d" => 24 * 60 * 60 * 1000,
            "h" => 60 * 60 * 1000,
            "m" => 60 * 1000,
            _ => {
                return Err(crate::error::Error::InvalidQuery(format!(
                    "unrecognized since unit: {:?}",
                    unit
                )))
            }
        };
        Ok(SinceSpec::Relative(n * ms_per))
    }

    /// Resolve to an absolute epoch-millisecond lower bound.
    pub fn resolve(&self, now_ms: i64) -> i64 {
        match self {
            SinceSpec::Relative(ms) => now_ms - ms,
            SinceSpec::Absolute(ms) => *ms,
        }
    }
}

/// Query accepted by the activity merge/dedup engine.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    /// Keep only this activity type
    pub activity_type: Option<ActivityType>,
    /// Keep only activities at or after this time
    pub since: Option<SinceSpec>,
    /// Case-insensitive match against title and description
    pub text: Option<String>,
    /// Maximum entries to return, applied after merge and sort
    pub limit: Option<usize>,
}
