//! Tool-call classifier
//!
//! Maps a raw tool invocation (name + argument mapping) into a typed
//! activity-in-progress, or discards it as noise. The classifier is
//! deliberately biased toward under-reporting: the feed is human-facing and
//! must stay legible, so uncertain or operational calls are dropped rather
//! than surfaced.
//!
//! The allow-list and deny-list are static tables; recognizing a new tool is
//! a data change, not a logic change.

use crate::types::ActivityType;

/// A classified tool call: type plus human-readable title.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub activity_type: ActivityType,
    pub title: String,
}

/// How to build a title from the call's arguments.
#[derive(Debug, Clone, Copy)]
enum TitleTemplate {
    /// "Searched: {query}" truncated to 80 chars
    SearchQuery,
    /// "Wrote: {basename(path|file_path)}"
    WroteFile,
    /// "Edited: {basename(path|file_path)}"
    EditedFile,
    /// "Read: {basename(path|file_path)}"
    ReadFile,
    /// "Memory search: {query}" truncated to 60 chars
    MemorySearch,
    /// "Memory read: {basename(path)}"
    MemoryRead,
    /// "Browser: {action}"
    BrowserAction,
    /// "Exec: {command}" truncated to 60 chars
    ExecCommand,
    /// "Cron: {action}"
    CronAction,
    /// Fixed title, arguments ignored
    Fixed(&'static str),
}

/// Allow-list mapping known tool names to (type, title template).
static TOOL_RULES: &[(&str, ActivityType, TitleTemplate)] = &[
    ("web_search", ActivityType::WebSearch, TitleTemplate::SearchQuery),
    ("write", ActivityType::FileWrite, TitleTemplate::WroteFile),
    ("edit", ActivityType::FileWrite, TitleTemplate::EditedFile),
    ("Read", ActivityType::FileRead, TitleTemplate::ReadFile),
    ("read", ActivityType::FileRead, TitleTemplate::ReadFile),
    ("message", ActivityType::MessageSent, TitleTemplate::Fixed("Sent message")),
    ("memory_search", ActivityType::MemoryUpdated, TitleTemplate::MemorySearch),
    ("memory_get", ActivityType::FileRead, TitleTemplate::MemoryRead),
    ("browser", ActivityType::ToolUse, TitleTemplate::BrowserAction),
    ("exec", ActivityType::Build, TitleTemplate::ExecCommand),
    ("sessions_spawn", ActivityType::ToolUse, TitleTemplate::Fixed("Spawned sub-agent")),
    ("sessions_list", ActivityType::ToolUse, TitleTemplate::Fixed("Listed sessions")),
    ("cron", ActivityType::ToolUse, TitleTemplate::CronAction),
    ("tts", ActivityType::ToolUse, TitleTemplate::Fixed("Text to speech")),
    ("image", ActivityType::ToolUse, TitleTemplate::Fixed("Image analysis")),
];

/// Deny-list: session-introspection and status utilities, dropped
/// unconditionally regardless of the allow-list.
static SKIP_TOOLS: &[&str] = &[
    "sessions_history",
    "process",
    "nodes",
    "gateway",
    "agents_list",
    "session_status",
];

/// Local-loopback HTTP checks; matched against the raw command, so a
/// leading space defeats the filter.
static EXEC_CURL_PREFIXES: &[&str] = &[
    "curl -s http://localhost",
    "curl -s \"http://localhost",
    "curl --",
];

/// Read-only shell utilities and package listings; matched after trimming.
static EXEC_READONLY_PREFIXES: &[&str] = &[
    "ls",
    "wc",
    "cat",
    "echo",
    "sleep",
    "chmod",
    "which",
    "brew list",
];

type Args = serde_json::Map<String, serde_json::Value>;

/// Classify a tool invocation.
///
/// Returns `None` for deny-listed tools, unknown tools, noisy shell
/// commands, and types excluded by the caller's `allowed_types` list.
pub fn classify(
    name: &str,
    arguments: Option<&Args>,
    allowed_types: Option<&[ActivityType]>,
) -> Option<Classified> {
    if SKIP_TOOLS.contains(&name) {
        return None;
    }

    let (_, activity_type, template) = TOOL_RULES.iter().find(|(n, _, _)| *n == name)?;

    if name == "exec" && is_noisy_exec(&arg_str(arguments, &["command"])) {
        return None;
    }

    let classified = Classified {
        activity_type: activity_type.clone(),
        title: render_title(*template, arguments),
    };

    // The type filter applies after classification, not instead of it.
    if let Some(allowed) = allowed_types {
        if !allowed.contains(&classified.activity_type) {
            return None;
        }
    }

    Some(classified)
}

fn is_noisy_exec(command: &str) -> bool {
    if EXEC_CURL_PREFIXES.iter().any(|p| command.starts_with(p)) {
        return true;
    }
    let trimmed = command.trim();
    EXEC_READONLY_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

fn render_title(template: TitleTemplate, args: Option<&Args>) -> String {
    match template {
        TitleTemplate::SearchQuery => {
            format!("Searched: {}", truncate_chars(&arg_str(args, &["query"]), 80))
        }
        TitleTemplate::WroteFile => {
            format!("Wrote: {}", basename(&arg_str(args, &["path", "file_path"])))
        }
        TitleTemplate::EditedFile => {
            format!("Edited: {}", basename(&arg_str(args, &["path", "file_path"])))
        }
        TitleTemplate::ReadFile => {
            format!("Read: {}", basename(&arg_str(args, &["path", "file_path"])))
        }
        TitleTemplate::MemorySearch => format!(
            "Memory search: {}",
            truncate_chars(&arg_str(args, &["query"]), 60)
        ),
        TitleTemplate::MemoryRead => {
            format!("Memory read: {}", basename(&arg_str(args, &["path"])))
        }
        TitleTemplate::BrowserAction => format!("Browser: {}", arg_str(args, &["action"])),
        TitleTemplate::ExecCommand => {
            format!("Exec: {}", truncate_chars(&arg_str(args, &["command"]), 60))
        }
        TitleTemplate::CronAction => format!("Cron: {}", arg_str(args, &["action"])),
        TitleTemplate::Fixed(title) => title.to_string(),
    }
}

/// First present, non-null argument among `keys`, rendered as a string.
fn arg_str(args: Option<&Args>, keys: &[&str]) -> String {
    let Some(args) = args else {
        return String::new();
    };
    for key in keys {
        match args.get(*key) {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(serde_json::Value::Null) | None => continue,
            Some(v) => return v.to_string(),
        }
    }
    String::new()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
