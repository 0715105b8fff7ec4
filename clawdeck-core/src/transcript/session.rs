//! Session reconstruction from transcript records
//!
//! Given one transcript's records, produces zero or one [`Session`] plus its
//! ordered message list. Counts are computed over raw qualifying traffic;
//! previews and the inbox feed go through an additional presentation filter.
//! That asymmetry is intentional: totals reflect what happened, previews
//! reflect what a human should read.

use crate::transcript::reader::{self, SessionFile};
use crate::transcript::record::RawRecord;
use crate::types::{Inbox, InboxMessage, Session, SessionMessage};
use std::path::Path;

/// Metadata preamble that agents prepend to relayed user messages.
const METADATA_PREAMBLE: &str = "Conversation info (untrusted metadata):\n```json\n";

/// Channel assumed when neither line nor session record names one.
const DEFAULT_CHANNEL: &str = "telegram";

const WEEKDAY_PREFIXES: &[&str] = &["[Mon", "[Tue", "[Wed", "[Thu", "[Fri", "[Sat", "[Sun"];

/// Strip the recognizable fenced metadata preamble from a message, if present.
///
/// Returns the text after the closing fence with leading newlines removed;
/// returns the input unchanged when the preamble (or its closing fence) is
/// absent.
pub fn strip_metadata_preamble(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(METADATA_PREAMBLE) else {
        return text;
    };
    let Some(end) = rest.find("```") else {
        return text;
    };
    rest[end + 3..].trim_start_matches('\n')
}

/// Presentation filter: true for messages the inbox and preview feeds hide.
///
/// Covers heartbeat sentinels, tool-result echoes, metadata-only stubs,
/// cron-wake notifications (leading bracketed weekday), and
/// internal-instruction echoes. Raw counts are unaffected by this filter.
pub fn is_presentation_noise(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < 3 {
        return true;
    }
    if trimmed.starts_with("Read HEARTBEAT") {
        return true;
    }
    if trimmed.contains("tool result for") || trimmed.contains("Tool result:") {
        return true;
    }
    if trimmed.starts_with("Conversation info (untrusted metadata)") {
        return true;
    }
    if WEEKDAY_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return true;
    }
    if trimmed.contains("Summarize this naturally for the user") {
        return true;
    }
    false
}

fn is_qualifying_role(role: &str) -> bool {
    role == "user" || role == "assistant"
}

/// Collapse newlines, truncate to `max` chars, trim.
fn to_preview_text(text: &str, max: usize) -> String {
    let truncated: String = text.chars().take(max).collect();
    truncated.replace('\n', " ").trim().to_string()
}

/// Extract the session preview from qualifying messages.
///
/// Scans user messages in order, stripping the metadata preamble and
/// accepting the first remainder that survives the presentation filter with
/// at least 5 chars; falls back to assistant messages; else empty.
fn extract_preview(records: &[&RawRecord]) -> String {
    for role in ["user", "assistant"] {
        for record in records {
            let Some(msg) = &record.message else { continue };
            if msg.role.as_deref() != Some(role) {
                continue;
            }
            let text = msg.text();
            let stripped = strip_metadata_preamble(&text);
            if stripped.trim().chars().count() < 5 || is_presentation_noise(stripped) {
                continue;
            }
            return to_preview_text(stripped, 120);
        }
    }
    String::new()
}

/// Sum both cost representations across all records in a file.
///
/// Top-level usage records and message-embedded usage annotations are both
/// additive; a file may carry either or both, and double counting across the
/// two representations is how the source system behaves.
fn total_cost(records: &[RawRecord]) -> f64 {
    let mut total = 0.0;
    for record in records {
        if let Some(cost) = record.usage.as_ref().and_then(|u| u.cost.as_ref()) {
            total += cost.total.unwrap_or(0.0);
        }
        if let Some(cost) = record
            .message
            .as_ref()
            .and_then(|m| m.usage.as_ref())
            .and_then(|u| u.cost.as_ref())
        {
            total += cost.total.unwrap_or(0.0);
        }
    }
    total
}

/// Reconstruct one session from its records.
///
/// Returns `None` when the file has no qualifying message records: such a
/// session does not exist in the derived model even though its file does.
pub fn reconstruct(session_id: &str, records: &[RawRecord]) -> Option<(Session, Vec<SessionMessage>)> {
    let qualifying: Vec<&RawRecord> = records
        .iter()
        .filter(|r| {
            r.is_message()
                && r.message
                    .as_ref()
                    .and_then(|m| m.role.as_deref())
                    .is_some_and(is_qualifying_role)
        })
        .collect();

    if qualifying.is_empty() {
        return None;
    }

    let timestamps: Vec<i64> = qualifying
        .iter()
        .filter_map(|r| r.message_timestamp_ms())
        .collect();
    let started_at = timestamps.iter().min().copied();
    let last_active_at = timestamps.iter().max().copied();

    let user_message_count = qualifying
        .iter()
        .filter(|r| r.message.as_ref().and_then(|m| m.role.as_deref()) == Some("user"))
        .count();
    let assistant_message_count = qualifying.len() - user_message_count;

    let messages: Vec<SessionMessage> = qualifying
        .iter()
        .filter_map(|r| {
            let msg = r.message.as_ref()?;
            let text = msg.text();
            if text.trim().is_empty() {
                return None;
            }
            Some(SessionMessage {
                role: msg.role.clone().unwrap_or_default(),
                text,
                timestamp: r.message_timestamp_ms(),
                cost: r
                    .usage
                    .as_ref()
                    .or(msg.usage.as_ref())
                    .and_then(|u| u.cost.as_ref())
                    .and_then(|c| c.total),
            })
        })
        .collect();

    let session = Session {
        id: session_id.to_string(),
        started_at,
        last_active_at,
        message_count: qualifying.len(),
        user_message_count,
        assistant_message_count,
        total_cost: total_cost(records),
        preview: extract_preview(&qualifying),
    };

    Some((session, messages))
}

/// Reconstruct every session under `dir`, newest activity first.
pub fn list_sessions(dir: &Path) -> Vec<Session> {
    let mut sessions: Vec<Session> = reader::session_files(dir)
        .iter()
        .filter_map(|file| {
            let records = reader::read_records(&file.path);
            reconstruct(&file.session_id(), &records).map(|(s, _)| s)
        })
        .collect();
    sessions.sort_by(|a, b| b.last_active_at.unwrap_or(0).cmp(&a.last_active_at.unwrap_or(0)));
    sessions
}

/// Ordered message list for one session, or `None` when no file matches.
pub fn session_messages(dir: &Path, session_id: &str) -> Option<Vec<SessionMessage>> {
    let file = reader::session_files(dir)
        .into_iter()
        .find(|f| f.session_id().contains(session_id))?;
    let records = reader::read_records(&file.path);
    reconstruct(&file.session_id(), &records).map(|(_, messages)| messages)
}

/// Cross-session recent-message feed.
///
/// Collects presentation-filtered user/assistant messages from every session,
/// strips the metadata preamble from user text, sorts chronologically
/// ascending and keeps the trailing `limit`.
pub fn inbox(dir: &Path, limit: usize) -> Inbox {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut all: Vec<InboxMessage> = Vec::new();

    for file in reader::session_files(dir) {
        let records = reader::read_records(&file.path);
        all.extend(inbox_messages(&file, &records, now_ms));
    }

    all.sort_by_key(|m| m.timestamp);
    if all.len() > limit {
        all.drain(..all.len() - limit);
    }

    let last_active_at = all.last().map(|m| m.timestamp).unwrap_or(now_ms);
    Inbox {
        messages: all,
        last_active_at,
    }
}

fn inbox_messages(file: &SessionFile, records: &[RawRecord], now_ms: i64) -> Vec<InboxMessage> {
    let session_id = file.session_id();
    let session_channel = records
        .iter()
        .find(|r| r.record_type.as_deref() == Some("session"))
        .and_then(|r| r.channel.clone())
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());

    records
        .iter()
        .filter_map(|r| {
            let msg = r.message.as_ref()?;
            let role = msg.role.as_deref()?;
            if !r.is_message() || !is_qualifying_role(role) {
                return None;
            }
            let raw = msg.text();
            let text = if role == "user" {
                strip_metadata_preamble(&raw).to_string()
            } else {
                raw
            };
            if is_presentation_noise(&text) {
                return None;
            }
            Some(InboxMessage {
                role: role.to_string(),
                text,
                timestamp: r.message_timestamp_ms().unwrap_or(now_ms),
                session_id: session_id.clone(),
                channel: r.channel.clone().unwrap_or_else(|| session_channel.clone()),
            })
        })
        .collect()
}
