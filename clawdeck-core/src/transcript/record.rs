//! Raw transcript record types (serde deserialization)
//!
//! One JSONL line deserializes into a [`RawRecord`]. The format is external
//! and consumed bit-exact: a `type` tag with recognized values `session`,
//! `message` and `usage`, tolerating anything else. `#[serde(default)]` is
//! used liberally so a line either fully parses or is dropped by the reader;
//! no partial record ever reaches downstream components.

use chrono::DateTime;
use serde::Deserialize;

/// Represents a single line from an agent transcript.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawRecord {
    /// Record kind: "session", "message", "usage", or anything else
    #[serde(rename = "type")]
    pub record_type: Option<String>,

    /// Record id (session records)
    pub id: Option<String>,

    /// Enclosing ISO-8601 timestamp
    pub timestamp: Option<String>,

    /// Delivery channel (session records)
    pub channel: Option<String>,

    /// Message payload ("message" records)
    pub message: Option<RawMessage>,

    /// Top-level usage annotation ("usage" records)
    pub usage: Option<RawUsage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawMessage {
    pub role: Option<String>,

    /// Message's own timestamp, epoch milliseconds
    pub timestamp: Option<i64>,

    pub content: Option<RawContent>,

    /// Cost annotation embedded in the message
    pub usage: Option<RawUsage>,
}

/// Message content: plain text or a sequence of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
    Text(String),
    Parts(Vec<RawPart>),
}

impl Default for RawContent {
    fn default() -> Self {
        RawContent::Text(String::new())
    }
}

/// One typed content part: a text part or a tool-call part.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawPart {
    #[serde(rename = "type")]
    pub part_type: Option<String>,
    pub text: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub arguments: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawUsage {
    pub cost: Option<RawCost>,
}

/// Optional cost sub-fields on a usage annotation.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawCost {
    pub total: Option<f64>,
    pub input: Option<f64>,
    pub output: Option<f64>,
    #[serde(rename = "cacheRead")]
    pub cache_read: Option<f64>,
    #[serde(rename = "cacheWrite")]
    pub cache_write: Option<f64>,
}

impl RawRecord {
    /// Whether this line is a message record.
    pub fn is_message(&self) -> bool {
        self.record_type.as_deref() == Some("message")
    }

    /// The enclosing ISO-8601 timestamp as epoch milliseconds, if parseable.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.timestamp_millis())
    }

    /// Best timestamp for this record's message: the message's own epoch-ms
    /// field, falling back to the enclosing ISO-8601 timestamp. Timestamps
    /// are authoritative where present; absence is typed, not zero.
    pub fn message_timestamp_ms(&self) -> Option<i64> {
        self.message
            .as_ref()
            .and_then(|m| m.timestamp)
            .or_else(|| self.timestamp_ms())
    }
}

impl RawMessage {
    /// Flatten content to displayable text: plain strings pass through,
    /// part sequences keep only text parts joined with spaces.
    pub fn text(&self) -> String {
        match &self.content {
            Some(RawContent::Text(s)) => s.clone(),
            Some(RawContent::Parts(parts)) => parts
                .iter()
                .filter(|p| p.part_type.as_deref() == Some("text"))
                .map(|p| p.text.clone().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }

    /// Tool-call parts within this message, in order.
    pub fn tool_calls(&self) -> Vec<&RawPart> {
        match &self.content {
            Some(RawContent::Parts(parts)) => parts
                .iter()
                .filter(|p| p.part_type.as_deref() == Some("toolCall") && p.name.is_some())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_message() {
        let record: RawRecord = serde_json::from_str(
            r#"{"type":"message","message":{"role":"user","timestamp":1000,"content":"hi"}}"#,
        )
        .unwrap();
        assert!(record.is_message());
        let msg = record.message.as_ref().unwrap();
        assert_eq!(msg.role.as_deref(), Some("user"));
        assert_eq!(msg.text(), "hi");
        assert_eq!(record.message_timestamp_ms(), Some(1000));
    }

    #[test]
    fn test_parse_parts_message() {
        let record: RawRecord = serde_json::from_str(
            r#"{"type":"message","timestamp":"2026-01-05T10:00:00Z","message":{"role":"assistant","content":[{"type":"text","text":"done"},{"type":"toolCall","name":"write","id":"call_abc123","arguments":{"path":"/tmp/notes.md"}}]}}"#,
        )
        .unwrap();
        let msg = record.message.as_ref().unwrap();
        assert_eq!(msg.text(), "done");
        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name.as_deref(), Some("write"));
        // Falls back to the enclosing ISO timestamp
        assert!(record.message_timestamp_ms().is_some());
    }

    #[test]
    fn test_parse_usage_record() {
        let record: RawRecord =
            serde_json::from_str(r#"{"type":"usage","usage":{"cost":{"total":0.002,"input":0.001}}}"#)
                .unwrap();
        let cost = record.usage.unwrap().cost.unwrap();
        assert_eq!(cost.total, Some(0.002));
        assert_eq!(cost.input, Some(0.001));
        assert_eq!(cost.output, None);
    }

    #[test]
    fn test_unknown_type_tolerated() {
        let record: RawRecord = serde_json::from_str(r#"{"type":"checkpoint","seq":4}"#).unwrap();
        assert!(!record.is_message());
        assert_eq!(record.record_type.as_deref(), Some("checkpoint"));
    }

    #[test]
    fn test_missing_timestamp_is_absent() {
        let record: RawRecord = serde_json::from_str(
            r#"{"type":"message","message":{"role":"assistant","content":"hello"}}"#,
        )
        .unwrap();
        assert_eq!(record.message_timestamp_ms(), None);
    }
}
