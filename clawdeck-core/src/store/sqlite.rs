//! SQLite-backed activity store
//!
//! Single `activities` table, schema created on open. Connection access is
//! serialized through a Mutex so the store is Send + Sync.

use crate::error::Result;
use crate::store::{generate_id, text_matches, ActivityStore};
use crate::types::{Activity, ActivityType, NewActivity};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
    id            TEXT PRIMARY KEY,
    creation_time INTEGER NOT NULL,
    type          TEXT NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT,
    metadata      JSON,
    session_id    TEXT
);

CREATE INDEX IF NOT EXISTS idx_activities_creation_time
    ON activities(creation_time DESC);
"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
        let type_str: String = row.get("type")?;
        let metadata: Option<String> = row.get("metadata")?;
        Ok(Activity {
            id: row.get("id")?,
            creation_time: row.get("creation_time")?,
            // FromStr is infallible, unknown names land in Other
            activity_type: ActivityType::from_str(&type_str).unwrap(),
            title: row.get("title")?,
            description: row.get("description")?,
            metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
            session_id: row.get("session_id")?,
        })
    }
}

impl ActivityStore for SqliteStore {
    fn list(&self, activity_type: Option<&ActivityType>) -> Result<Vec<Activity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt;
        let rows = match activity_type {
            Some(t) => {
                stmt = conn.prepare(
                    "SELECT * FROM activities WHERE type = ? ORDER BY creation_time DESC",
                )?;
                stmt.query_map([t.as_str()], Self::row_to_activity)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                stmt = conn.prepare("SELECT * FROM activities ORDER BY creation_time DESC")?;
                stmt.query_map([], Self::row_to_activity)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    fn add(&self, new: NewActivity) -> Result<Activity> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let entry = Activity {
            id: generate_id(now_ms),
            creation_time: now_ms,
            activity_type: new.activity_type,
            title: new.title,
            description: new.description,
            metadata: new.metadata,
            session_id: None,
        };

        let metadata_json = match &entry.metadata {
            Some(v) => Some(serde_json::to_string(v)?),
            None => None,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO activities (id, creation_time, type, title, description, metadata, session_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.creation_time,
                entry.activity_type.as_str(),
                entry.title,
                entry.description,
                metadata_json,
                entry.session_id,
            ],
        )?;

        Ok(entry)
    }

    fn search(&self, query: &str) -> Result<Vec<Activity>> {
        // Case-insensitive matching with the same semantics as the JSON
        // backend, so filtering happens in Rust rather than SQL LIKE.
        let needle = query.to_lowercase();
        let mut all = self.list(None)?;
        all.retain(|a| text_matches(a, &needle));
        Ok(all)
    }

    fn count_since(&self, since_ms: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE creation_time >= ?",
            [since_ms],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_activity(activity_type: ActivityType, title: &str) -> NewActivity {
        NewActivity {
            activity_type,
            title: title.to_string(),
            description: None,
            metadata: None,
        }
    }

    #[test]
    fn test_add_and_list() {
        let s = SqliteStore::open_in_memory().unwrap();
        let added = s
            .add(new_activity(ActivityType::FileWrite, "Wrote notes.md"))
            .unwrap();
        assert!(added.id.starts_with("act_"));

        let listed = s.list(None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Wrote notes.md");
        assert_eq!(listed[0].activity_type, ActivityType::FileWrite);
    }

    #[test]
    fn test_metadata_round_trips() {
        let s = SqliteStore::open_in_memory().unwrap();
        s.add(NewActivity {
            activity_type: ActivityType::Build,
            title: "compiled core".to_string(),
            description: None,
            metadata: Some(serde_json::json!({"target": "release"})),
        })
        .unwrap();

        let listed = s.list(None).unwrap();
        assert_eq!(
            listed[0].metadata,
            Some(serde_json::json!({"target": "release"}))
        );
    }

    #[test]
    fn test_type_filter() {
        let s = SqliteStore::open_in_memory().unwrap();
        s.add(new_activity(ActivityType::Build, "compiled core")).unwrap();
        s.add(new_activity(ActivityType::WebSearch, "looked things up"))
            .unwrap();

        let searches = s.list(Some(&ActivityType::WebSearch)).unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].title, "looked things up");
    }

    #[test]
    fn test_unknown_type_survives_storage() {
        let s = SqliteStore::open_in_memory().unwrap();
        s.add(new_activity(
            ActivityType::Other("custom_event".to_string()),
            "quacked",
        ))
        .unwrap();

        let listed = s.list(None).unwrap();
        assert_eq!(
            listed[0].activity_type,
            ActivityType::Other("custom_event".to_string())
        );
    }

    #[test]
    fn test_search_case_insensitive() {
        let s = SqliteStore::open_in_memory().unwrap();
        s.add(NewActivity {
            activity_type: ActivityType::DocumentCreated,
            title: "Weekly Report".to_string(),
            description: Some("shipped the deployment".to_string()),
            metadata: None,
        })
        .unwrap();

        assert_eq!(s.search("WEEKLY").unwrap().len(), 1);
        assert_eq!(s.search("deployment").unwrap().len(), 1);
        assert_eq!(s.search("missing").unwrap().len(), 0);
    }

    #[test]
    fn test_count_since() {
        let s = SqliteStore::open_in_memory().unwrap();
        let a = s.add(new_activity(ActivityType::Build, "compiled core")).unwrap();
        assert_eq!(s.count_since(a.creation_time).unwrap(), 1);
        assert_eq!(s.count_since(a.creation_time + 1).unwrap(), 0);
    }
}
