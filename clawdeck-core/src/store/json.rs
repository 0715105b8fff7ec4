//! JSON-file-backed activity store
//!
//! Activities live in one JSON array file, appended oldest-first. Reads
//! degrade to an empty list when the file is missing or corrupt; writes
//! rewrite the whole file. Cheap and inspectable, suitable for a
//! single-writer deployment.

use crate::error::Result;
use crate::store::{generate_id, text_matches, ActivityStore};
use crate::types::{Activity, ActivityType, NewActivity};
use std::path::PathBuf;

pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the full array; a missing or unparseable file is an empty store.
    fn read_all(&self) -> Vec<Activity> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(all) => all,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unparseable store file");
                Vec::new()
            }
        }
    }

    fn write_all(&self, all: &[Activity]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(all)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl ActivityStore for JsonStore {
    fn list(&self, activity_type: Option<&ActivityType>) -> Result<Vec<Activity>> {
        let mut all = self.read_all();
        all.reverse(); // stored oldest-first, served newest-first
        if let Some(t) = activity_type {
            all.retain(|a| &a.activity_type == t);
        }
        Ok(all)
    }

    fn add(&self, new: NewActivity) -> Result<Activity> {
        let mut all = self.read_all();
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
        all.push(entry.clone());
        self.write_all(&all)?;
        Ok(entry)
    }

    fn search(&self, query: &str) -> Result<Vec<Activity>> {
        let needle = query.to_lowercase();
        let mut all = self.read_all();
        all.reverse();
        all.retain(|a| text_matches(a, &needle));
        Ok(all)
    }

    fn count_since(&self, since_ms: i64) -> Result<usize> {
        Ok(self
            .read_all()
            .iter()
            .filter(|a| a.creation_time >= since_ms)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> JsonStore {
        JsonStore::new(tmp.path().join("data").join("activities.json"))
    }

    fn new_activity(activity_type: ActivityType, title: &str) -> NewActivity {
        NewActivity {
            activity_type,
            title: title.to_string(),
            description: None,
            metadata: None,
        }
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(store(&tmp).list(None).unwrap().is_empty());
    }

    #[test]
    fn test_add_then_list_newest_first() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let first = s
            .add(new_activity(ActivityType::Build, "compiled core"))
            .unwrap();
        let second = s
            .add(new_activity(ActivityType::WebSearch, "looked things up"))
            .unwrap();

        assert!(first.id.starts_with("act_"));

        let listed = s.list(None).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn test_list_filters_by_type() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.add(new_activity(ActivityType::Build, "compiled core")).unwrap();
        s.add(new_activity(ActivityType::WebSearch, "looked things up"))
            .unwrap();

        let builds = s.list(Some(&ActivityType::Build)).unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].title, "compiled core");
    }

    #[test]
    fn test_search_matches_title_and_description() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.add(NewActivity {
            activity_type: ActivityType::DocumentCreated,
            title: "Weekly report".to_string(),
            description: Some("Summarized DEPLOYMENT progress".to_string()),
            metadata: None,
        })
        .unwrap();
        s.add(new_activity(ActivityType::Build, "compiled core")).unwrap();

        assert_eq!(s.search("weekly").unwrap().len(), 1);
        assert_eq!(s.search("deployment").unwrap().len(), 1);
        assert_eq!(s.search("nonexistent").unwrap().len(), 0);
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("activities.json");
        std::fs::write(&path, "not json at all").unwrap();
        let s = JsonStore::new(path);
        assert!(s.list(None).unwrap().is_empty());
        // And it recovers on the next add
        s.add(new_activity(ActivityType::Build, "fresh start")).unwrap();
        assert_eq!(s.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_count_since() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let a = s.add(new_activity(ActivityType::Build, "compiled core")).unwrap();
        assert_eq!(s.count_since(a.creation_time).unwrap(), 1);
        assert_eq!(s.count_since(a.creation_time + 1).unwrap(), 0);
    }
}
