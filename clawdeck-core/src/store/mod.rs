//! Explicit activity store
//!
//! The store is an injected repository abstraction: the merge engine only
//! sees the [`ActivityStore`] trait, so a deployment can back it with a JSON
//! file, an embedded database, or something remote without touching merge
//! logic. Two backends ship in-tree:
//!
//! - [`JsonStore`]: a single JSON array file, human-inspectable
//! - [`SqliteStore`]: an embedded SQLite database
//!
//! Neither backend guards against concurrent writers from other processes;
//! the deployment assumption is a single writer.

mod json;
mod sqlite;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{Activity, ActivityType, NewActivity};

/// Repository interface for explicitly logged activities.
///
/// Explicit activities are append-only: created once via [`add`] and never
/// mutated afterwards.
///
/// [`add`]: ActivityStore::add
pub trait ActivityStore: Send + Sync {
    /// All activities, newest first, optionally restricted to one type.
    fn list(&self, activity_type: Option<&ActivityType>) -> Result<Vec<Activity>>;

    /// Append a new activity; the store assigns id and creation time.
    fn add(&self, new: NewActivity) -> Result<Activity>;

    /// Case-insensitive search over title and description, newest first.
    fn search(&self, query: &str) -> Result<Vec<Activity>>;

    /// Count activities created at or after `since_ms`.
    fn count_since(&self, since_ms: i64) -> Result<usize>;
}

/// Explicit activity id: `act_<epoch ms>_<short random suffix>`.
///
/// The `act_` prefix keeps the explicit namespace disjoint from the
/// transcript-derived `tc_` namespace.
pub(crate) fn generate_id(now_ms: i64) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect();
    format!("act_{}_{}", now_ms, suffix)
}

/// Case-insensitive match against an activity's title and description.
pub(crate) fn text_matches(activity: &Activity, needle_lower: &str) -> bool {
    if activity.title.to_lowercase().contains(needle_lower) {
        return true;
    }
    activity
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains(needle_lower))
}
