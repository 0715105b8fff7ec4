//! Unified activity feed
//!
//! Merges two activity sources into one timeline:
//!
//! - explicit activities from the [`ActivityStore`]
//! - activities derived on the fly from session transcripts
//!
//! Explicit entries win on id collision, the merged result is sorted newest
//! first with a stable sort (ties keep explicit entries ahead of derived
//! ones), and the limit is applied only after the merge so a small explicit
//! store cannot starve the transcript side.

use crate::store::ActivityStore;
use crate::transcript::activity::{derive_activities, TranscriptQuery};
use crate::types::{Activity, FeedQuery};
use std::collections::HashSet;
use std::path::PathBuf;

/// Default result cap when the query leaves `limit` unset.
const DEFAULT_LIMIT: usize = 50;

pub struct ActivityFeed {
    store: Box<dyn ActivityStore>,
    sessions_dir: PathBuf,
}

impl ActivityFeed {
    pub fn new(store: Box<dyn ActivityStore>, sessions_dir: PathBuf) -> Self {
        Self {
            store,
            sessions_dir,
        }
    }

    pub fn store(&self) -> &dyn ActivityStore {
        self.store.as_ref()
    }

    /// Merged feed, newest first.
    pub fn query(&self, query: &FeedQuery) -> crate::error::Result<Vec<Activity>> {
        self.query_at(query, chrono::Utc::now().timestamp_millis())
    }

    /// Same as [`query`] with an injected clock.
    ///
    /// [`query`]: ActivityFeed::query
    pub fn query_at(&self, query: &FeedQuery, now_ms: i64) -> crate::error::Result<Vec<Activity>> {
        let since_ms = query.since.as_ref().map(|s| s.resolve(now_ms));
        let needle = query.text.as_ref().map(|t| t.to_lowercase());

        let mut explicit = self.store.list(query.activity_type.as_ref())?;
        if let Some(since) = since_ms {
            explicit.retain(|a| a.creation_time >= since);
        }
        if let Some(needle) = &needle {
            explicit.retain(|a| crate::store::text_matches(a, needle));
        }

        // Over-fetch from the transcripts so the merged cap is still
        // reachable when every explicit entry shadows a derived one.
        let transcript_cap = query.limit.unwrap_or(DEFAULT_LIMIT) + explicit.len();
        let transcript_query = TranscriptQuery {
            since_ms,
            limit: Some(transcript_cap),
            types: query.activity_type.clone().map(|t| vec![t]),
        };
        let mut derived = derive_activities(&self.sessions_dir, &transcript_query, now_ms);
        if let Some(needle) = &needle {
            derived.retain(|a| crate::store::text_matches(a, needle));
        }

        let explicit_ids: HashSet<&str> = explicit.iter().map(|a| a.id.as_str()).collect();
        derived.retain(|a| !explicit_ids.contains(a.id.as_str()));

        let mut merged = explicit;
        merged.extend(derived);
        merged.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));
        merged.truncate(query.limit.unwrap_or(DEFAULT_LIMIT));
        Ok(merged)
    }
}
