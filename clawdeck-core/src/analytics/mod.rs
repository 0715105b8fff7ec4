//! Time-bucketed analytics over sessions and activities
//!
//! Two independent features with two deliberately independent week
//! boundaries: cost windows start their week on Sunday, the rhythm/streak
//! view starts on Monday. Both use midnight-aligned local-time day
//! boundaries and are recomputed in full on every call.

pub mod cost;
pub mod rhythm;

pub use cost::{cost_report, cost_report_now};
pub use rhythm::{rhythm, rhythm_now};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Local midnight of `date`, epoch milliseconds.
pub(crate) fn day_start_ms(date: NaiveDate) -> i64 {
    let naive = date.and_hms_opt(0, 0, 0).unwrap();
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.timestamp_millis(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
        chrono::LocalResult::None => naive.and_utc().timestamp_millis(),
    }
}

/// Local calendar day containing the instant `ms`.
pub(crate) fn local_day(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.with_timezone(&Local).date_naive())
}

/// Milliseconds in one day; day buckets are [start, start + DAY_MS).
pub(crate) const DAY_MS: i64 = 24 * 60 * 60 * 1000;
