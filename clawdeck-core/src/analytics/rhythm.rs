//! Rhythm and streak calculation over the explicit activity timeline
//!
//! A pure function of the timeline: per-day counts for the Monday-starting
//! current week, plus the current consecutive-day streak. Recomputed in full
//! on every call so out-of-order writes to the store cannot leave a stale
//! incremental state behind.

use crate::analytics::{day_start_ms, DAY_MS};
use crate::types::{Activity, Rhythm, WeekDay};
use chrono::{DateTime, Datelike, Days, Local};

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Compute the rhythm view as of now.
pub fn rhythm_now(timeline: &[Activity]) -> Rhythm {
    rhythm(timeline, Local::now())
}

/// Compute the rhythm view for an injected `now`.
pub fn rhythm(timeline: &[Activity], now: DateTime<Local>) -> Rhythm {
    let today = now.date_naive();
    let monday = today - Days::new(now.weekday().num_days_from_monday() as u64);

    let week_days: Vec<WeekDay> = (0..7)
        .map(|i| {
            let date = monday + Days::new(i);
            let count = count_on_day(timeline, day_start_ms(date));
            WeekDay {
                date: date.format("%Y-%m-%d").to_string(),
                day: DAY_NAMES[i as usize],
                count,
                has_activity: count > 0,
            }
        })
        .collect();

    // Streak counts back from today when today has activity, else from
    // yesterday; the first empty day ends it.
    let mut streak = 0u32;
    let mut cursor = if count_on_day(timeline, day_start_ms(today)) > 0 {
        today
    } else {
        today - Days::new(1)
    };
    while count_on_day(timeline, day_start_ms(cursor)) > 0 {
        streak += 1;
        cursor = cursor - Days::new(1);
    }

    let seven_days_ago = day_start_ms(today - Days::new(6));
    let activity_count_this_week = timeline
        .iter()
        .filter(|a| a.creation_time >= seven_days_ago)
        .count();

    Rhythm {
        week_days,
        streak,
        activity_count_this_week,
    }
}

fn count_on_day(timeline: &[Activity], day_start: i64) -> usize {
    let day_end = day_start + DAY_MS;
    timeline
        .iter()
        .filter(|a| a.creation_time >= day_start && a.creation_time < day_end)
        .count()
}
