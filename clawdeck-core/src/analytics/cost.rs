//! Cost aggregation across session transcripts
//!
//! Walks every record in every session file and accumulates the five cost
//! scalars from both representations the source system writes: top-level
//! `usage` records and message-embedded usage annotations. Both are
//! additive; when a file carries cost in both places the double count is
//! preserved, because that is how the source behaves.
//!
//! Week windows here start on Sunday. The rhythm module starts its weeks on
//! Monday; the two boundaries are independent features and are not unified.

use crate::analytics::{day_start_ms, local_day};
use crate::transcript::{reader, session};
use crate::types::{CostBreakdown, CostBucket, CostReport, CostWindow, TopSession};
use chrono::{DateTime, Datelike, Days, Local};
use std::collections::HashMap;
use std::path::Path;

/// Days covered by the `by_day` series.
const BY_DAY_WINDOW: u64 = 14;

/// Sessions listed in `top_sessions`.
const TOP_SESSIONS: usize = 10;

#[derive(Debug, Default)]
struct SessionCost {
    id: String,
    started_at: Option<i64>,
    total: f64,
    input: f64,
    output: f64,
    cache_read: f64,
    cache_write: f64,
    preview: String,
}

/// Aggregate costs over every session file under `dir`, as of now.
pub fn cost_report_now(dir: &Path) -> CostReport {
    cost_report(dir, Local::now())
}

/// Aggregate costs over every session file under `dir`.
///
/// `now` is injected so day and week boundaries are testable.
pub fn cost_report(dir: &Path, now: DateTime<Local>) -> CostReport {
    let sessions = collect_session_costs(dir);

    let today = now.date_naive();
    let today_start = day_start_ms(today);
    let week_start = day_start_ms(
        today - Days::new(now.weekday().num_days_from_sunday() as u64),
    );

    let mut report = CostReport {
        today: CostWindow::default(),
        this_week: CostWindow::default(),
        all_time: CostWindow {
            total: 0.0,
            session_count: sessions.len(),
        },
        by_day: Vec::new(),
        top_sessions: Vec::new(),
        breakdown: CostBreakdown::default(),
    };

    // Day buckets are keyed by each costed session's first-message local day.
    let mut by_day: HashMap<String, (f64, usize)> = HashMap::new();

    for s in &sessions {
        report.all_time.total += s.total;
        report.breakdown.input += s.input;
        report.breakdown.output += s.output;
        report.breakdown.cache_read += s.cache_read;
        report.breakdown.cache_write += s.cache_write;

        let Some(started_at) = s.started_at else {
            continue;
        };
        if started_at >= today_start {
            report.today.total += s.total;
            report.today.session_count += 1;
        }
        if started_at >= week_start {
            report.this_week.total += s.total;
            report.this_week.session_count += 1;
        }
        if s.total > 0.0 {
            if let Some(day) = local_day(started_at) {
                let key = day.format("%Y-%m-%d").to_string();
                let entry = by_day.entry(key).or_insert((0.0, 0));
                entry.0 += s.total;
                entry.1 += 1;
            }
        }
    }

    // Trailing 14 days, oldest first, zero days included.
    for i in (0..BY_DAY_WINDOW).rev() {
        let date = (today - Days::new(i)).format("%Y-%m-%d").to_string();
        let (total, session_count) = by_day.get(&date).copied().unwrap_or((0.0, 0));
        report.by_day.push(CostBucket {
            date,
            total,
            session_count,
        });
    }

    let mut ranked: Vec<&SessionCost> = sessions.iter().filter(|s| s.total > 0.0).collect();
    ranked.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    report.top_sessions = ranked
        .into_iter()
        .take(TOP_SESSIONS)
        .map(|s| TopSession {
            id: s.id.clone(),
            preview: s.preview.clone(),
            cost: s.total,
            started_at: s.started_at,
        })
        .collect();

    report
}

fn collect_session_costs(dir: &Path) -> Vec<SessionCost> {
    let mut sessions = Vec::new();

    for file in reader::session_files(dir) {
        let records = reader::read_records(&file.path);
        if records.is_empty() {
            continue;
        }

        let mut s = SessionCost {
            id: file.session_id(),
            ..Default::default()
        };

        for record in &records {
            for cost in [
                record.usage.as_ref().and_then(|u| u.cost.as_ref()),
                record
                    .message
                    .as_ref()
                    .and_then(|m| m.usage.as_ref())
                    .and_then(|u| u.cost.as_ref()),
            ]
            .into_iter()
            .flatten()
            {
                s.total += cost.total.unwrap_or(0.0);
                s.input += cost.input.unwrap_or(0.0);
                s.output += cost.output.unwrap_or(0.0);
                s.cache_read += cost.cache_read.unwrap_or(0.0);
                s.cache_write += cost.cache_write.unwrap_or(0.0);
            }

            if record.is_message() {
                if let Some(ts) = record.message_timestamp_ms() {
                    s.started_at = Some(s.started_at.map_or(ts, |cur| cur.min(ts)));
                }
            }
        }

        if let Some((session, _)) = session::reconstruct(&s.id, &records) {
            s.preview = session.preview;
        }

        sessions.push(s);
    }

    sessions
}
