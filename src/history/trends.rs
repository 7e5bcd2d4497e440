//! Long-range views over the session history.

use crate::core::catalog::Category;
use crate::core::sampler::Session;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories counted as productive time.
pub const PRODUCTIVE_CATEGORIES: [Category; 3] =
    [Category::Development, Category::Office, Category::Productivity];

/// Share of all recorded time spent in productive categories (0-100).
pub fn productivity_score(sessions: &[Session]) -> f64 {
    let mut total = 0u64;
    let mut productive = 0u64;
    for record in sessions.iter().flat_map(|s| &s.records) {
        total += record.elapsed_seconds;
        if PRODUCTIVE_CATEGORIES.contains(&record.category()) {
            productive += record.elapsed_seconds;
        }
    }

    if total == 0 {
        return 0.0;
    }
    (productive as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Usage over a window of recent days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTrends {
    /// Minutes per local calendar day
    pub daily_minutes: BTreeMap<NaiveDate, f64>,
    /// Minutes per category per local calendar day
    pub category_minutes: BTreeMap<Category, BTreeMap<NaiveDate, f64>>,
    pub total_minutes: f64,
    /// Total spread over the requested number of days
    pub average_daily_minutes: f64,
}

impl UsageTrends {
    pub fn is_empty(&self) -> bool {
        self.daily_minutes.is_empty()
    }
}

/// Summarize sessions that ended within the last `days` days.
pub fn daily_usage(sessions: &[Session], days: u32, now: DateTime<Utc>, tz: Tz) -> UsageTrends {
    let since = now - Duration::days(days as i64);
    let mut trends = UsageTrends::default();

    for session in sessions.iter().filter(|s| s.timestamp >= since) {
        let day = session.timestamp.with_timezone(&tz).date_naive();
        for record in &session.records {
            let minutes = record.minutes();
            *trends.daily_minutes.entry(day).or_insert(0.0) += minutes;
            *trends
                .category_minutes
                .entry(record.category())
                .or_default()
                .entry(day)
                .or_insert(0.0) += minutes;
            trends.total_minutes += minutes;
        }
    }

    if days > 0 {
        trends.average_daily_minutes = trends.total_minutes / days as f64;
    }
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::UsageRecord;
    use chrono::TimeZone;

    fn session_at(ts: DateTime<Utc>, records: Vec<UsageRecord>) -> Session {
        Session::new(ts, 3600, records)
    }

    #[test]
    fn test_productivity_score() {
        let now = Utc::now();
        let sessions = vec![
            session_at(
                now,
                vec![
                    UsageRecord::with_seconds("code.exe", 1800),
                    UsageRecord::with_seconds("steam.exe", 600),
                ],
            ),
            session_at(now, vec![UsageRecord::with_seconds("EXCEL.EXE", 600)]),
        ];
        assert!((productivity_score(&sessions) - 80.0).abs() < 1e-9);
        assert_eq!(productivity_score(&[]), 0.0);
    }

    #[test]
    fn test_daily_usage_groups_by_local_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let sessions = vec![
            session_at(late, vec![UsageRecord::with_seconds("code.exe", 600)]),
            session_at(now, vec![UsageRecord::with_seconds("chrome.exe", 1200)]),
            session_at(old, vec![UsageRecord::with_seconds("code.exe", 6000)]),
        ];

        let utc = daily_usage(&sessions, 7, now, chrono_tz::UTC);
        assert_eq!(utc.daily_minutes.len(), 2);
        assert!((utc.total_minutes - 30.0).abs() < 1e-9);
        assert!((utc.average_daily_minutes - 30.0 / 7.0).abs() < 1e-9);
        assert_eq!(
            utc.category_minutes[&Category::Browsers].values().sum::<f64>(),
            20.0
        );

        // 23:30 UTC is already the next day in Madrid
        let madrid = daily_usage(&sessions, 7, now, chrono_tz::Europe::Madrid);
        assert_eq!(madrid.daily_minutes.len(), 1);
    }
}
