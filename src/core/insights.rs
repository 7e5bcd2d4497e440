//! Threshold evaluation, recommendations and session summaries.
//!
//! Everything here is a pure function of a session's usage records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::catalog::Category;
use crate::core::sampler::{Session, UsageRecord};

/// Overall usage level by total session minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageLevel {
    Minimal,
    Light,
    Moderate,
    Heavy,
    Excessive,
}

impl UsageLevel {
    /// Ordered (level, minimum minutes) pairs.
    pub const THRESHOLDS: [(UsageLevel, f64); 4] = [
        (UsageLevel::Light, 30.0),
        (UsageLevel::Moderate, 60.0),
        (UsageLevel::Heavy, 120.0),
        (UsageLevel::Excessive, 180.0),
    ];

    /// Highest level whose threshold is at or below `total_minutes`.
    pub fn from_minutes(total_minutes: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .filter(|(_, threshold)| *threshold <= total_minutes)
            .last()
            .map(|(level, _)| *level)
            .unwrap_or(UsageLevel::Minimal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageLevel::Minimal => "Minimal",
            UsageLevel::Light => "Light",
            UsageLevel::Moderate => "Moderate",
            UsageLevel::Heavy => "Heavy",
            UsageLevel::Excessive => "Excessive",
        }
    }
}

impl std::fmt::Display for UsageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category percentage thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryPolicy {
    /// Time sinks: warn on heavy and excessive share
    Alert {
        moderate: f64,
        heavy: f64,
        excessive: f64,
    },
    /// Focus work: note a high share
    Productive {
        light: f64,
        moderate: f64,
        productive: f64,
    },
}

impl CategoryPolicy {
    pub fn for_category(category: Category) -> Option<Self> {
        match category {
            Category::Entertainment => Some(CategoryPolicy::Alert {
                moderate: 20.0,
                heavy: 40.0,
                excessive: 60.0,
            }),
            Category::Communication => Some(CategoryPolicy::Alert {
                moderate: 20.0,
                heavy: 30.0,
                excessive: 50.0,
            }),
            Category::Browsers => Some(CategoryPolicy::Alert {
                moderate: 30.0,
                heavy: 50.0,
                excessive: 70.0,
            }),
            Category::Development | Category::Office => Some(CategoryPolicy::Productive {
                light: 20.0,
                moderate: 40.0,
                productive: 60.0,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
    Health,
}

/// One advisory produced by [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub severity: Severity,
    pub message: String,
}

impl Insight {
    fn new(severity: Severity, message: String) -> Self {
        Self { severity, message }
    }
}

fn total_minutes(records: &[UsageRecord]) -> f64 {
    records.iter().map(|r| r.minutes()).sum()
}

/// Minutes per category, in category order.
pub fn category_minutes(records: &[UsageRecord]) -> BTreeMap<Category, f64> {
    let mut minutes = BTreeMap::new();
    for record in records {
        *minutes.entry(record.category()).or_insert(0.0) += record.minutes();
    }
    minutes
}

/// Evaluate usage thresholds for a session's records.
///
/// Rules fire independently: overall level, then per-category share, then
/// health reminders. A zero total produces nothing.
pub fn evaluate(records: &[UsageRecord]) -> Vec<Insight> {
    let total = total_minutes(records);
    if total <= 0.0 {
        return Vec::new();
    }

    let mut insights = Vec::new();

    let level = UsageLevel::from_minutes(total);
    if level >= UsageLevel::Heavy {
        insights.push(Insight::new(
            Severity::Warning,
            format!(
                "⚠️ {level} overall usage detected ({total:.1} minutes). Consider taking a longer break."
            ),
        ));
    }

    for (category, minutes) in category_minutes(records) {
        let share = minutes / total * 100.0;
        match CategoryPolicy::for_category(category) {
            Some(CategoryPolicy::Alert {
                heavy, excessive, ..
            }) => {
                if share >= excessive {
                    insights.push(Insight::new(
                        Severity::Warning,
                        format!(
                            "⚠️ Excessive {category} usage ({share:.1}%). Consider setting strict time limits."
                        ),
                    ));
                } else if share >= heavy {
                    insights.push(Insight::new(
                        Severity::Warning,
                        format!(
                            "⚡ Heavy {category} usage ({share:.1}%). Try to balance with other activities."
                        ),
                    ));
                }
            }
            Some(CategoryPolicy::Productive { productive, .. }) => {
                if share >= productive {
                    insights.push(Insight::new(
                        Severity::Info,
                        format!(
                            "💪 High {category} focus ({share:.1}%). Remember to take regular breaks."
                        ),
                    ));
                }
            }
            None => {}
        }
    }

    if total > 60.0 {
        insights.push(Insight::new(
            Severity::Health,
            "🧘 Extended computer use detected. Practice the 20-20-20 rule: Every 20 minutes, look 20 feet away for 20 seconds.".to_string(),
        ));
        if total > 120.0 {
            insights.push(Insight::new(
                Severity::Health,
                "💆 Consider taking a 5-minute break to stretch and move around.".to_string(),
            ));
        }
    }

    insights
}

const MAX_RECOMMENDATIONS: usize = 5;

const GENERAL_TIPS: [&str; 4] = [
    "🧘 Practice mindful computing by closing unnecessary applications",
    "💡 Use the built-in blue light filter during evening hours",
    "🎯 Set specific goals for each work session",
    "⚡ Take regular micro-breaks (2 minutes every 30 minutes)",
];

/// Up to five tips driven by the session's category mix.
pub fn recommendations(records: &[UsageRecord]) -> Vec<String> {
    let total = total_minutes(records);
    let shares: BTreeMap<Category, f64> = if total > 0.0 {
        category_minutes(records)
            .into_iter()
            .map(|(c, m)| (c, m / total * 100.0))
            .collect()
    } else {
        BTreeMap::new()
    };

    let mut tips: Vec<String> = Vec::new();
    if let Some(&share) = shares.get(&Category::Productivity) {
        if share > 70.0 {
            tips.push("🎯 Consider implementing regular break intervals using the Pomodoro Technique".into());
        } else if share < 30.0 {
            tips.push("💪 Try setting specific focus hours for deep work".into());
        }
    }

    let rules: [(Category, f64, [&str; 2]); 3] = [
        (
            Category::Entertainment,
            40.0,
            [
                "⏰ Use app timers to maintain balanced screen time",
                "🌟 Schedule specific entertainment time slots",
            ],
        ),
        (
            Category::Communication,
            30.0,
            [
                "📧 Set specific times for checking emails and messages",
                "🎯 Use 'Do Not Disturb' mode during focus periods",
            ],
        ),
        (
            Category::Browsers,
            50.0,
            [
                "🌐 Use browser extensions to block distracting websites",
                "📚 Try browser tab management techniques",
            ],
        ),
    ];
    for (category, limit, pair) in rules {
        if shares.get(&category).is_some_and(|&share| share > limit) {
            tips.extend(pair.iter().map(|t| t.to_string()));
        }
    }

    tips.extend(GENERAL_TIPS.iter().map(|t| t.to_string()));
    tips.truncate(MAX_RECOMMENDATIONS);
    tips
}

/// Headline numbers for a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_minutes: f64,
    pub app_count: usize,
    pub categories: BTreeMap<Category, f64>,
    pub most_used: String,
    pub average_minutes: f64,
}

impl SessionSummary {
    /// `None` for a session with no records.
    pub fn from_session(session: &Session) -> Option<Self> {
        let most_used = session
            .records
            .iter()
            .max_by_key(|r| r.elapsed_seconds)?
            .application_id
            .clone();
        let total_minutes = session.total_minutes();
        let app_count = session.records.len();

        Some(Self {
            total_minutes,
            app_count,
            categories: category_minutes(&session.records),
            most_used,
            average_minutes: total_minutes / app_count as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn records(pairs: &[(&str, u64)]) -> Vec<UsageRecord> {
        pairs
            .iter()
            .map(|(app, secs)| UsageRecord::with_seconds(*app, *secs))
            .collect()
    }

    #[test]
    fn test_usage_levels() {
        assert_eq!(UsageLevel::from_minutes(0.0), UsageLevel::Minimal);
        assert_eq!(UsageLevel::from_minutes(30.0), UsageLevel::Light);
        assert_eq!(UsageLevel::from_minutes(90.0), UsageLevel::Moderate);
        assert_eq!(UsageLevel::from_minutes(120.0), UsageLevel::Heavy);
        assert_eq!(UsageLevel::from_minutes(500.0), UsageLevel::Excessive);
    }

    #[test]
    fn test_dev_heavy_with_some_gaming() {
        let insights = evaluate(&records(&[("dev.exe", 3600), ("game.exe", 1800)]));

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].severity, Severity::Info);
        assert_eq!(
            insights[0].message,
            "💪 High Development focus (66.7%). Remember to take regular breaks."
        );
        assert_eq!(insights[1].severity, Severity::Health);
        assert!(insights[1].message.contains("20-20-20"));
    }

    #[test]
    fn test_zero_total_is_silent() {
        assert!(evaluate(&[]).is_empty());
        assert!(evaluate(&records(&[("chrome.exe", 0)])).is_empty());
    }

    #[test]
    fn test_heavy_and_excessive_categories() {
        // 150 minutes, 80% entertainment, 20% communication
        let insights = evaluate(&records(&[("steam.exe", 7200), ("slack.exe", 1800)]));
        let messages: Vec<&str> = insights.iter().map(|i| i.message.as_str()).collect();

        assert_eq!(
            messages,
            vec![
                "⚠️ Heavy overall usage detected (150.0 minutes). Consider taking a longer break.",
                "⚠️ Excessive Entertainment usage (80.0%). Consider setting strict time limits.",
                "🧘 Extended computer use detected. Practice the 20-20-20 rule: Every 20 minutes, look 20 feet away for 20 seconds.",
                "💆 Consider taking a 5-minute break to stretch and move around.",
            ]
        );
    }

    #[test]
    fn test_heavy_share_framing() {
        // 30 minutes: 40% browsers is below heavy (50), 60% communication is excessive
        let insights = evaluate(&records(&[("chrome.exe", 720), ("teams.exe", 1080)]));
        assert_eq!(insights.len(), 1);
        assert!(insights[0].message.starts_with("⚠️ Excessive Communication"));

        let insights = evaluate(&records(&[("teams.exe", 600), ("code.exe", 1000)]));
        assert_eq!(insights.len(), 2);
        assert!(insights[0].message.starts_with("💪 High Development focus (62.5%)"));
        assert!(insights[1].message.starts_with("⚡ Heavy Communication usage (37.5%)"));
    }

    #[test]
    fn test_recommendations() {
        let tips = recommendations(&records(&[("steam.exe", 3000), ("chrome.exe", 600)]));
        assert_eq!(tips.len(), 5);
        assert_eq!(tips[0], "⏰ Use app timers to maintain balanced screen time");
        assert_eq!(tips[1], "🌟 Schedule specific entertainment time slots");
        assert_eq!(tips[2], GENERAL_TIPS[0]);

        let tips = recommendations(&records(&[("photoedit.exe", 600), ("code.exe", 3000)]));
        assert_eq!(tips[0], "💪 Try setting specific focus hours for deep work");

        let tips = recommendations(&[]);
        assert_eq!(tips, GENERAL_TIPS.iter().map(|t| t.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_session_summary() {
        let session = Session::new(
            Utc::now(),
            600,
            records(&[("code.exe", 300), ("chrome.exe", 120), ("code.exe", 60)]),
        );
        let summary = SessionSummary::from_session(&session).unwrap();

        assert_eq!(summary.app_count, 2);
        assert_eq!(summary.most_used, "code.exe");
        assert_eq!(summary.total_minutes, 8.0);
        assert_eq!(summary.average_minutes, 4.0);
        assert_eq!(summary.categories[&Category::Development], 6.0);

        assert!(SessionSummary::from_session(&Session::new(Utc::now(), 60, Vec::new())).is_none());
    }
}
