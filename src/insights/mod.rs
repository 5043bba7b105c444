// src/insights/mod.rs
//! Insight engines: category performance, monthly trends, recurring
//! textual issues, and composed performance alerts.
//!
//! All functions are pure transforms over a caller-selected review set
//! (everything, or one listing's subset). The time-dependent engines take
//! an explicit reference instant; thin `*_now` variants read the clock.

pub mod alerts;
pub mod category;
pub mod issues;
pub mod monthly;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dimensions::rating_distribution;
use crate::review::NormalizedReview;
use crate::thresholds::InsightThresholds;

pub use alerts::{performance_alerts, performance_alerts_now, AlertSeverity, PerformanceAlert};
pub use category::{category_insights, category_insights_now, CategoryInsight, CategoryTrend};
pub use issues::{recurring_issues, IssueLexicon, RecurringIssue, Severity};
pub use monthly::{monthly_trends, MonthlyTrend, TrendArrow};

/// One decimal place, the wire precision for every derived rate/average.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Everything the dashboard insights view needs in one payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    pub categories: Vec<CategoryInsight>,
    pub monthly: Vec<MonthlyTrend>,
    pub recurring: Vec<RecurringIssue>,
    pub alerts: Vec<PerformanceAlert>,
    pub rating_distribution: BTreeMap<u8, usize>,
}

pub fn insights_report(
    reviews: &[NormalizedReview],
    lexicon: &IssueLexicon,
    now: DateTime<Utc>,
    thresholds: &InsightThresholds,
) -> InsightsReport {
    InsightsReport {
        categories: category_insights(reviews, now, thresholds),
        monthly: monthly_trends(reviews, thresholds),
        recurring: recurring_issues(reviews, lexicon, thresholds),
        alerts: performance_alerts(reviews, lexicon, now, thresholds),
        rating_distribution: rating_distribution(reviews),
    }
}
