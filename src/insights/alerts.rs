// src/insights/alerts.rs
//! Performance alerts composed from the other insight engines plus the
//! raw low-rating ratio over the trailing window.
//!
//! Rules fire independently; everything that triggers is emitted, then
//! the list is stably ordered critical → warning → info.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::category_insights;
use super::issues::{recurring_issues, IssueLexicon, Severity};
use super::monthly::monthly_trends;
use crate::review::NormalizedReview;
use crate::thresholds::InsightThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl AlertSeverity {
    fn rank(self) -> u8 {
        match self {
            AlertSeverity::Critical => 0,
            AlertSeverity::Warning => 1,
            AlertSeverity::Info => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAlert {
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    /// Suggested next step for the property manager.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Evaluate all alert rules against the given review set.
pub fn performance_alerts(
    reviews: &[NormalizedReview],
    lexicon: &IssueLexicon,
    now: DateTime<Utc>,
    thresholds: &InsightThresholds,
) -> Vec<PerformanceAlert> {
    let mut alerts: Vec<PerformanceAlert> = Vec::new();

    let window_start = now - thresholds.recent_window();
    let recent: Vec<NormalizedReview> = reviews
        .iter()
        .filter(|r| r.instant().map(|t| t >= window_start).unwrap_or(false))
        .cloned()
        .collect();

    // Rule 1: volume of low ratings in the window.
    let low_count = recent
        .iter()
        .filter(|r| r.rating.map(|x| x <= thresholds.low_rating_max).unwrap_or(false))
        .count();
    if low_count as f64 > recent.len() as f64 * thresholds.low_rating_share {
        let pct = low_count as f64 / recent.len() as f64 * 100.0;
        alerts.push(PerformanceAlert {
            severity: AlertSeverity::Critical,
            title: "High Number of Low Ratings".into(),
            description: format!(
                "{} low ratings in the last {} days ({:.1}%)",
                low_count, thresholds.recent_window_days, pct
            ),
            action: "Review recent feedback for common issues and take immediate action".into(),
            category: None,
        });
    }

    // Rule 2: categories with an excessive overall issue rate.
    let insights = category_insights(reviews, now, thresholds);
    let problems: Vec<&str> = insights
        .iter()
        .filter(|c| c.issue_rate > thresholds.problem_issue_rate)
        .map(|c| c.category.as_str())
        .collect();
    if !problems.is_empty() {
        alerts.push(PerformanceAlert {
            severity: AlertSeverity::Warning,
            title: "Category Performance Issues".into(),
            description: format!("Issues detected in: {}", problems.join(", ")),
            action: "Address recurring problems in these areas with targeted improvements".into(),
            category: Some(problems[0].to_string()),
        });
    }

    // Rule 3: month-over-month average drop.
    let trends = monthly_trends(reviews, thresholds);
    if trends.len() >= 2 {
        let latest = &trends[trends.len() - 1];
        let previous = &trends[trends.len() - 2];
        if latest.avg_rating < previous.avg_rating - thresholds.monthly_drop {
            alerts.push(PerformanceAlert {
                severity: AlertSeverity::Warning,
                title: "Declining Performance Trend".into(),
                description: format!(
                    "Average rating dropped from {} to {}",
                    previous.avg_rating, latest.avg_rating
                ),
                action: "Investigate recent changes and implement improvement measures".into(),
                category: None,
            });
        }
    }

    // Rule 4: high-severity recurring issues within the window.
    let recurring = recurring_issues(&recent, lexicon, thresholds);
    let high: Vec<&str> = recurring
        .iter()
        .filter(|i| i.severity == Severity::High)
        .map(|i| i.issue.as_str())
        .collect();
    if !high.is_empty() {
        let noun = if high.len() == 1 { "issue" } else { "issues" };
        alerts.push(PerformanceAlert {
            severity: AlertSeverity::Critical,
            title: "Recurring High-Severity Issues".into(),
            description: format!(
                "{} {} reported frequently: {}",
                high.len(),
                noun,
                high.join(", ")
            ),
            action: "Prioritize fixing these recurring problems immediately".into(),
            category: None,
        });
    }

    // Stable: insertion order survives within each severity rank.
    alerts.sort_by_key(|a| a.severity.rank());
    alerts
}

/// Clock-reading convenience wrapper.
pub fn performance_alerts_now(
    reviews: &[NormalizedReview],
    lexicon: &IssueLexicon,
    thresholds: &InsightThresholds,
) -> Vec<PerformanceAlert> {
    performance_alerts(reviews, lexicon, Utc::now(), thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::CategoryRating;

    fn review(id: &str, rating: Option<f64>, ts: &str, text: Option<&str>) -> NormalizedReview {
        NormalizedReview {
            id: id.into(),
            property_id: "prop-1".into(),
            listing_name: "Test".into(),
            channel: "hostaway".into(),
            rating,
            categories: Vec::new(),
            text: text.map(Into::into),
            submitted_at: ts.into(),
            guest_name: None,
            manager_approved: false,
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-02-01T00:00:00Z".parse().unwrap()
    }

    fn defaults() -> InsightThresholds {
        InsightThresholds::default()
    }

    #[test]
    fn low_rating_volume_fires_critical() {
        // 2 of 4 recent reviews are low: 50% > 30%.
        let reviews = vec![
            review("1", Some(2.0), "2024-01-25T00:00:00Z", None),
            review("2", Some(3.0), "2024-01-26T00:00:00Z", None),
            review("3", Some(5.0), "2024-01-27T00:00:00Z", None),
            review("4", Some(4.5), "2024-01-28T00:00:00Z", None),
        ];
        let alerts = performance_alerts(&reviews, IssueLexicon::embedded(), now(), &defaults());
        let volume = alerts
            .iter()
            .find(|a| a.title == "High Number of Low Ratings")
            .unwrap();
        assert_eq!(volume.severity, AlertSeverity::Critical);
        assert!(volume.description.contains("2 low ratings"));
        assert!(volume.description.contains("50.0%"));
    }

    #[test]
    fn old_low_ratings_do_not_count_toward_volume() {
        let reviews = vec![
            review("1", Some(1.0), "2023-01-25T00:00:00Z", None),
            review("2", Some(1.0), "2023-01-26T00:00:00Z", None),
            review("3", Some(5.0), "2024-01-27T00:00:00Z", None),
        ];
        let alerts = performance_alerts(&reviews, IssueLexicon::embedded(), now(), &defaults());
        assert!(!alerts.iter().any(|a| a.title == "High Number of Low Ratings"));
    }

    #[test]
    fn problem_category_fires_warning_with_first_tag() {
        let mut r1 = review("1", Some(4.0), "2023-06-01T00:00:00Z", None);
        r1.categories = vec![
            CategoryRating { category: "heating".into(), rating: 2.0 },
            CategoryRating { category: "wifi".into(), rating: 5.0 },
        ];
        let mut r2 = review("2", Some(4.0), "2023-06-02T00:00:00Z", None);
        r2.categories = vec![CategoryRating { category: "heating".into(), rating: 1.0 }];
        let mut thresholds = defaults();
        thresholds.trend_delta = 100.0;
        let alerts =
            performance_alerts(&[r1, r2], IssueLexicon::embedded(), now(), &thresholds);
        let warning = alerts
            .iter()
            .find(|a| a.title == "Category Performance Issues")
            .unwrap();
        assert_eq!(warning.severity, AlertSeverity::Warning);
        assert!(warning.description.contains("heating"));
        assert_eq!(warning.category.as_deref(), Some("heating"));
    }

    #[test]
    fn monthly_drop_fires_warning() {
        let reviews = vec![
            review("1", Some(4.8), "2023-12-10T00:00:00Z", None),
            review("2", Some(4.0), "2024-01-10T00:00:00Z", None),
        ];
        let alerts = performance_alerts(&reviews, IssueLexicon::embedded(), now(), &defaults());
        let drop = alerts
            .iter()
            .find(|a| a.title == "Declining Performance Trend")
            .unwrap();
        assert_eq!(drop.description, "Average rating dropped from 4.8 to 4");
    }

    #[test]
    fn recurring_high_severity_uses_plural_wording() {
        let mut reviews: Vec<NormalizedReview> = (0..5)
            .map(|i| {
                review(
                    &format!("n{i}"),
                    Some(4.0),
                    "2024-01-20T00:00:00Z",
                    Some("too much noise at night"),
                )
            })
            .collect();
        reviews.extend((0..5).map(|i| {
            review(
                &format!("w{i}"),
                Some(4.0),
                "2024-01-21T00:00:00Z",
                Some("wifi never worked"),
            )
        }));
        let alerts = performance_alerts(&reviews, IssueLexicon::embedded(), now(), &defaults());
        let recurring = alerts
            .iter()
            .find(|a| a.title == "Recurring High-Severity Issues")
            .unwrap();
        assert!(recurring.description.starts_with("2 issues reported frequently:"));
    }

    #[test]
    fn critical_alerts_sort_before_warnings() {
        // Trigger rule 2 (warning) and rule 4 (critical); rule 4 is
        // inserted later but must come out first.
        let mut reviews: Vec<NormalizedReview> = (0..5)
            .map(|i| {
                review(
                    &format!("n{i}"),
                    Some(4.0),
                    "2024-01-20T00:00:00Z",
                    Some("constant noise"),
                )
            })
            .collect();
        let mut bad = review("c", Some(4.0), "2023-06-01T00:00:00Z", None);
        bad.categories = vec![CategoryRating { category: "heating".into(), rating: 1.0 }];
        reviews.push(bad);
        let mut thresholds = defaults();
        thresholds.trend_delta = 100.0;
        let alerts = performance_alerts(&reviews, IssueLexicon::embedded(), now(), &thresholds);
        assert!(alerts.len() >= 2);
        let ranks: Vec<u8> = alerts.iter().map(|a| a.severity.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn empty_input_produces_no_alerts() {
        let alerts = performance_alerts(&[], IssueLexicon::embedded(), now(), &defaults());
        assert!(alerts.is_empty());
    }
}
