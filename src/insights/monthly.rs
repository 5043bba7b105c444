// src/insights/monthly.rs
//! Calendar-month rating trend with direction arrows.
//!
//! Months come from truncating `submitted_at` to `YYYY-MM`; only reviews
//! carrying a rating contribute. Arrows compare each month's (rounded)
//! average against the immediately preceding month in the chronological
//! sequence; the first month defaults to flat.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::round1;
use crate::review::NormalizedReview;
use crate::thresholds::InsightThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendArrow {
    #[serde(rename = "↗️")]
    Up,
    #[serde(rename = "↘️")]
    Down,
    #[serde(rename = "→")]
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM` bucket key.
    pub month: String,
    /// Mean of the month's ratings, 1 decimal.
    pub avg_rating: f64,
    /// Count of the month's reviews at or below the low-rating threshold.
    pub issues: usize,
    pub trend: TrendArrow,
    pub issue_rate: f64,
}

#[derive(Default)]
struct MonthAcc {
    sum: f64,
    count: usize,
    low: usize,
}

/// Chronologically ascending months; empty input yields an empty list.
pub fn monthly_trends(
    reviews: &[NormalizedReview],
    thresholds: &InsightThresholds,
) -> Vec<MonthlyTrend> {
    // BTreeMap keys sort lexicographically, which for YYYY-MM is
    // chronological.
    let mut months: BTreeMap<String, MonthAcc> = BTreeMap::new();

    for review in reviews {
        let Some(rating) = review.rating else { continue };
        let Some(month) = review.month_key() else { continue };
        let acc = months.entry(month.to_string()).or_default();
        acc.sum += rating;
        acc.count += 1;
        if rating <= thresholds.low_rating_max {
            acc.low += 1;
        }
    }

    let mut trends: Vec<MonthlyTrend> = months
        .into_iter()
        .map(|(month, acc)| MonthlyTrend {
            month,
            avg_rating: round1(acc.sum / acc.count as f64),
            issues: acc.low,
            trend: TrendArrow::Flat,
            issue_rate: round1(acc.low as f64 / acc.count as f64 * 100.0),
        })
        .collect();

    for i in 1..trends.len() {
        let previous = trends[i - 1].avg_rating;
        let current = trends[i].avg_rating;
        trends[i].trend = if current > previous + thresholds.arrow_delta {
            TrendArrow::Up
        } else if current < previous - thresholds.arrow_delta {
            TrendArrow::Down
        } else {
            TrendArrow::Flat
        };
    }

    trends
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, rating: Option<f64>, ts: &str) -> NormalizedReview {
        NormalizedReview {
            id: id.into(),
            property_id: "prop-1".into(),
            listing_name: "Test".into(),
            channel: "hostaway".into(),
            rating,
            categories: Vec::new(),
            text: None,
            submitted_at: ts.into(),
            guest_name: None,
            manager_approved: false,
        }
    }

    #[test]
    fn january_average_rounds_to_one_decimal() {
        let reviews = vec![
            review("1", Some(4.5), "2024-01-15T10:30:00Z"),
            review("2", Some(3.0), "2024-01-10T10:30:00Z"),
            review("3", Some(5.0), "2024-01-20T10:30:00Z"),
        ];
        let trends = monthly_trends(&reviews, &InsightThresholds::default());
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].month, "2024-01");
        assert_eq!(trends[0].avg_rating, 4.2);
        assert_eq!(trends[0].issues, 1);
        assert_eq!(trends[0].trend, TrendArrow::Flat);
    }

    #[test]
    fn months_are_chronological_and_arrows_compare_neighbours() {
        let reviews = vec![
            review("1", Some(3.0), "2024-03-10T00:00:00Z"),
            review("2", Some(4.0), "2024-01-10T00:00:00Z"),
            review("3", Some(4.5), "2024-02-10T00:00:00Z"),
        ];
        let trends = monthly_trends(&reviews, &InsightThresholds::default());
        let months: Vec<&str> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(trends[0].trend, TrendArrow::Flat);
        assert_eq!(trends[1].trend, TrendArrow::Up); // 4.0 -> 4.5
        assert_eq!(trends[2].trend, TrendArrow::Down); // 4.5 -> 3.0
    }

    #[test]
    fn small_delta_stays_flat() {
        let reviews = vec![
            review("1", Some(4.0), "2024-01-10T00:00:00Z"),
            review("2", Some(4.2), "2024-02-10T00:00:00Z"),
        ];
        let trends = monthly_trends(&reviews, &InsightThresholds::default());
        assert_eq!(trends[1].trend, TrendArrow::Flat);
    }

    #[test]
    fn unrated_reviews_contribute_nothing() {
        let reviews = vec![
            review("1", None, "2024-01-10T00:00:00Z"),
            review("2", Some(4.0), "2024-02-10T00:00:00Z"),
        ];
        let trends = monthly_trends(&reviews, &InsightThresholds::default());
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].month, "2024-02");
    }

    #[test]
    fn unparsable_months_are_skipped() {
        let reviews = vec![review("1", Some(4.0), "someday soon")];
        assert!(monthly_trends(&reviews, &InsightThresholds::default()).is_empty());
    }

    #[test]
    fn arrow_serializes_as_glyph() {
        let json = serde_json::to_string(&TrendArrow::Up).unwrap();
        assert_eq!(json, "\"↗️\"");
    }
}
