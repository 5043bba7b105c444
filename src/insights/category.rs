// src/insights/category.rs
//! Per-category performance with trend classification.
//!
//! For each category name appearing in any review's sub-ratings:
//! occurrence count, mean rating, low-rating ("issue") count, and the
//! same restricted to the trailing recent window. The recent-vs-overall
//! issue-rate delta classifies the trend.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::round1;
use crate::review::NormalizedReview;
use crate::thresholds::InsightThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTrend {
    Improving,
    Stable,
    Declining,
    Concerning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInsight {
    pub category: String,
    /// Mean category rating, 1 decimal; 0 if the category never occurs.
    pub rating: f64,
    /// Low-rating occurrence count over the full set.
    pub issues: usize,
    pub trend: CategoryTrend,
    /// `issues / total * 100`, 1 decimal.
    pub issue_rate: f64,
}

#[derive(Default)]
struct Acc {
    category: String,
    count: usize,
    sum: f64,
    low: usize,
    recent_count: usize,
    recent_low: usize,
}

/// Worst-performing categories first (descending issue rate; ties keep
/// first-appearance order).
pub fn category_insights(
    reviews: &[NormalizedReview],
    now: DateTime<Utc>,
    thresholds: &InsightThresholds,
) -> Vec<CategoryInsight> {
    let window_start = now - thresholds.recent_window();

    // First-appearance order keeps the output deterministic.
    let mut order: Vec<Acc> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for review in reviews {
        // Malformed timestamps never count as recent.
        let is_recent = review.instant().map(|t| t >= window_start).unwrap_or(false);

        for cat in &review.categories {
            let idx = *index.entry(cat.category.clone()).or_insert_with(|| {
                order.push(Acc {
                    category: cat.category.clone(),
                    ..Acc::default()
                });
                order.len() - 1
            });
            let acc = &mut order[idx];
            acc.count += 1;
            acc.sum += cat.rating;
            if is_recent {
                acc.recent_count += 1;
            }
            if cat.rating <= thresholds.low_rating_max {
                acc.low += 1;
                if is_recent {
                    acc.recent_low += 1;
                }
            }
        }
    }

    let mut out: Vec<CategoryInsight> = order
        .into_iter()
        .map(|acc| {
            let rating = if acc.count > 0 {
                round1(acc.sum / acc.count as f64)
            } else {
                0.0
            };
            let issue_rate = rate(acc.low, acc.count);
            // Rate over the recent subset itself, so a recent spike can
            // exceed the overall rate.
            let recent_issue_rate = rate(acc.recent_low, acc.recent_count);

            let trend = if recent_issue_rate > issue_rate + thresholds.trend_delta {
                CategoryTrend::Concerning
            } else if recent_issue_rate < issue_rate - thresholds.trend_delta {
                CategoryTrend::Improving
            } else if issue_rate > thresholds.problem_issue_rate {
                CategoryTrend::Declining
            } else {
                CategoryTrend::Stable
            };

            CategoryInsight {
                category: acc.category,
                rating,
                issues: acc.low,
                trend,
                issue_rate,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.issue_rate
            .partial_cmp(&a.issue_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

/// Clock-reading convenience wrapper.
pub fn category_insights_now(
    reviews: &[NormalizedReview],
    thresholds: &InsightThresholds,
) -> Vec<CategoryInsight> {
    category_insights(reviews, Utc::now(), thresholds)
}

fn rate(part: usize, total: usize) -> f64 {
    if total > 0 {
        round1(part as f64 / total as f64 * 100.0)
    } else {
        0.0
    }
}
