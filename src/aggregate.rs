// src/aggregate.rs
//! Aggregations returned alongside the raw review list, plus the header
//! stats for the dashboard: per-listing / per-channel / per-month counts
//! and averages, best-performing categories, and the recent month trend.
//!
//! Averages always exclude unrated reviews; a bucket with no rated
//! reviews reports a null average rather than zero.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::review::NormalizedReview;

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAgg {
    pub count: usize,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAggregations {
    pub by_listing: BTreeMap<String, BucketAgg>,
    pub by_channel: BTreeMap<String, BucketAgg>,
    /// Keyed by `YYYY-MM`.
    pub by_month: BTreeMap<String, BucketAgg>,
}

#[derive(Default)]
struct Acc {
    count: usize,
    rated: usize,
    sum: f64,
}

impl Acc {
    fn push(&mut self, rating: Option<f64>) {
        self.count += 1;
        if let Some(r) = rating {
            self.rated += 1;
            self.sum += r;
        }
    }

    fn finish(&self) -> BucketAgg {
        BucketAgg {
            count: self.count,
            avg_rating: (self.rated > 0).then(|| round1(self.sum / self.rated as f64)),
        }
    }
}

pub fn build_aggregations(reviews: &[NormalizedReview]) -> ReviewAggregations {
    let mut by_listing: BTreeMap<String, Acc> = BTreeMap::new();
    let mut by_channel: BTreeMap<String, Acc> = BTreeMap::new();
    let mut by_month: BTreeMap<String, Acc> = BTreeMap::new();

    for review in reviews {
        by_listing
            .entry(review.property_id.clone())
            .or_default()
            .push(review.rating);
        by_channel
            .entry(review.channel.clone())
            .or_default()
            .push(review.rating);
        if let Some(month) = review.month_key() {
            by_month.entry(month.to_string()).or_default().push(review.rating);
        }
    }

    let finish = |m: BTreeMap<String, Acc>| m.into_iter().map(|(k, v)| (k, v.finish())).collect();
    ReviewAggregations {
        by_listing: finish(by_listing),
        by_channel: finish(by_channel),
        by_month: finish(by_month),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: String,
    /// Mean category rating, 2 decimals.
    pub average_rating: f64,
    pub count: usize,
}

/// Per-category averages, best-performing first (the dashboard's "top
/// categories" view — distinct from the issue-rate-sorted insight view).
pub fn category_stats(reviews: &[NormalizedReview]) -> Vec<CategoryStat> {
    let mut order: Vec<(String, f64, usize)> = Vec::new();
    for review in reviews {
        for cat in &review.categories {
            match order.iter_mut().find(|(name, _, _)| name == &cat.category) {
                Some((_, sum, count)) => {
                    *sum += cat.rating;
                    *count += 1;
                }
                None => order.push((cat.category.clone(), cat.rating, 1)),
            }
        }
    }
    let mut stats: Vec<CategoryStat> = order
        .into_iter()
        .map(|(category, sum, count)| CategoryStat {
            category,
            average_rating: round2(sum / count as f64),
            count,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_reviews: usize,
    /// Mean over rated reviews only, 1 decimal; 0 when nothing is rated.
    pub average_rating: f64,
    pub approved_reviews: usize,
    pub pending_reviews: usize,
    pub top_categories: Vec<CategoryStat>,
    /// Trailing months, oldest first.
    pub recent_trends: Vec<MonthCount>,
}

const TOP_CATEGORIES: usize = 5;
const RECENT_MONTHS: usize = 6;

pub fn dashboard_stats(reviews: &[NormalizedReview]) -> DashboardStats {
    let rated: Vec<f64> = reviews.iter().filter_map(|r| r.rating).collect();
    let average_rating = if rated.is_empty() {
        0.0
    } else {
        round1(rated.iter().sum::<f64>() / rated.len() as f64)
    };
    let approved = reviews.iter().filter(|r| r.manager_approved).count();

    let mut top_categories = category_stats(reviews);
    top_categories.truncate(TOP_CATEGORIES);

    let by_month = build_aggregations(reviews).by_month;
    let skip = by_month.len().saturating_sub(RECENT_MONTHS);
    let recent_trends = by_month
        .into_iter()
        .skip(skip)
        .map(|(month, agg)| MonthCount {
            month,
            count: agg.count,
            average_rating: agg.avg_rating,
        })
        .collect();

    DashboardStats {
        total_reviews: reviews.len(),
        average_rating,
        approved_reviews: approved,
        pending_reviews: reviews.len() - approved,
        top_categories,
        recent_trends,
    }
}
