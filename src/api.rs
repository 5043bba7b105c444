// src/api.rs
//! HTTP surface for the dashboard: fetch + cache per channel, filtered
//! list views, approval toggling, and the composed insights report.
//! Wire names are camelCase to match the frontend contract.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::aggregate::{build_aggregations, dashboard_stats, DashboardStats, ReviewAggregations};
use crate::dimensions::{unique_categories, unique_channels, unique_listings, ListingRef};
use crate::filters::{filter_reviews, sort_reviews};
use crate::insights::{insights_report, InsightsReport, IssueLexicon};
use crate::review::{
    DateRange, FilterOptions, NormalizedReview, RatingRange, SortDirection, SortField, SortOptions,
};
use crate::source::{collapse_near_duplicates, fetch_normalized, ReviewSource, DEDUP_SIMILARITY};
use crate::store::ReviewStore;
use crate::thresholds::InsightThresholds;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReviewStore>,
    pub sources: Arc<Vec<Box<dyn ReviewSource>>>,
    pub lexicon: Arc<IssueLexicon>,
    pub thresholds: Arc<InsightThresholds>,
}

impl AppState {
    pub fn new(sources: Vec<Box<dyn ReviewSource>>) -> Self {
        Self {
            store: Arc::new(ReviewStore::new()),
            sources: Arc::new(sources),
            lexicon: Arc::new(IssueLexicon::from_env()),
            thresholds: Arc::new(InsightThresholds::from_env()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // The shared segment is a channel tag on GET and a review id on
        // POST; the router requires one name per position.
        .route("/api/reviews", get(list_reviews))
        .route("/api/reviews/approvals", get(list_approvals))
        .route("/api/reviews/{id}", get(fetch_channel))
        .route("/api/reviews/{id}/approve", post(toggle_approval))
        .route("/api/insights", get(get_insights))
        .route("/api/stats", get(get_stats))
        .route("/api/dimensions", get(get_dimensions))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn err(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsResponse {
    reviews: Vec<NormalizedReview>,
    aggregations: ReviewAggregations,
}

/// GET /api/reviews/{channel} — fetch fresh from the named source,
/// merge the approval ledger, cache, respond with the channel snapshot.
async fn fetch_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let source = state
        .sources
        .iter()
        .find(|s| s.channel() == channel)
        .ok_or_else(|| err(StatusCode::NOT_FOUND, format!("unknown channel '{channel}'")))?;

    let fresh = fetch_normalized(source.as_ref())
        .await
        .map_err(|e| err(StatusCode::BAD_GATEWAY, format!("{channel} fetch failed: {e}")))?;

    // Collapse reviews the same guest already syndicated via another channel.
    let others: Vec<NormalizedReview> = state
        .store
        .snapshot()
        .into_iter()
        .filter(|r| r.channel != channel)
        .collect();
    let (fresh, dropped) = collapse_near_duplicates(&others, fresh, DEDUP_SIMILARITY);
    if dropped > 0 {
        counter!("reviews_dedup_total").increment(dropped as u64);
    }

    let reviews = state.store.replace_channel(&channel, fresh);
    let aggregations = build_aggregations(&reviews);
    Ok(Json(ReviewsResponse { reviews, aggregations }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListQuery {
    min_rating: Option<f64>,
    max_rating: Option<f64>,
    /// Comma-separated category names.
    category: Option<String>,
    /// Comma-separated channel tags.
    channel: Option<String>,
    start: Option<String>,
    end: Option<String>,
    listing_id: Option<String>,
    approved: Option<bool>,
    sort_by: Option<SortField>,
    direction: Option<SortDirection>,
    page: Option<usize>,
    page_size: Option<usize>,
}

impl ListQuery {
    fn filters(&self) -> FilterOptions {
        let rating = match (self.min_rating, self.max_rating) {
            (None, None) => None,
            (min, max) => Some(RatingRange {
                min: min.unwrap_or(0.0),
                max: max.unwrap_or(5.0),
            }),
        };
        let date_range = match (&self.start, &self.end) {
            (Some(start), Some(end)) => Some(DateRange {
                start: start.clone(),
                end: end.clone(),
            }),
            _ => None,
        };
        FilterOptions {
            rating,
            category: self.category.as_deref().map(split_csv),
            channel: self.channel.as_deref().map(split_csv),
            date_range,
            listing_id: self.listing_id.clone(),
            approved: self.approved,
        }
    }

    fn sort(&self) -> SortOptions {
        SortOptions {
            field: self.sort_by.unwrap_or(SortField::Date),
            direction: self.direction.unwrap_or(SortDirection::Desc),
        }
    }
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    reviews: Vec<NormalizedReview>,
    total: usize,
    page: usize,
    page_size: usize,
}

/// GET /api/reviews — cached reviews through filter → sort → paginate.
async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    counter!("review_list_requests_total").increment(1);

    let snapshot = state.store.snapshot();
    let filtered = filter_reviews(&snapshot, &query.filters());
    let sorted = sort_reviews(&filtered, &query.sort());

    let total = sorted.len();
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = (start + page_size).min(total);

    Json(ListResponse {
        reviews: sorted[start..end].to_vec(),
        total,
        page,
        page_size,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalResponse {
    id: String,
    manager_approved: bool,
}

/// POST /api/reviews/{id}/approve — flip the moderation flag.
async fn toggle_approval(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApprovalResponse> {
    let manager_approved = state.store.toggle_approval(&id);
    counter!("approvals_toggled_total").increment(1);
    tracing::info!(%id, approved = manager_approved, "approval toggled");
    Json(ApprovalResponse { id, manager_approved })
}

#[derive(Serialize)]
struct ApprovalsResponse {
    approvals: HashMap<String, bool>,
}

async fn list_approvals(State(state): State<AppState>) -> Json<ApprovalsResponse> {
    Json(ApprovalsResponse {
        approvals: state.store.approvals(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ScopeQuery {
    listing_id: Option<String>,
}

impl ScopeQuery {
    /// The caller-selected review set: everything, or one listing.
    fn select(&self, snapshot: &[NormalizedReview]) -> Vec<NormalizedReview> {
        match &self.listing_id {
            Some(_) => filter_reviews(
                snapshot,
                &FilterOptions {
                    listing_id: self.listing_id.clone(),
                    ..Default::default()
                },
            ),
            None => snapshot.to_vec(),
        }
    }
}

/// GET /api/insights — the four insight engines plus the histogram,
/// over all reviews or one listing's subset.
async fn get_insights(
    State(state): State<AppState>,
    Query(scope): Query<ScopeQuery>,
) -> Json<InsightsReport> {
    counter!("insight_reports_total").increment(1);
    let reviews = scope.select(&state.store.snapshot());
    Json(insights_report(
        &reviews,
        &state.lexicon,
        Utc::now(),
        &state.thresholds,
    ))
}

/// GET /api/stats — dashboard header statistics.
async fn get_stats(
    State(state): State<AppState>,
    Query(scope): Query<ScopeQuery>,
) -> Json<DashboardStats> {
    let reviews = scope.select(&state.store.snapshot());
    Json(dashboard_stats(&reviews))
}

#[derive(Serialize)]
struct DimensionsResponse {
    channels: Vec<String>,
    categories: Vec<String>,
    listings: Vec<ListingRef>,
}

/// GET /api/dimensions — distinct values for the filter controls.
async fn get_dimensions(State(state): State<AppState>) -> Json<DimensionsResponse> {
    let snapshot = state.store.snapshot();
    Json(DimensionsResponse {
        channels: unique_channels(&snapshot),
        categories: unique_categories(&snapshot),
        listings: unique_listings(&snapshot),
    })
}
