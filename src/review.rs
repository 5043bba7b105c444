// src/review.rs
//! Normalized review schema shared by every engine and the API layer.
//!
//! Reviews arrive already normalized (see `source`): whatever the channel,
//! they satisfy this shape before the engines ever see them. Ratings are on
//! a 0–5 scale or absent; `submitted_at` is an ISO-8601 string that may be
//! malformed — helpers degrade to `None` instead of failing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sub-score attached to a named aspect (cleanliness, communication, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRating {
    pub category: String,
    pub rating: f64,
}

/// The unit of work for every engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReview {
    pub id: String,
    /// Stable across source channels; groups reviews under one listing.
    pub property_id: String,
    pub listing_name: String,
    /// Origin tag: "hostaway", "airbnb", "google", "booking", or other.
    pub channel: String,
    /// Overall rating on a 0–5 scale; `None` when the guest left no rating.
    pub rating: Option<f64>,
    #[serde(default)]
    pub categories: Vec<CategoryRating>,
    pub text: Option<String>,
    /// ISO-8601 timestamp string. Kept verbatim; parse via `instant()`.
    pub submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    /// The only mutable field: moderation flag toggled via the approval API.
    pub manager_approved: bool,
}

impl NormalizedReview {
    /// Parse `submitted_at` into an instant. `None` on malformed input —
    /// callers treat that as "comparisons evaluate false".
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.submitted_at)
    }

    /// `YYYY-MM` bucket key, by truncating the timestamp string.
    /// `None` when the prefix does not look like a month key.
    pub fn month_key(&self) -> Option<&str> {
        let s = self.submitted_at.as_bytes();
        if s.len() >= 7
            && s[..4].iter().all(|b| b.is_ascii_digit())
            && s[4] == b'-'
            && s[5].is_ascii_digit()
            && s[6].is_ascii_digit()
        {
            return Some(&self.submitted_at[..7]);
        }
        None
    }
}

/// Tolerant ISO-8601 parse: RFC 3339 first, then naive date-time variants
/// (assumed UTC), then a bare date.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Sparse filter criteria; absent fields impose no constraint.
/// Present fields combine with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<RatingRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

/// Inclusive bounds as ISO-8601 strings; a malformed bound constrains nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Rating,
    Date,
    GuestName,
    ListingName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    pub field: SortField,
    pub direction: SortDirection,
}
