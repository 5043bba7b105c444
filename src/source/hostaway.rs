// src/source/hostaway.rs
//! Hostaway reviews provider.
//!
//! Raw payload: `{status, result: [...]}` with 0–10 category ratings,
//! `YYYY-MM-DD HH:MM:SS` timestamps, and a mix of guest-to-host and
//! host-to-guest entries. Only published guest-to-host reviews survive
//! normalization; ratings are halved onto the 0–5 scale.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::ReviewSource;
use crate::review::{CategoryRating, NormalizedReview};

#[derive(Debug, Deserialize)]
struct HostawayResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Vec<HostawayReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostawayReview {
    id: i64,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    /// Overall rating on Hostaway's 0–10 scale, often null.
    rating: Option<f64>,
    public_review: Option<String>,
    #[serde(default)]
    review_category: Vec<HostawayCategory>,
    submitted_at: Option<String>,
    guest_name: Option<String>,
    listing_name: Option<String>,
    listing_map_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HostawayCategory {
    category: String,
    rating: Option<f64>,
}

pub struct HostawayClient {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl HostawayClient {
    /// Serve a canned payload (dev fallback and tests).
    pub fn from_fixture(raw: &str) -> Self {
        Self {
            mode: Mode::Fixture(raw.to_string()),
        }
    }

    pub fn from_api(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                base_url: base_url.into(),
                api_key: api_key.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse(raw: &str) -> Result<Vec<NormalizedReview>> {
        let payload: HostawayResponse =
            serde_json::from_str(raw).context("parsing hostaway payload")?;
        if let Some(status) = payload.status.as_deref() {
            if status != "success" {
                anyhow::bail!("hostaway payload status: {status}");
            }
        }

        let mut out = Vec::with_capacity(payload.result.len());
        for item in payload.result {
            if let Some(review) = normalize(item) {
                out.push(review);
            }
        }
        Ok(out)
    }
}

fn normalize(raw: HostawayReview) -> Option<NormalizedReview> {
    // Host-to-guest and unpublished entries never reach the dashboard.
    if raw.kind.as_deref() != Some("guest-to-host") {
        return None;
    }
    if !matches!(raw.status.as_deref(), Some("published") | None) {
        return None;
    }

    let listing_name = raw
        .listing_name
        .unwrap_or_else(|| "Unknown Listing".to_string());
    let property_id = match raw.listing_map_id {
        Some(id) => format!("prop-{id}"),
        None => format!("prop-{}", slug(&listing_name)),
    };

    Some(NormalizedReview {
        id: format!("hostaway-{}", raw.id),
        property_id,
        listing_name,
        channel: "hostaway".into(),
        rating: raw.rating.map(half_scale),
        categories: raw
            .review_category
            .into_iter()
            .filter_map(|c| {
                c.rating.map(|r| CategoryRating {
                    category: c.category,
                    rating: half_scale(r),
                })
            })
            .collect(),
        text: raw.public_review,
        submitted_at: raw
            .submitted_at
            .map(|ts| to_iso(&ts))
            .unwrap_or_default(),
        guest_name: raw.guest_name,
        manager_approved: false,
    })
}

/// 0–10 → 0–5, one decimal, clamped.
fn half_scale(rating: f64) -> f64 {
    ((rating / 2.0).clamp(0.0, 5.0) * 10.0).round() / 10.0
}

/// `YYYY-MM-DD HH:MM:SS` → RFC 3339. Unparsable input passes through
/// verbatim; the engines tolerate it downstream.
fn to_iso(ts: &str) -> String {
    match chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => naive.and_utc().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        Err(_) => ts.to_string(),
    }
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

#[async_trait]
impl ReviewSource for HostawayClient {
    async fn fetch_reviews(&self) -> Result<Vec<NormalizedReview>> {
        match &self.mode {
            Mode::Fixture(raw) => Self::parse(raw),
            Mode::Http {
                base_url,
                api_key,
                client,
            } => {
                let url = format!("{}/v1/reviews", base_url.trim_end_matches('/'));
                let body = client
                    .get(&url)
                    .bearer_auth(api_key)
                    .send()
                    .await
                    .context("hostaway get")?
                    .text()
                    .await
                    .context("hostaway body")?;
                Self::parse(&body)
            }
        }
    }

    fn channel(&self) -> &'static str {
        "hostaway"
    }
}
