// src/source/google.rs
//! Google Places reviews provider.
//!
//! Place Details payloads carry 1–5 integer ratings, unix-second
//! timestamps, and no category sub-ratings. The place is mapped onto a
//! listing at construction time (the caller knows which property a
//! `place_id` belongs to).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::ReviewSource;
use crate::review::NormalizedReview;

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    result: Place,
}

#[derive(Debug, Deserialize)]
struct Place {
    place_id: String,
    #[serde(default)]
    reviews: Vec<PlaceReview>,
}

#[derive(Debug, Deserialize)]
struct PlaceReview {
    author_name: Option<String>,
    rating: Option<f64>,
    text: Option<String>,
    /// Unix seconds.
    time: Option<i64>,
}

pub struct GoogleClient {
    property_id: String,
    listing_name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        api_key: String,
        place_id: String,
        client: reqwest::Client,
    },
}

impl GoogleClient {
    pub fn from_fixture(
        property_id: impl Into<String>,
        listing_name: impl Into<String>,
        raw: &str,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            listing_name: listing_name.into(),
            mode: Mode::Fixture(raw.to_string()),
        }
    }

    pub fn from_api(
        property_id: impl Into<String>,
        listing_name: impl Into<String>,
        place_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            listing_name: listing_name.into(),
            mode: Mode::Http {
                api_key: api_key.into(),
                place_id: place_id.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse(&self, raw: &str) -> Result<Vec<NormalizedReview>> {
        let payload: PlaceDetailsResponse =
            serde_json::from_str(raw).context("parsing google place details")?;
        let place = payload.result;

        let mut out = Vec::with_capacity(place.reviews.len());
        for review in place.reviews {
            let time = review.time.unwrap_or(0);
            out.push(NormalizedReview {
                id: format!("google-{}-{}", place.place_id, time),
                property_id: self.property_id.clone(),
                listing_name: self.listing_name.clone(),
                channel: "google".into(),
                rating: review.rating.map(|r| r.clamp(0.0, 5.0)),
                categories: Vec::new(),
                text: review.text,
                submitted_at: to_iso(time),
                guest_name: review.author_name,
                manager_approved: false,
            });
        }
        Ok(out)
    }
}

fn to_iso(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[async_trait]
impl ReviewSource for GoogleClient {
    async fn fetch_reviews(&self) -> Result<Vec<NormalizedReview>> {
        match &self.mode {
            Mode::Fixture(raw) => self.parse(raw),
            Mode::Http {
                api_key,
                place_id,
                client,
            } => {
                let url = format!(
                    "https://maps.googleapis.com/maps/api/place/details/json?place_id={}&fields=place_id,name,reviews&key={}",
                    place_id, api_key
                );
                let body = client
                    .get(&url)
                    .send()
                    .await
                    .context("google get")?
                    .text()
                    .await
                    .context("google body")?;
                self.parse(&body)
            }
        }
    }

    fn channel(&self) -> &'static str {
        "google"
    }
}
