// src/source/mod.rs
//! Review source providers and the normalization funnel.
//!
//! Each provider turns one channel's raw payload into `NormalizedReview`
//! records; this module then scrubs the free text, collapses cross-channel
//! near-duplicates (the same guest's review syndicated to two channels),
//! and reports counters. Review text is never logged raw — dev logs carry
//! a short content hash instead.

pub mod google;
pub mod hostaway;

use std::collections::HashSet;

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use strsim::normalized_levenshtein;

use crate::review::NormalizedReview;

pub use google::GoogleClient;
pub use hostaway::HostawayClient;

/// Text similarity at or above this collapses two same-listing,
/// same-guest reviews from different channels into one.
pub const DEDUP_SIMILARITY: f64 = 0.9;

#[async_trait::async_trait]
pub trait ReviewSource: Send + Sync {
    async fn fetch_reviews(&self) -> Result<Vec<NormalizedReview>>;
    fn channel(&self) -> &'static str;
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("reviews_fetched_total", "Reviews parsed from source payloads.");
        describe_counter!("reviews_kept_total", "Reviews kept after normalization + dedup.");
        describe_counter!("reviews_dedup_total", "Reviews collapsed as cross-channel duplicates.");
        describe_counter!("source_errors_total", "Source fetch/parse errors.");
    });
}

/// Scrub review text: HTML entity decode, tag strip, typographic quote
/// normalization, whitespace collapse, length cap.
pub fn normalize_review_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // Length cap: 2000 chars
    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }

    out
}

/// Short anonymized id for dev logging (never log guest text raw).
pub fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Drop incoming reviews that near-duplicate a review the same guest
/// already left for the same listing through a *different* channel
/// (syndicated reviews). `existing` is the cached snapshot of the other
/// channels; earlier-kept incoming entries count as existing too.
pub fn collapse_near_duplicates(
    existing: &[NormalizedReview],
    incoming: Vec<NormalizedReview>,
    similarity: f64,
) -> (Vec<NormalizedReview>, usize) {
    let mut kept: Vec<NormalizedReview> = Vec::with_capacity(incoming.len());
    let mut dropped = 0usize;

    for review in incoming {
        let is_dup = existing
            .iter()
            .chain(kept.iter())
            .any(|prior| is_syndicated_pair(prior, &review, similarity));
        if is_dup {
            tracing::debug!(
                id = %review.id,
                text_id = %review.text.as_deref().map(anon_id).unwrap_or_default(),
                "dropping cross-channel duplicate"
            );
            dropped += 1;
            continue;
        }
        kept.push(review);
    }

    (kept, dropped)
}

fn is_syndicated_pair(prior: &NormalizedReview, candidate: &NormalizedReview, similarity: f64) -> bool {
    prior.property_id == candidate.property_id
        && prior.channel != candidate.channel
        && prior.guest_name.is_some()
        && prior.guest_name == candidate.guest_name
        && match (prior.text.as_deref(), candidate.text.as_deref()) {
            (Some(a), Some(b)) => {
                normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()) >= similarity
            }
            _ => false,
        }
}

/// Fetch one channel and run the normalization funnel: duplicate-id drop
/// and text scrub (empty text becomes `None`). Cross-channel collapse
/// happens at merge time, where the other channels' snapshot is known.
pub async fn fetch_normalized(source: &dyn ReviewSource) -> Result<Vec<NormalizedReview>> {
    ensure_metrics_described();

    let mut raw = match source.fetch_reviews().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, channel = source.channel(), "source fetch error");
            counter!("source_errors_total").increment(1);
            return Err(e);
        }
    };
    counter!("reviews_fetched_total").increment(raw.len() as u64);

    let mut seen_ids: HashSet<String> = HashSet::new();
    raw.retain(|r| seen_ids.insert(r.id.clone()));

    for review in raw.iter_mut() {
        if let Some(text) = review.text.take() {
            let scrubbed = normalize_review_text(&text);
            if !scrubbed.is_empty() {
                tracing::debug!(
                    id = %review.id,
                    text_id = %anon_id(&scrubbed),
                    channel = source.channel(),
                    "normalized review text"
                );
                review.text = Some(scrubbed);
            }
        }
    }

    counter!("reviews_kept_total").increment(raw.len() as u64);
    Ok(raw)
}
