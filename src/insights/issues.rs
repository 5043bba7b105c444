// src/insights/issues.rs
//! Recurring-issue mining over free-text review comments.
//!
//! The dictionary (issue category → lowercase keyword substrings) is data,
//! not code: embedded from `issue_keywords.json` and overridable from a
//! file at runtime. A category is credited at most once per review; every
//! individual keyword hit is tallied separately to pick the category's
//! representative keyword for the display label.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::review::NormalizedReview;
use crate::thresholds::InsightThresholds;

pub const ENV_ISSUE_KEYWORDS_PATH: &str = "ISSUE_KEYWORDS_PATH";

static EMBEDDED: Lazy<IssueLexicon> = Lazy::new(|| {
    let raw = include_str!("../../issue_keywords.json");
    serde_json::from_str(raw).expect("valid embedded issue lexicon")
});

#[derive(Debug, Clone, Deserialize)]
pub struct IssueLexicon {
    pub categories: Vec<IssueCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCategory {
    pub name: String,
    /// Lowercase substrings, in priority order.
    pub keywords: Vec<String>,
}

impl IssueLexicon {
    /// The compiled-in default dictionary.
    pub fn embedded() -> &'static IssueLexicon {
        &EMBEDDED
    }

    /// Load from a JSON file; falls back to the embedded dictionary on
    /// any read or parse error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| EMBEDDED.clone()),
            Err(_) => EMBEDDED.clone(),
        }
    }

    /// `ISSUE_KEYWORDS_PATH` override, embedded dictionary otherwise.
    pub fn from_env() -> Self {
        match std::env::var(ENV_ISSUE_KEYWORDS_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_file(path),
            _ => EMBEDDED.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringIssue {
    /// Display label, e.g. `Noise issues (loud)`.
    pub issue: String,
    /// Number of reviews that credited the category.
    pub frequency: usize,
    pub severity: Severity,
    pub category: String,
}

/// Top recurring issues, most frequent first, capped at
/// `thresholds.max_recurring_issues`. Only categories credited by at
/// least `min_issue_frequency` reviews surface.
pub fn recurring_issues(
    reviews: &[NormalizedReview],
    lexicon: &IssueLexicon,
    thresholds: &InsightThresholds,
) -> Vec<RecurringIssue> {
    let mut category_counts = vec![0usize; lexicon.categories.len()];
    let mut keyword_counts: HashMap<(usize, usize), usize> = HashMap::new();

    for review in reviews {
        let Some(text) = review.text.as_deref() else { continue };
        if text.is_empty() {
            continue;
        }
        let text = text.to_lowercase();

        for (ci, category) in lexicon.categories.iter().enumerate() {
            let mut credited = false;
            for (ki, keyword) in category.keywords.iter().enumerate() {
                if text.contains(keyword.as_str()) {
                    *keyword_counts.entry((ci, ki)).or_insert(0) += 1;
                    if !credited {
                        category_counts[ci] += 1;
                        credited = true;
                    }
                }
            }
        }
    }

    let mut issues: Vec<RecurringIssue> = Vec::new();
    for (ci, category) in lexicon.categories.iter().enumerate() {
        let frequency = category_counts[ci];
        if frequency < thresholds.min_issue_frequency {
            continue;
        }

        // Representative keyword: the most frequently hit one, first in
        // dictionary order on ties.
        let mut best: Option<(usize, &str)> = None;
        for (ki, kw) in category.keywords.iter().enumerate() {
            if let Some(&n) = keyword_counts.get(&(ci, ki)) {
                if best.map(|(bn, _)| n > bn).unwrap_or(true) {
                    best = Some((n, kw.as_str()));
                }
            }
        }
        let keyword = best.map(|(_, kw)| kw).unwrap_or("general");

        let severity = if frequency >= thresholds.high_severity_frequency {
            Severity::High
        } else if frequency >= thresholds.medium_severity_frequency {
            Severity::Medium
        } else {
            Severity::Low
        };

        issues.push(RecurringIssue {
            issue: format!("{} issues ({})", category.name, keyword),
            frequency,
            severity,
            category: category.name.clone(),
        });
    }

    issues.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    issues.truncate(thresholds.max_recurring_issues);
    issues
}
