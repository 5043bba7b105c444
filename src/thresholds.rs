// src/thresholds.rs
//! Named, overridable thresholds for the insight engines.
//!
//! Every constant that shapes trend classification, severity bucketing,
//! and alerting lives here instead of inline in the engines, so boundary
//! values can be tested and tuned without touching the scan code.
//! Loaded from TOML (`config/insights.toml` by default, path overridable
//! via `INSIGHTS_CONFIG_PATH`); missing file or field falls back to the
//! built-in defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INSIGHTS_CONFIG_PATH: &str = "config/insights.toml";
pub const ENV_INSIGHTS_CONFIG_PATH: &str = "INSIGHTS_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// A rating at or below this counts as an "issue" everywhere.
    pub low_rating_max: f64,
    /// Trailing window, in days, for "recent" signals.
    pub recent_window_days: i64,
    /// Issue-rate delta (percentage points) separating improving/concerning
    /// from stable in the category trend classification.
    pub trend_delta: f64,
    /// Issue rate above which a category is flagged as declining / alerted.
    pub problem_issue_rate: f64,
    /// Month-over-month average-rating delta behind the trend arrows.
    pub arrow_delta: f64,
    /// Month-over-month drop in average rating that triggers the
    /// declining-trend alert.
    pub monthly_drop: f64,
    /// Share of recent reviews with low ratings that triggers the
    /// low-rating-volume alert.
    pub low_rating_share: f64,
    /// Minimum credited frequency for a recurring issue to surface.
    pub min_issue_frequency: usize,
    /// Frequency at which a recurring issue becomes "medium" severity.
    pub medium_severity_frequency: usize,
    /// Frequency at which a recurring issue becomes "high" severity.
    pub high_severity_frequency: usize,
    /// Cap on the recurring-issues list.
    pub max_recurring_issues: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            low_rating_max: 3.0,
            recent_window_days: 30,
            trend_delta: 10.0,
            problem_issue_rate: 40.0,
            arrow_delta: 0.2,
            monthly_drop: 0.5,
            low_rating_share: 0.3,
            min_issue_frequency: 2,
            medium_severity_frequency: 3,
            high_severity_frequency: 5,
            max_recurring_issues: 8,
        }
    }
}

impl InsightThresholds {
    /// Load from the configured path, falling back to defaults when the
    /// file is absent or unreadable.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_INSIGHTS_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_INSIGHTS_CONFIG_PATH.to_string());
        match Self::load_from_file(&path) {
            Ok(thresholds) => thresholds,
            Err(err) => {
                tracing::debug!(error = ?err, path = %path, "insight thresholds: using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let parsed: Self = toml::from_str(&raw).context("parsing insight thresholds toml")?;
        Ok(parsed)
    }

    pub fn recent_window(&self) -> Duration {
        Duration::days(self.recent_window_days)
    }
}
