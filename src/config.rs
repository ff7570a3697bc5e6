//! Application configuration and environment variable parsing.
//!
//! Settings are read from the process environment, which `main` first
//! populates from an optional `.env` file. Every field has a default so the
//! tool runs with no configuration at all; an absent token only means the
//! first GitHub call fails with an authentication error.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// GitHub Personal Access Token used for every API call.
    pub github_token: Option<String>,

    /// Alternative API base URL, e.g. for GitHub Enterprise.
    pub github_api_url: Option<String>,

    /// Length of the trailing window (in days) a pull request must have been created in.
    /// Must be positive and small enough to subtract from any current date.
    #[serde(
        default = "default_review_window_days",
        deserialize_with = "deserialize_review_window_days"
    )]
    pub review_window_days: i64,

    /// Pick the first approval by submission time instead of API order.
    #[serde(default)]
    pub sort_approvals_by_submission: bool,
}

fn default_review_window_days() -> i64 {
    30
}

fn deserialize_review_window_days<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let days = i64::deserialize(deserializer)?;
    validate_review_window_days(days).map_err(serde::de::Error::custom)
}

fn validate_review_window_days(days: i64) -> Result<i64, String> {
    if days < 1 {
        return Err(format!("REVIEW_WINDOW_DAYS must be positive, got {days}"));
    }

    // Anchored at the epoch so the bound does not depend on the clock.
    Duration::try_days(days)
        .and_then(|window| DateTime::<Utc>::UNIX_EPOCH.checked_sub_signed(window))
        .map(|_| days)
        .ok_or_else(|| format!("REVIEW_WINDOW_DAYS is out of range, got {days}"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: None,
            review_window_days: default_review_window_days(),
            sort_approvals_by_submission: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn review_window(&self) -> Duration {
        Duration::try_days(self.review_window_days).unwrap_or(Duration::MAX)
    }
}
