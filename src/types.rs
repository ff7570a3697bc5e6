use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The owner of the repository (e.g., "facebook").
    pub owner: String,
    /// The name of the repository (e.g., "react").
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

/// Checks one owner or repository name before it is placed into an API path.
///
/// Names are passed through unchanged; anything GitHub would not accept as a
/// name (path separators, `..`, whitespace, other punctuation) is rejected.
pub fn parse_name_segment(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value == "." || value.contains("..") {
        return Err(format!("'{value}' must not be '.' or contain '..'"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(format!("'{value}' contains the invalid character {c:?}"));
    }
    Ok(value.to_string())
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The subset of a GitHub pull request needed for review statistics.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PullRequestSummary {
    pub number: u64,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    Unknown,
}

/// A single review submitted on a pull request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Review {
    pub state: ReviewState,
    /// Missing while a review is still pending.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Login of the reviewer; `None` when the account has been deleted.
    pub reviewer: Option<String>,
}

impl Review {
    pub fn is_approval(&self) -> bool {
        self.state == ReviewState::Approved
    }
}
