use crate::types::{PullRequestSummary, Review};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use std::fmt;

/// Login GitHub shows for reviews whose author account no longer exists.
pub const GHOST_LOGIN: &str = "ghost";

/// How the first approval of a pull request is chosen among its approvals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstApproval {
    /// The first approval in the order the API returned the reviews.
    #[default]
    ApiOrder,
    /// The approval with the earliest submission time.
    EarliestSubmitted,
}

/// Returns the pull requests created after `now - window` that were merged.
///
/// The order of the input is preserved. A window reaching past the earliest
/// representable date keeps every merged pull request.
pub fn recent_merged<'a>(
    prs: &'a [PullRequestSummary],
    window: Duration,
    now: DateTime<Utc>,
) -> Vec<&'a PullRequestSummary> {
    let cutoff = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    prs.iter()
        .filter(|pr| pr.created_at > cutoff && pr.merged_at.is_some())
        .collect()
}

/// Picks the first approval among `approvals`, which must already be filtered to approvals.
pub fn first_approval<'a>(approvals: &[&'a Review], order: FirstApproval) -> Option<&'a Review> {
    match order {
        FirstApproval::ApiOrder => approvals.first().copied(),
        // Approvals without a timestamp sort last.
        FirstApproval::EarliestSubmitted => approvals
            .iter()
            .copied()
            .min_by_key(|review| (review.submitted_at.is_none(), review.submitted_at)),
    }
}

/// Whole hours from `created_at` to `submitted_at`, truncated toward zero.
pub fn hours_between(created_at: DateTime<Utc>, submitted_at: DateTime<Utc>) -> i64 {
    (submitted_at - created_at).num_hours()
}

/// Running aggregates over the reviews of the qualifying pull requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewStats {
    total_first_approval_hours: f64,
    timed_pull_requests: u64,
    approval_counts: IndexMap<String, u64>,
}

impl ReviewStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the reviews of one pull request into the aggregates.
    ///
    /// Pull requests without approvals contribute nothing. Every approval is
    /// tallied for its reviewer, including repeated approvals by the same person.
    pub fn record(&mut self, pr: &PullRequestSummary, reviews: &[Review], order: FirstApproval) {
        let approvals: Vec<&Review> = reviews.iter().filter(|r| r.is_approval()).collect();

        let Some(first) = first_approval(&approvals, order) else {
            return;
        };

        match first.submitted_at {
            Some(submitted_at) => {
                self.total_first_approval_hours +=
                    hours_between(pr.created_at, submitted_at) as f64;
                self.timed_pull_requests += 1;
            }
            None => {
                tracing::warn!(pr = pr.number, "First approval has no submission time");
            }
        }

        for approval in approvals {
            let login = approval.reviewer.as_deref().unwrap_or(GHOST_LOGIN);
            *self.approval_counts.entry(login.to_string()).or_insert(0) += 1;
        }
    }

    /// Mean hours to first approval, or `None` when no pull request was timed.
    pub fn average_first_approval_hours(&self) -> Option<f64> {
        if self.timed_pull_requests == 0 {
            return None;
        }
        Some(self.total_first_approval_hours / self.timed_pull_requests as f64)
    }

    pub fn timed_pull_requests(&self) -> u64 {
        self.timed_pull_requests
    }

    /// Approvals per reviewer login, in order of first appearance.
    pub fn approval_counts(&self) -> &IndexMap<String, u64> {
        &self.approval_counts
    }
}

/// A pull request whose reviews could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewFetchFailure {
    pub number: u64,
    pub message: String,
}

/// The final statistics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewReport {
    pub window_days: i64,
    pub closed_pull_requests: usize,
    pub qualifying_pull_requests: usize,
    pub stats: ReviewStats,
    pub failures: Vec<ReviewFetchFailure>,
}

impl fmt::Display for ReviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "Closed PRs fetched: {}", self.closed_pull_requests)?;
        writeln!(
            f,
            "Number of approved PRs in the last {} days: {}",
            self.window_days, self.qualifying_pull_requests
        )?;
        match self.stats.average_first_approval_hours() {
            Some(avg) => writeln!(f, "Average first review time: {avg:.2} hours")?,
            None => writeln!(f, "Average first review time: no data")?,
        }

        writeln!(f)?;
        writeln!(f, "Approval counts by reviewer:")?;
        if self.stats.approval_counts().is_empty() {
            writeln!(f, "(none)")?;
        }
        for (reviewer, count) in self.stats.approval_counts() {
            writeln!(f, "{reviewer}: {count}")?;
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "PRs skipped after a review fetch error:")?;
            for failure in &self.failures {
                writeln!(f, "PR #{}: {}", failure.number, failure.message)?;
            }
        }
        Ok(())
    }
}
