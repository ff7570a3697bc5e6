//! Review-turnaround reporting for a single repository.
//!
//! `StatisticsReporter` is the entry point. A run:
//! 1. Checks that the repository is accessible.
//! 2. Lists every closed pull request.
//! 3. Keeps those created inside the review window that were merged.
//! 4. Fetches the reviews of each one in turn and folds them into [`ReviewStats`].
//!
//! Failures in steps 1 and 2 abort the run with an [`AccessError`]. A failed
//! review fetch only skips that pull request.

use crate::config::AppConfig;
use crate::github::{PullRequestSource, SourceError};
use crate::metrics::{self, FirstApproval, ReviewFetchFailure, ReviewReport, ReviewStats};
use crate::types::RepoId;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

const NOT_FOUND_HINT: &str =
    "Please check if the repository exists and if you have the correct permissions.";

/// Why a run stopped before computing any statistics.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Repository not found: {0}\n{hint}", hint = NOT_FOUND_HINT)]
    RepositoryNotFound(RepoId),
    #[error("Authentication failed. Please check your GitHub token.")]
    AuthenticationFailed,
    #[error("Error accessing repository: {0}")]
    Repository(SourceError),
    #[error("Error fetching pull requests: {0}")]
    PullRequests(SourceError),
}

pub struct StatisticsReporter<S> {
    source: S,
    window: Duration,
    first_approval: FirstApproval,
}

impl<S: PullRequestSource> StatisticsReporter<S> {
    pub fn new(source: S, config: &AppConfig) -> Self {
        let first_approval = if config.sort_approvals_by_submission {
            FirstApproval::EarliestSubmitted
        } else {
            FirstApproval::ApiOrder
        };

        Self {
            source,
            window: config.review_window(),
            first_approval,
        }
    }

    /// Computes the statistics and prints them to stdout.
    ///
    /// Access failures are printed to stderr instead; they are not returned to the caller.
    pub async fn report(&self, repo_id: &RepoId) {
        match self.collect(repo_id, Utc::now()).await {
            Ok(report) => print!("\n{report}"),
            Err(e) => eprintln!("{e}"),
        }
    }

    /// Runs the whole fetch-and-aggregate procedure relative to `now`.
    pub async fn collect(
        &self,
        repo_id: &RepoId,
        now: DateTime<Utc>,
    ) -> Result<ReviewReport, AccessError> {
        tracing::info!("Fetching PR statistics for {}...", repo_id);

        self.source
            .get_repository(repo_id)
            .await
            .map_err(|e| match e {
                SourceError::NotFound(_) => AccessError::RepositoryNotFound(repo_id.clone()),
                SourceError::Unauthorized(_) => AccessError::AuthenticationFailed,
                other => AccessError::Repository(other),
            })?;

        let prs = self
            .source
            .list_closed_pull_requests(repo_id)
            .await
            .map_err(AccessError::PullRequests)?;

        tracing::info!("Found {} closed PRs in total.", prs.len());

        let qualifying = metrics::recent_merged(&prs, self.window, now);

        tracing::info!(
            "{} PRs were created in the last {} days and merged.",
            qualifying.len(),
            self.window.num_days()
        );

        let mut stats = ReviewStats::new();
        let mut failures = Vec::new();

        for pr in &qualifying {
            match self.source.list_reviews(repo_id, pr.number).await {
                Ok(reviews) => {
                    tracing::debug!(pr = pr.number, reviews = reviews.len(), "Fetched reviews");
                    stats.record(pr, &reviews, self.first_approval);
                }
                Err(e) => {
                    tracing::error!(
                        pr = pr.number,
                        "Error fetching reviews for PR #{}: {}",
                        pr.number,
                        e
                    );
                    failures.push(ReviewFetchFailure {
                        number: pr.number,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(ReviewReport {
            window_days: self.window.num_days(),
            closed_pull_requests: prs.len(),
            qualifying_pull_requests: qualifying.len(),
            stats,
            failures,
        })
    }
}
