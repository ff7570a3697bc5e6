use crate::config::AppConfig;
use crate::types::{PullRequestSummary, RepoId, Review, ReviewState};
use async_trait::async_trait;
use octocrab::models::pulls::{PullRequest, Review as OctoReview, ReviewState as OctoReviewState};
use octocrab::{Octocrab, Page};
use thiserror::Error;

const PER_PAGE: u8 = 100;

/// A failed call to the remote platform, classified by HTTP status.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            404 => Self::NotFound(message.into()),
            401 => Self::Unauthorized(message.into()),
            _ => Self::Other(message.into()),
        }
    }
}

impl From<octocrab::Error> for SourceError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                Self::from_status(source.status_code.as_u16(), source.message.clone())
            }
            _ => Self::Other(err.to_string()),
        }
    }
}

/// The GitHub capabilities the statistics reporter depends on.
///
/// Implemented by [`GitHubClient`] for real runs; tests substitute their own.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Confirms the repository exists and is readable with the current credentials.
    async fn get_repository(&self, repo: &RepoId) -> Result<(), SourceError>;

    /// Lists every closed pull request, most recently updated first.
    async fn list_closed_pull_requests(
        &self,
        repo: &RepoId,
    ) -> Result<Vec<PullRequestSummary>, SourceError>;

    /// Lists every review of a pull request in the order GitHub returns them.
    async fn list_reviews(&self, repo: &RepoId, number: u64) -> Result<Vec<Review>, SourceError>;
}

#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = &config.github_token {
            builder = builder.personal_token(token.clone());
        }
        if let Some(url) = &config.github_api_url {
            builder = builder.base_uri(url.as_str())?;
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn get_repository(&self, repo: &RepoId) -> Result<(), SourceError> {
        let repository = self
            .octocrab
            .repos(&repo.owner, &repo.repo)
            .get()
            .await?;

        tracing::debug!(
            repo_id = %repo,
            full_name = ?repository.full_name,
            "Repository is accessible"
        );
        Ok(())
    }

    async fn list_closed_pull_requests(
        &self,
        repo: &RepoId,
    ) -> Result<Vec<PullRequestSummary>, SourceError> {
        let first_page = self
            .octocrab
            .pulls(&repo.owner, &repo.repo)
            .list()
            .state(octocrab::params::State::Closed)
            .sort(octocrab::params::pulls::Sort::Updated)
            .direction(octocrab::params::Direction::Descending)
            .per_page(PER_PAGE)
            .send()
            .await?;

        let prs: Vec<PullRequest> = self.octocrab.all_pages(first_page).await?;

        Ok(prs.iter().filter_map(summarize_pull_request).collect())
    }

    async fn list_reviews(&self, repo: &RepoId, number: u64) -> Result<Vec<Review>, SourceError> {
        let route = format!("/repos/{}/{}/pulls/{}/reviews", repo.owner, repo.repo, number);
        let first_page: Page<OctoReview> = self
            .octocrab
            .get(route, Some(&[("per_page", PER_PAGE)]))
            .await?;

        let reviews: Vec<OctoReview> = self.octocrab.all_pages(first_page).await?;

        Ok(reviews.into_iter().map(convert_review).collect())
    }
}

/// Converts an API pull request into our internal type.
///
/// Pull requests without a creation timestamp cannot be placed in the window and are dropped.
fn summarize_pull_request(pr: &PullRequest) -> Option<PullRequestSummary> {
    Some(PullRequestSummary {
        number: pr.number,
        created_at: pr.created_at?,
        merged_at: pr.merged_at,
    })
}

fn convert_review(review: OctoReview) -> Review {
    let state = match review.state {
        Some(OctoReviewState::Approved) => ReviewState::Approved,
        Some(OctoReviewState::ChangesRequested) => ReviewState::ChangesRequested,
        Some(OctoReviewState::Commented) => ReviewState::Commented,
        Some(OctoReviewState::Dismissed) => ReviewState::Dismissed,
        Some(OctoReviewState::Pending) => ReviewState::Pending,
        Some(_) | None => ReviewState::Unknown,
    };

    Review {
        state,
        submitted_at: review.submitted_at,
        reviewer: review.user.map(|user| user.login),
    }
}
