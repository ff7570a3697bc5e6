use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pr_review_stats::config::AppConfig;
use pr_review_stats::github::{PullRequestSource, SourceError};
use pr_review_stats::types::{PullRequestSummary, RepoId, Review, ReviewState};
use pr_review_stats::{AccessError, StatisticsReporter};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    GetRepository,
    ListPullRequests,
    ListReviews(u64),
}

/// In-memory stand-in for GitHub that records every call it receives.
#[derive(Default)]
struct FakeSource {
    repository_error: Option<u16>,
    listing_error: Option<String>,
    pull_requests: Vec<PullRequestSummary>,
    reviews: HashMap<u64, Vec<Review>>,
    failing_reviews: HashSet<u64>,
    calls: Mutex<Vec<Call>>,
}

impl FakeSource {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestSource for &FakeSource {
    async fn get_repository(&self, _repo: &RepoId) -> Result<(), SourceError> {
        self.calls.lock().unwrap().push(Call::GetRepository);
        match self.repository_error {
            Some(status) => Err(SourceError::from_status(status, "Server Error")),
            None => Ok(()),
        }
    }

    async fn list_closed_pull_requests(
        &self,
        _repo: &RepoId,
    ) -> Result<Vec<PullRequestSummary>, SourceError> {
        self.calls.lock().unwrap().push(Call::ListPullRequests);
        match &self.listing_error {
            Some(message) => Err(SourceError::Other(message.clone())),
            None => Ok(self.pull_requests.clone()),
        }
    }

    async fn list_reviews(&self, _repo: &RepoId, number: u64) -> Result<Vec<Review>, SourceError> {
        self.calls.lock().unwrap().push(Call::ListReviews(number));
        if self.failing_reviews.contains(&number) {
            return Err(SourceError::Other("connection reset".to_string()));
        }
        Ok(self.reviews.get(&number).cloned().unwrap_or_default())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 9, 0, 0).unwrap()
}

fn repo_id() -> RepoId {
    RepoId::new("octo", "widgets")
}

fn merged_pr(number: u64, days_ago: i64) -> PullRequestSummary {
    let created_at = now() - Duration::days(days_ago);
    PullRequestSummary {
        number,
        created_at,
        merged_at: Some(created_at + Duration::hours(30)),
    }
}

fn approval(pr: &PullRequestSummary, hours: i64, reviewer: &str) -> Review {
    Review {
        state: ReviewState::Approved,
        submitted_at: Some(pr.created_at + Duration::hours(hours)),
        reviewer: Some(reviewer.to_string()),
    }
}

fn counts(report: &pr_review_stats::metrics::ReviewReport) -> Vec<(String, u64)> {
    report
        .stats
        .approval_counts()
        .iter()
        .map(|(login, count)| (login.clone(), *count))
        .collect()
}

#[tokio::test]
async fn test_three_pull_request_scenario() {
    let a = merged_pr(1, 10);
    let b = merged_pr(2, 40);
    let c = merged_pr(3, 5);

    let source = FakeSource {
        reviews: HashMap::from([
            (1, vec![approval(&a, 2, "alice")]),
            (2, vec![approval(&b, 1, "carol")]),
            (3, vec![approval(&c, 5, "alice"), approval(&c, 5, "bob")]),
        ]),
        pull_requests: vec![a, b, c],
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let report = reporter.collect(&repo_id(), now()).await.unwrap();

    assert_eq!(report.closed_pull_requests, 3);
    assert_eq!(report.qualifying_pull_requests, 2);
    assert_eq!(report.stats.average_first_approval_hours(), Some(3.5));
    assert_eq!(
        counts(&report),
        vec![("alice".to_string(), 2), ("bob".to_string(), 1)]
    );
    assert!(report.to_string().contains("Average first review time: 3.50 hours"));

    // The out-of-window pull request is never asked for reviews.
    assert!(!source.calls().contains(&Call::ListReviews(2)));
}

#[tokio::test]
async fn test_unmerged_pull_requests_are_excluded() {
    let mut open = merged_pr(4, 2);
    open.merged_at = None;

    let source = FakeSource {
        reviews: HashMap::from([(4, vec![approval(&open, 1, "alice")])]),
        pull_requests: vec![open],
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let report = reporter.collect(&repo_id(), now()).await.unwrap();

    assert_eq!(report.qualifying_pull_requests, 0);
    assert_eq!(report.stats.average_first_approval_hours(), None);
    assert!(report.stats.approval_counts().is_empty());
    assert!(report.to_string().contains("no data"));
    assert_eq!(
        source.calls(),
        vec![Call::GetRepository, Call::ListPullRequests]
    );
}

#[tokio::test]
async fn test_not_found_stops_before_listing() {
    let source = FakeSource {
        repository_error: Some(404),
        pull_requests: vec![merged_pr(1, 1)],
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let err = reporter.collect(&repo_id(), now()).await.unwrap_err();

    assert!(matches!(err, AccessError::RepositoryNotFound(ref id) if *id == repo_id()));
    assert!(err.to_string().starts_with("Repository not found: octo/widgets"));
    assert_eq!(source.calls(), vec![Call::GetRepository]);
}

#[tokio::test]
async fn test_unauthorized_stops_before_listing() {
    let source = FakeSource {
        repository_error: Some(401),
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let err = reporter.collect(&repo_id(), now()).await.unwrap_err();

    assert!(matches!(err, AccessError::AuthenticationFailed));
    assert_eq!(source.calls(), vec![Call::GetRepository]);
}

#[tokio::test]
async fn test_other_repository_error_keeps_message() {
    let source = FakeSource {
        repository_error: Some(500),
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let err = reporter.collect(&repo_id(), now()).await.unwrap_err();

    assert_eq!(err.to_string(), "Error accessing repository: Server Error");
    assert_eq!(source.calls(), vec![Call::GetRepository]);
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let source = FakeSource {
        listing_error: Some("API rate limit exceeded".to_string()),
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let err = reporter.collect(&repo_id(), now()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error fetching pull requests: API rate limit exceeded"
    );
    assert_eq!(
        source.calls(),
        vec![Call::GetRepository, Call::ListPullRequests]
    );
}

#[tokio::test]
async fn test_one_failed_review_fetch_does_not_abort() {
    let prs: Vec<PullRequestSummary> = (1..=5).map(|n| merged_pr(n, n as i64)).collect();
    let reviews = prs
        .iter()
        .map(|pr| (pr.number, vec![approval(pr, pr.number as i64, "alice")]))
        .collect();

    let source = FakeSource {
        pull_requests: prs,
        reviews,
        failing_reviews: HashSet::from([3]),
        ..Default::default()
    };

    let reporter = StatisticsReporter::new(&source, &AppConfig::default());
    let report = reporter.collect(&repo_id(), now()).await.unwrap();

    assert_eq!(report.qualifying_pull_requests, 5);
    assert_eq!(report.stats.timed_pull_requests(), 4);
    // (1 + 2 + 4 + 5) / 4
    assert_eq!(report.stats.average_first_approval_hours(), Some(3.0));
    assert_eq!(counts(&report), vec![("alice".to_string(), 4)]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].number, 3);
    assert_eq!(report.failures[0].message, "connection reset");
    assert!(report.to_string().contains("PR #3: connection reset"));

    let review_calls: Vec<Call> = source
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::ListReviews(_)))
        .collect();
    assert_eq!(
        review_calls,
        (1..=5).map(Call::ListReviews).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_first_approval_ordering_is_configurable() {
    let pr = merged_pr(9, 3);
    let reviews = vec![approval(&pr, 10, "alice"), approval(&pr, 2, "bob")];

    let source = FakeSource {
        reviews: HashMap::from([(9, reviews)]),
        pull_requests: vec![pr],
        ..Default::default()
    };

    let api_order = StatisticsReporter::new(&source, &AppConfig::default());
    let report = api_order.collect(&repo_id(), now()).await.unwrap();
    assert_eq!(report.stats.average_first_approval_hours(), Some(10.0));

    let config = AppConfig {
        sort_approvals_by_submission: true,
        ..AppConfig::default()
    };
    let chronological = StatisticsReporter::new(&source, &config);
    let report = chronological.collect(&repo_id(), now()).await.unwrap();
    assert_eq!(report.stats.average_first_approval_hours(), Some(2.0));
}

#[tokio::test]
async fn test_review_window_is_configurable() {
    let source = FakeSource {
        pull_requests: vec![merged_pr(1, 5), merged_pr(2, 10)],
        ..Default::default()
    };

    let config = AppConfig {
        review_window_days: 7,
        ..AppConfig::default()
    };
    let reporter = StatisticsReporter::new(&source, &config);
    let report = reporter.collect(&repo_id(), now()).await.unwrap();

    assert_eq!(report.window_days, 7);
    assert_eq!(report.qualifying_pull_requests, 1);
    assert!(report
        .to_string()
        .contains("Number of approved PRs in the last 7 days: 1"));
}
