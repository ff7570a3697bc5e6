use clap::Parser;
use pr_review_stats::config::AppConfig;
use pr_review_stats::github::GitHubClient;
use pr_review_stats::types::{parse_name_segment, RepoId};
use pr_review_stats::{telemetry, StatisticsReporter};
use std::process::ExitCode;

/// Pull request review turnaround for a GitHub repository
#[derive(Parser)]
#[command(name = "pr-review-stats", version)]
#[command(
    about = "Counts recently merged PRs, time to first approval, and approvals per reviewer"
)]
#[command(long_about = r#"pr-review-stats - Review turnaround for a GitHub repository

ENVIRONMENT:
    GITHUB_TOKEN                    Personal access token (also read from .env)
    GITHUB_API_URL                  API base URL for GitHub Enterprise
    REVIEW_WINDOW_DAYS              Trailing window in days (default: 30)
    SORT_APPROVALS_BY_SUBMISSION    Pick the earliest-submitted approval as first"#)]
struct Args {
    /// Repository owner (user or organization)
    #[arg(value_parser = parse_name_segment)]
    owner: String,

    /// Repository name
    #[arg(value_parser = parse_name_segment)]
    repo: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    telemetry::init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("An unexpected error occurred: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let client = GitHubClient::new(&config)?;
    let reporter = StatisticsReporter::new(client, &config);

    reporter.report(&RepoId::new(args.owner, args.repo)).await;

    Ok(())
}
