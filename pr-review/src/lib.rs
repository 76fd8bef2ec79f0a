//! Pull-request review pipeline: webhook-driven fetch, per-file diff
//! sections, and comment publishing against the GitHub REST API.
//!
//! 1) **Gather** — list the PR's changed files (API order preserved).
//! 2) **Per-file** — fetch head content, reconstruct the pre-image from the
//!    GitHub patch fragment, and render a unified-diff section; fetch or
//!    format errors skip only that file.
//! 3) **Assemble** — fixed header, sections in file order, bullets for the
//!    rest.
//! 4) **Publish** — one issue comment on the PR (HTTP 201 only).
//!
//! The `narrative` mode replaces 1–3 with a single whole-diff fetch sent to
//! the completions API, posting its feedback verbatim. The pipeline uses
//! `tracing` for step logging and plain `async fn` throughout (no
//! async-trait, no boxed futures).

pub mod errors;
pub mod format;
pub mod github;
pub mod patch;

use completions::ChatCompletionClient;
use tracing::{debug, info, warn};

use errors::{Error, ReviewResult};
use github::GitHubClient;

/// How the published comment is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    /// Whole-diff narrative feedback from the completions API.
    Narrative,
    /// Per-file structural summary; no completion call.
    StructuralSummary,
}

impl std::str::FromStr for ReviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrative" => Ok(Self::Narrative),
            "structural-summary" => Ok(Self::StructuralSummary),
            other => Err(format!("unknown review mode `{other}`")),
        }
    }
}

/// Pull request coordinates extracted from the webhook payload.
/// Immutable for the lifetime of one review pass.
#[derive(Debug, Clone)]
pub struct PullRequestRef {
    /// API URL of the pull request itself.
    pub pr_api_url: String,
    /// API URL of the base repository.
    pub repo_api_url: String,
    /// Head commit SHA the review runs against.
    pub head_sha: String,
    /// Pull request number (shared with the issues namespace).
    pub number: u64,
}

/// Counters describing what one review pass did.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewOutcome {
    pub files_total: usize,
    pub sections: usize,
    pub skipped: usize,
}

/// Runs one full review pass for a pull request and posts the comment.
///
/// `http` is the shared process-wide client; it is cloned (cheaply) into a
/// per-request [`GitHubClient`], never closed here.
pub async fn review_pull_request(
    http: &reqwest::Client,
    token: &str,
    mode: ReviewMode,
    llm: Option<&ChatCompletionClient>,
    pr: &PullRequestRef,
) -> ReviewResult<ReviewOutcome> {
    let gh = GitHubClient::new(http.clone(), token.to_string());
    match mode {
        ReviewMode::Narrative => narrative_review(&gh, llm, pr).await,
        ReviewMode::StructuralSummary => structural_review(&gh, pr).await,
    }
}

/// Fetches the whole PR diff, asks the completions API for feedback, and
/// posts the feedback as the comment.
async fn narrative_review(
    gh: &GitHubClient,
    llm: Option<&ChatCompletionClient>,
    pr: &PullRequestRef,
) -> ReviewResult<ReviewOutcome> {
    let llm = llm.ok_or(Error::CompletionUnavailable)?;

    let diff = gh.fetch_pull_request_diff(&pr.pr_api_url).await?;
    debug!(bytes = diff.len(), "fetched pull request diff");

    let feedback = llm.review_diff(&diff).await?;
    gh.post_comment(&pr.repo_api_url, pr.number, &feedback)
        .await?;

    info!(pr = pr.number, "narrative review comment posted");
    Ok(ReviewOutcome::default())
}

/// Builds and posts the per-file structural summary.
async fn structural_review(gh: &GitHubClient, pr: &PullRequestRef) -> ReviewResult<ReviewOutcome> {
    let files = gh.fetch_changed_files(&pr.pr_api_url).await?;

    let mut sections = Vec::new();
    let mut bullets = Vec::new();
    let mut skipped = 0usize;

    for file in &files {
        let Some(patch_text) = file.patch.as_deref().filter(|p| !p.is_empty()) else {
            bullets.push(format::build_change_bullet(file));
            continue;
        };

        match gh
            .fetch_file_content(&pr.repo_api_url, &file.filename, &pr.head_sha)
            .await
        {
            Ok(content) => match format::build_file_section(&file.filename, patch_text, &content) {
                Some(section) => sections.push(section),
                None => bullets.push(format::build_change_bullet(file)),
            },
            Err(e) => {
                warn!(file = %file.filename, error = %e, "skipping file: content fetch failed");
                skipped += 1;
                bullets.push(format::build_skipped_bullet(&file.filename));
            }
        }
    }

    let outcome = ReviewOutcome {
        files_total: files.len(),
        sections: sections.len(),
        skipped,
    };

    let body = format::assemble_summary(&sections, &bullets);
    gh.post_comment(&pr.repo_api_url, pr.number, &body).await?;

    info!(
        pr = pr.number,
        files = outcome.files_total,
        sections = outcome.sections,
        skipped = outcome.skipped,
        "structural review comment posted"
    );
    Ok(outcome)
}
