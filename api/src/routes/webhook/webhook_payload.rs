//! Inbound GitHub pull-request webhook payload (the subset we read).

use pr_review::PullRequestRef;
use pr_review::errors::Error;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestPayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub head: Option<CommitRef>,
    #[serde(default)]
    pub base: Option<BaseRef>,
}

#[derive(Debug, Deserialize)]
pub struct CommitRef {
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BaseRef {
    #[serde(default)]
    pub repo: Option<RepoRef>,
}

#[derive(Debug, Deserialize)]
pub struct RepoRef {
    #[serde(default)]
    pub url: Option<String>,
}

impl WebhookEvent {
    /// Extracts the PR coordinates, failing fast on any missing field.
    pub fn pull_request_ref(&self) -> Result<PullRequestRef, Error> {
        let pr = self
            .pull_request
            .as_ref()
            .ok_or(Error::Payload("pull_request"))?;
        let pr_api_url = pr.url.clone().ok_or(Error::Payload("pull_request.url"))?;
        let number = pr.number.ok_or(Error::Payload("pull_request.number"))?;
        let head_sha = pr
            .head
            .as_ref()
            .and_then(|h| h.sha.clone())
            .ok_or(Error::Payload("pull_request.head.sha"))?;
        let repo_api_url = pr
            .base
            .as_ref()
            .and_then(|b| b.repo.as_ref())
            .and_then(|r| r.url.clone())
            .ok_or(Error::Payload("pull_request.base.repo.url"))?;

        Ok(PullRequestRef {
            pr_api_url,
            repo_api_url,
            head_sha,
            number,
        })
    }
}
