//! Thin GitHub REST v3 client for the endpoints the review pipeline needs.
//!
//! Endpoints used:
//! - `GET  {pr_api_url}` with `Accept: application/vnd.github.v3.diff`
//! - `GET  {pr_api_url}/files`
//! - `GET  {repo_api_url}/contents/{path}?ref={sha}`
//! - `POST {repo_api_url}/issues/{number}/comments`
//!
//! The files listing is read as a single page; pull requests whose file list
//! spills past GitHub's first page come back truncated. Every call carries
//! the bearer token and the API version header; there are no retries.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Error, ReviewResult};

const API_VERSION: &str = "2022-11-28";
const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// One entry of the PR files listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    /// "added" | "removed" | "modified" | "renamed" | ...
    pub status: String,
    /// Unified diff fragment; absent for binary or rename-only changes.
    #[serde(default)]
    pub patch: Option<String>,
}

/// Authenticated GitHub client built around the shared process-wide
/// `reqwest` instance.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    token: String,
}

impl GitHubClient {
    pub fn new(http: Client, token: String) -> Self {
        Self { http, token }
    }

    fn get(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(reqwest::header::ACCEPT, accept)
    }

    /// Fetches the raw unified diff of the whole pull request.
    /// Succeeds only on HTTP 200.
    pub async fn fetch_pull_request_diff(&self, pr_api_url: &str) -> ReviewResult<String> {
        debug!(url = %pr_api_url, "fetching pull request diff");
        let resp = self.get(pr_api_url, ACCEPT_DIFF).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Lists changed files in API order. Single page only.
    pub async fn fetch_changed_files(&self, pr_api_url: &str) -> ReviewResult<Vec<ChangedFile>> {
        let url = format!("{pr_api_url}/files");
        debug!(url = %url, "fetching changed files");
        let resp = self.get(&url, ACCEPT_JSON).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        let files = resp.json::<Vec<ChangedFile>>().await?;
        Ok(files)
    }

    /// Fetches a file's text content at the given ref, decoding the base64
    /// `content` field of the contents API response.
    pub async fn fetch_file_content(
        &self,
        repo_api_url: &str,
        path: &str,
        git_ref: &str,
    ) -> ReviewResult<String> {
        let encoded_path = path
            .split('/')
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let url = format!(
            "{repo_api_url}/contents/{encoded_path}?ref={}",
            urlencoding::encode(git_ref)
        );
        debug!(url = %url, "fetching file content");
        let resp = self.get(&url, ACCEPT_JSON).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ContentsResponse = resp.json().await?;
        if payload.encoding != "base64" {
            return Err(Error::ContentFormat(format!(
                "unexpected contents encoding `{}` for {path}",
                payload.encoding
            )));
        }
        let raw = payload
            .content
            .ok_or_else(|| Error::ContentFormat(format!("missing `content` field for {path}")))?;

        // GitHub wraps the base64 body with newlines.
        let compact: String = raw.split_whitespace().collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| Error::ContentFormat(format!("invalid base64 for {path}: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ContentFormat(format!("non-utf8 content for {path}: {e}")))
    }

    /// Posts a single issue comment on the pull request.
    ///
    /// The endpoint is built from the base repo API URL and the PR number;
    /// pull requests share the issues comment namespace. Succeeds only on
    /// HTTP 201.
    pub async fn post_comment(
        &self,
        repo_api_url: &str,
        number: u64,
        body: &str,
    ) -> ReviewResult<()> {
        let url = format!("{repo_api_url}/issues/{number}/comments");
        debug!(url = %url, bytes = body.len(), "posting review comment");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .json(&CommentRequest { body })
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// Contents API response (subset of fields we use).
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: String,
}
