use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use super::labels::label_color;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("changelog-issues/", env!("CARGO_PKG_VERSION"));
const LABEL_DESCRIPTION: &str = "Auto-created label";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid repository '{0}': expected OWNER/REPO")]
    InvalidRepo(String),

    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("GitHub request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },
}

/// `owner/repo` pair identifying the repository that receives issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoSlug {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(TrackerError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Issue to be filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NewLabel<'a> {
    name: &'a str,
    color: String,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Minimal GitHub REST client for labels and issues of one repository.
///
/// SEC-015: the token is only exposed when building the `Authorization`
/// header; `Debug` output redacts it.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    repo: RepoSlug,
    token: SecretString,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base.as_str())
            .field("repo", &self.repo)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitHubClient {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        repo: RepoSlug,
        token: SecretString,
    ) -> Result<Self, TrackerError> {
        let api_base =
            Url::parse(api_base).map_err(|e| TrackerError::InvalidApiUrl(format!("{api_base}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(TrackerError::InvalidApiUrl(api_base.to_string()));
        }
        Ok(Self {
            http,
            api_base,
            repo,
            token,
        })
    }

    pub fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    /// Makes sure every label exists, creating missing ones.
    ///
    /// Failures are logged and skipped: a missing label must not prevent the
    /// issue itself from being filed.
    pub async fn ensure_labels(&self, labels: &[String]) {
        for name in labels {
            match self.get_label(name).await {
                Ok(()) => tracing::debug!(label = %name, "Label already exists"),
                Err(TrackerError::Api { status: 404, .. }) => match self.create_label(name).await {
                    Ok(()) => tracing::info!(label = %name, "Created label"),
                    Err(e) => tracing::warn!(label = %name, error = %e, "Failed to create label"),
                },
                Err(e) => tracing::warn!(label = %name, error = %e, "Error checking label"),
            }
        }
    }

    /// Files an issue and returns its number.
    pub async fn create_issue(&self, issue: &NewIssue) -> Result<u64, TrackerError> {
        let url = self.endpoint(&["issues"])?;
        let response = self.request(reqwest::Method::POST, url).json(issue).send().await?;
        let created: CreatedIssue = check_status(response).await?.json().await?;
        Ok(created.number)
    }

    async fn get_label(&self, name: &str) -> Result<(), TrackerError> {
        let url = self.endpoint(&["labels", name])?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn create_label(&self, name: &str) -> Result<(), TrackerError> {
        let url = self.endpoint(&["labels"])?;
        let body = NewLabel {
            name,
            color: label_color(name),
            description: LABEL_DESCRIPTION,
        };
        let response = self.request(reqwest::Method::POST, url).json(&body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// `{api_base}/repos/{owner}/{repo}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TrackerError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| TrackerError::InvalidApiUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);
    Err(TrackerError::Api {
        status: status.as_u16(),
        message,
    })
}
