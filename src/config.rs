//! Settings for a sync run, read from `changelog-issues.toml` when present.
//!
//! Every key has a default matching the hosted action, so a run against the
//! public changelog needs no file at all. Flags and the Actions environment
//! take precedence over the file.
use secrecy::SecretString;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::tracker::{RepoSlug, DEFAULT_API_URL};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Settings for one sync run.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// SEC-015: Custom Debug impl masks `token` to prevent secret leakage
/// in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RSS feed to poll.
    pub feed_url: String,

    /// Target repository as `owner/repo`. Falls back to `GITHUB_REPOSITORY`.
    pub repo: Option<String>,

    /// Label added to every issue. Empty string disables it.
    pub label: String,

    /// File holding the GUID of the last processed entry.
    pub store_location: String,

    /// Prepended to each entry title to form the issue title.
    pub issue_title_prefix: String,

    /// Also label issues with the entry's changelog type and label.
    pub auto_label: bool,

    /// GitHub REST API base URL (GitHub Enterprise: `https://HOST/api/v3`).
    pub api_url: String,

    /// GitHub token (alternative to GITHUB_TOKEN env var).
    /// Env var takes precedence over config file.
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: "https://github.blog/changelog/feed/".to_string(),
            repo: None,
            label: "changelog".to_string(),
            store_location: ".github/last-changelog-guid.txt".to_string(),
            issue_title_prefix: "GitHub Changelog: ".to_string(),
            auto_label: false,
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
        }
    }
}

/// SEC-015: Mask token in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("repo", &self.repo)
            .field("label", &self.label)
            .field("store_location", &self.store_location)
            .field("issue_title_prefix", &self.issue_title_prefix)
            .field("auto_label", &self.auto_label)
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "feed_url",
        "repo",
        "label",
        "store_location",
        "issue_title_prefix",
        "auto_label",
        "api_url",
        "token",
    ];

    /// Loads `path`, falling back to defaults when the file is missing or
    /// blank.
    ///
    /// Unknown keys are logged and ignored. `repo` must look like
    /// `owner/repo` and `store_location` must not be empty.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_bounded(path)? else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        };

        let table: toml::Table = content.parse()?;
        for key in table.keys().filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }

        let config = toml::Value::Table(table).try_into::<Config>()?;
        config.validate()?;
        tracing::info!(path = %path.display(), feed_url = %config.feed_url, "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(repo) = self.repo.as_deref().filter(|r| !r.trim().is_empty()) {
            repo.parse::<RepoSlug>().map_err(|e| ConfigError::Invalid {
                key: "repo",
                reason: e.to_string(),
            })?;
        }
        if self.store_location.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "store_location",
                reason: "path must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// GitHub token: `GITHUB_TOKEN` env var, then the config file.
    pub fn resolve_token(&self) -> Option<SecretString> {
        pick_non_empty(std::env::var("GITHUB_TOKEN").ok(), self.token.as_deref())
            .map(SecretString::from)
    }

    /// Target repository: config file / flag, then `GITHUB_REPOSITORY`.
    pub fn resolve_repo(&self) -> Option<String> {
        pick_non_empty(self.repo.clone(), std::env::var("GITHUB_REPOSITORY").ok().as_deref())
    }
}

/// SEC-014: reads at most `MAX_FILE_SIZE` bytes. `None` for a missing or
/// whitespace-only file.
fn read_bounded(path: &Path) -> Result<Option<String>, ConfigError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let mut content = String::new();
    file.take(Config::MAX_FILE_SIZE + 1).read_to_string(&mut content)?;
    if content.len() as u64 > Config::MAX_FILE_SIZE {
        return Err(ConfigError::TooLarge(format!(
            "more than {} bytes",
            Config::MAX_FILE_SIZE
        )));
    }

    Ok(Some(content).filter(|c| !c.trim().is_empty()))
}

fn pick_non_empty(first: Option<String>, fallback: Option<&str>) -> Option<String> {
    first
        .filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.filter(|v| !v.trim().is_empty()).map(str::to_string))
}

// ============================================================================
// Tests
// ============================================================================
