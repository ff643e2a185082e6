use serde::Serialize;
use thiserror::Error;

/// One changelog item, mapped 1:1 from an RSS `<item>`.
///
/// Values are copied from the feed as-is; only `changelog_label` is
/// normalized (see [`normalize_label_case`](super::normalize_label_case)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    pub title: String,
    pub link: String,
    /// Original `<pubDate>` text, never reformatted.
    pub pub_date: String,
    /// `content:encoded` when present, else `description`, else empty.
    pub content: String,
    /// Stable key used to detect previously processed entries.
    pub guid: String,
    /// `<category domain="changelog-type">`, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_type: Option<String>,
    /// `<category domain="changelog-label">`, title-cased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_label: Option<String>,
}

/// Errors produced while fetching or parsing a changelog feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP response with any status other than 200
    #[error("Failed to fetch feed: {0}")]
    FetchStatus(u16),
    /// Request plus body read exceeded the fetch deadline
    #[error("Request timed out after 10 seconds")]
    Timeout,
    /// Transport-level failure (DNS, connection reset, TLS, ...)
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body could not be turned into changelog entries
    #[error("Failed to parse RSS feed: {0}")]
    Parse(#[from] ParseError),
}

/// Reasons a feed document could not be mapped to entries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// Missing `<rss>`, `<channel>` or `<item>`.
    #[error("Invalid RSS feed structure")]
    InvalidStructure,

    /// An item lacks one of the required fields.
    #[error("item {index} is missing required <{field}>")]
    MissingField { index: usize, field: &'static str },
}
