//! Changelog feed ingestion: fetching RSS over HTTP and normalizing items.
//!
//! - **Fetching**: single-attempt GET with a 10-second deadline
//! - **Parsing**: RSS 2.0 into [`ChangelogEntry`] records, tolerant of
//!   singleton/plural items and attributed `<guid>` elements
//! - **Labels**: title-casing of `changelog-label` categories with fixed
//!   spellings for acronyms and product names
//!
//! # Architecture
//!
//! - [`fetcher`] - HTTP retrieval with timeout and size limit
//! - [`xml`] - generic element tree over `quick-xml` events
//! - [`parser`] - RSS shape validation and item mapping
//! - [`label`] - label normalization
//!
//! # Example
//!
//! ```ignore
//! use changelog_issues::feed::fetch_changelog_feed;
//!
//! let client = reqwest::Client::new();
//! let entries = fetch_changelog_feed(&client, "https://github.blog/changelog/feed/").await?;
//! ```

mod fetcher;
mod label;
mod parser;
mod types;
mod xml;

pub use fetcher::{fetch, FETCH_TIMEOUT};
pub use label::normalize_label_case;
pub use parser::{parse, parse_entries, Diagnostics, TracingDiagnostics};
pub use types::{ChangelogEntry, FeedError, ParseError};

/// Fetches and parses the changelog feed at `feed_url`.
///
/// Parse failures are reported through [`TracingDiagnostics`] before the
/// error is returned. Either stage's error is returned unchanged.
pub async fn fetch_changelog_feed(
    client: &reqwest::Client,
    feed_url: &str,
) -> Result<Vec<ChangelogEntry>, FeedError> {
    fetch_changelog_feed_with(client, feed_url, &TracingDiagnostics).await
}

/// Like [`fetch_changelog_feed`], reporting parse failures to `diagnostics`.
pub async fn fetch_changelog_feed_with(
    client: &reqwest::Client,
    feed_url: &str,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<ChangelogEntry>, FeedError> {
    let xml = fetch(client, feed_url).await?;
    let entries = parse(&xml, diagnostics)?;
    tracing::info!(url = %feed_url, entries = entries.len(), "Found entries in the feed");
    Ok(entries)
}
