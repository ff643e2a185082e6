//! One polling run: fetch the feed, file issues for new entries, advance the
//! marker.
//!
//! Entries are filed in feed order (newest first). The marker is advanced to
//! the newest GUID only after every new entry has been filed, so a failed
//! run is retried in full next time.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::feed::{fetch_changelog_feed, ChangelogEntry};
use crate::storage::MarkerStore;
use crate::tracker::{collect_labels, GitHubClient, NewIssue};

/// What to file and how to label it.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub feed_url: String,
    /// Added to every issue unless empty.
    pub label: String,
    pub issue_title_prefix: String,
    /// Also label issues with the entry's changelog type and label.
    pub auto_label: bool,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub issues_created: usize,
    /// Newest GUID in the feed, now stored in the marker. `None` when the
    /// feed had no entries.
    pub last_processed_guid: Option<String>,
}

/// Entries newer than `last_guid`.
///
/// Without a marker, or when the marker GUID is no longer in the feed,
/// every entry counts as new.
pub fn select_new_entries<'a>(
    entries: &'a [ChangelogEntry],
    last_guid: Option<&str>,
) -> &'a [ChangelogEntry] {
    let Some(last_guid) = last_guid else {
        return entries;
    };
    match entries.iter().position(|e| e.guid == last_guid) {
        Some(index) => &entries[..index],
        None => entries,
    }
}

/// Markdown issue body for an entry.
pub fn render_issue_body(entry: &ChangelogEntry) -> String {
    format!(
        "# {title}\n\n{content}\n\n---\n\n🔗 [View original changelog entry]({link})\n📅 Published: {published}",
        title = entry.title,
        content = entry.content,
        link = entry.link,
        published = entry.pub_date,
    )
    .trim()
    .to_string()
}

/// Labels for an entry's issue: the base label, plus the changelog type and
/// label when auto-labelling is on.
pub fn issue_labels(entry: &ChangelogEntry, base_label: &str, auto_label: bool) -> Vec<String> {
    let mut candidates = vec![Some(base_label)];
    if auto_label {
        candidates.push(entry.changelog_type.as_deref());
        candidates.push(entry.changelog_label.as_deref());
    }
    collect_labels(candidates)
}

pub async fn run_sync(
    http: &reqwest::Client,
    tracker: &GitHubClient,
    marker: &MarkerStore,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let last_guid = match marker.load() {
        Ok(Some(guid)) => {
            tracing::info!(guid = %guid, "Last processed changelog entry");
            Some(guid)
        }
        Ok(None) => {
            tracing::info!("No previously processed entries found");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Error reading last processed entry");
            None
        }
    };

    let entries = fetch_changelog_feed(http, &options.feed_url).await?;

    let new_entries = select_new_entries(&entries, last_guid.as_deref());
    tracing::info!(count = new_entries.len(), "Found new entries to process");

    let mut ensured: HashSet<String> = HashSet::new();
    let mut issues_created = 0;

    for entry in new_entries {
        let labels = issue_labels(entry, &options.label, options.auto_label);
        let missing: Vec<String> = labels
            .iter()
            .filter(|l| !ensured.contains(*l))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracker.ensure_labels(&missing).await;
            ensured.extend(missing);
        }

        let issue = NewIssue {
            title: format!("{}{}", options.issue_title_prefix, entry.title),
            body: render_issue_body(entry),
            labels,
        };
        let number = tracker
            .create_issue(&issue)
            .await
            .with_context(|| format!("Failed to create issue for entry '{}'", entry.title))?;

        issues_created += 1;
        tracing::info!(issue = number, title = %entry.title, "Created issue for entry");
    }

    let last_processed_guid = match entries.first() {
        Some(latest) => {
            marker
                .save(&latest.guid)
                .context("Failed to store last processed entry")?;
            tracing::info!(
                guid = %latest.guid,
                path = %marker.path().display(),
                "Updated last processed entry"
            );
            Some(latest.guid.clone())
        }
        None => None,
    };

    tracing::info!(issues_created, "Sync finished");
    Ok(SyncReport {
        issues_created,
        last_processed_guid,
    })
}
