//! GitHub issue tracker integration.
//!
//! - [`github`] - REST client for label lookup/creation and issue creation
//! - [`labels`] - label color and label-set helpers

mod github;
mod labels;

pub use github::{GitHubClient, NewIssue, RepoSlug, TrackerError, DEFAULT_API_URL};
pub use labels::{collect_labels, label_color};
