//! Turn new changelog RSS entries into GitHub issues.
//!
//! - [`feed`] - fetch and parse the changelog feed
//! - [`sync`] - diff against the last run and file issues
//! - [`storage`] - last processed GUID marker
//! - [`tracker`] - GitHub REST client
//! - [`config`] - optional TOML configuration
//! - [`outputs`] - GitHub Actions step outputs

pub mod config;
pub mod feed;
pub mod outputs;
pub mod storage;
pub mod sync;
pub mod tracker;
