use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use changelog_issues::config::Config;
use changelog_issues::outputs::ActionOutputs;
use changelog_issues::storage::MarkerStore;
use changelog_issues::sync::{run_sync, SyncOptions};
use changelog_issues::tracker::{GitHubClient, RepoSlug};

#[derive(Parser, Debug)]
#[command(
    name = "changelog-issues",
    about = "Create GitHub issues for new changelog RSS entries"
)]
struct Args {
    /// TOML config file (optional; flags override its values)
    #[arg(long, value_name = "FILE", default_value = "changelog-issues.toml")]
    config: PathBuf,

    /// RSS feed URL to poll
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// Repository receiving the issues (defaults to GITHUB_REPOSITORY)
    #[arg(long, value_name = "OWNER/REPO")]
    repo: Option<String>,

    /// Label added to every issue (empty to disable)
    #[arg(long)]
    label: Option<String>,

    /// File that stores the GUID of the last processed entry
    #[arg(long, value_name = "PATH")]
    store_location: Option<String>,

    /// Prefix for issue titles
    #[arg(long, value_name = "PREFIX")]
    issue_title_prefix: Option<String>,

    /// Label issues with the entry's changelog type and label
    #[arg(long)]
    auto_label: bool,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(v) = self.feed_url {
            config.feed_url = v;
        }
        if let Some(v) = self.repo {
            config.repo = Some(v);
        }
        if let Some(v) = self.label {
            config.label = v;
        }
        if let Some(v) = self.store_location {
            config.store_location = v;
        }
        if let Some(v) = self.issue_title_prefix {
            config.issue_title_prefix = v;
        }
        if let Some(v) = self.api_url {
            config.api_url = v;
        }
        config.auto_label |= self.auto_label;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config_path = args.config.clone();
    let config = args.apply(Config::load(&config_path).context("Failed to load configuration")?);
    tracing::debug!(config = ?config, "Resolved configuration");

    let token = config
        .resolve_token()
        .context("No GitHub token: set GITHUB_TOKEN or `token` in the config file")?;
    let repo: RepoSlug = config
        .resolve_repo()
        .context("No repository: pass --repo or set GITHUB_REPOSITORY")?
        .parse()?;

    let http = reqwest::Client::new();
    let tracker = GitHubClient::new(http.clone(), &config.api_url, repo, token)?;
    let marker = MarkerStore::new(&config.store_location);
    let options = SyncOptions {
        feed_url: config.feed_url.clone(),
        label: config.label.clone(),
        issue_title_prefix: config.issue_title_prefix.clone(),
        auto_label: config.auto_label,
    };

    tracing::info!(repo = %tracker.repo(), feed_url = %options.feed_url, "Starting sync");
    let report = run_sync(&http, &tracker, &marker, &options).await?;

    let outputs = ActionOutputs::from_env();
    if let Some(guid) = &report.last_processed_guid {
        outputs
            .set("last-processed-guid", guid)
            .context("Failed to write step output")?;
    }
    outputs
        .set("issues-created", &report.issues_created.to_string())
        .context("Failed to write step output")?;

    Ok(())
}
