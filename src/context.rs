use anyhow::{Context, bail};
use serde_json::Value;
use std::env;
use std::fs;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Repository and commit the check run lives on, taken from the Actions environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// `owner/repo`
    pub repository: String,
    /// Commit to look the check run up on
    pub sha: String,
    pub api_url: String,
}

impl RunContext {
    /// Read `GITHUB_REPOSITORY`, `GITHUB_SHA`, `GITHUB_EVENT_PATH` and `GITHUB_API_URL`
    pub fn from_env() -> anyhow::Result<Self> {
        let repository = env::var("GITHUB_REPOSITORY").context("GITHUB_REPOSITORY is not set")?;
        let event_sha = env::var("GITHUB_SHA").context("GITHUB_SHA is not set")?;
        let api_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let payload = match env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read event payload {}", path))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse event payload {}", path))?
            }
            _ => {
                debug!("No event payload, using GITHUB_SHA");
                Value::Null
            }
        };

        Self::new(repository, &payload, event_sha, api_url)
    }

    pub fn new(
        repository: String,
        payload: &Value,
        event_sha: String,
        api_url: String,
    ) -> anyhow::Result<Self> {
        validate_repository(&repository)?;
        let sha = resolve_sha(payload, event_sha);
        debug!("Resolved commit {} for {}", sha, repository);
        Ok(Self {
            repository,
            sha,
            api_url,
        })
    }
}

/// Pull request events compare against the base commit; everything else uses the event commit
pub fn resolve_sha(payload: &Value, event_sha: String) -> String {
    payload
        .pointer("/pull_request/base/sha")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(event_sha)
}

fn validate_repository(repository: &str) -> anyhow::Result<()> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(())
        }
        _ => bail!("Invalid repository '{}', expected owner/repo", repository),
    }
}
