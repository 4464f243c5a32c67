use crate::types::{Annotation, CheckRun, CheckRunOutput};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("flake8-checks/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("No check run named '{check_name}' found for commit {sha}")]
    CheckRunNotFound { check_name: String, sha: String },
    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Check runs API of the hosting service
pub trait ChecksApi {
    /// List check runs named `check_name` on commit `sha`
    async fn list_check_runs(
        &self,
        sha: &str,
        check_name: &str,
    ) -> Result<Vec<CheckRun>, PublishError>;

    /// Replace the output of check run `id`
    async fn update_check_run(&self, id: u64, output: &CheckRunOutput)
    -> Result<(), PublishError>;
}

/// Which check run to update when several share a name on one commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckRunSelection {
    /// First run returned by the API
    #[default]
    First,
    /// Highest id, i.e. the most recently created run
    MostRecent,
}

impl CheckRunSelection {
    fn select<'a>(&self, runs: &'a [CheckRun]) -> Option<&'a CheckRun> {
        match self {
            Self::First => runs.first(),
            Self::MostRecent => runs.iter().max_by_key(|r| r.id),
        }
    }
}

/// Summary line of the check run output.
pub fn summary(count: usize) -> String {
    format!("{} errors(s) found", count)
}

/// Updates an existing check run with annotations. Never creates one.
pub struct Publisher<C: ChecksApi> {
    client: C,
    selection: CheckRunSelection,
}

impl<C: ChecksApi> Publisher<C> {
    pub fn new(client: C, selection: CheckRunSelection) -> Self {
        Self { client, selection }
    }

    /// Find the check run for `sha` by name and replace its output.
    /// Returns the id of the updated run.
    pub async fn publish(
        &self,
        sha: &str,
        check_name: &str,
        title: &str,
        annotations: Vec<Annotation>,
    ) -> Result<u64, PublishError> {
        debug!("Looking up check run '{}' on {}", check_name, sha);
        let runs = self.client.list_check_runs(sha, check_name).await?;
        trace!("Found {} check runs: {:?}", runs.len(), runs);

        let run = self
            .selection
            .select(&runs)
            .ok_or_else(|| PublishError::CheckRunNotFound {
                check_name: check_name.to_string(),
                sha: sha.to_string(),
            })?;
        debug!(
            "Selected check run {} '{}' (started {:?})",
            run.id, run.name, run.started_at
        );

        let output = CheckRunOutput {
            title: title.to_string(),
            summary: summary(annotations.len()),
            annotations,
        };
        info!(
            "Updating check run {} with {} annotations",
            run.id,
            output.annotations.len()
        );
        self.client.update_check_run(run.id, &output).await?;
        Ok(run.id)
    }
}

#[derive(Deserialize)]
struct ListCheckRunsResponse {
    check_runs: Vec<CheckRun>,
}

#[derive(Serialize)]
struct UpdateCheckRunRequest<'a> {
    output: &'a CheckRunOutput,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// GitHub REST implementation of [`ChecksApi`]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    repository: String,
    token: String,
}

impl GitHubClient {
    /// `repository` is `owner/repo`
    pub fn new(api_url: String, repository: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            repository,
            token,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Url, PublishError> {
        let url = format!("{}/repos/{}{}", self.api_url, self.repository, path);
        let parsed = if params.is_empty() {
            reqwest::Url::parse(&url)
        } else {
            reqwest::Url::parse_with_params(&url, params)
        };
        parsed.map_err(|e| PublishError::InvalidUrl {
            url,
            message: e.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    Err(PublishError::Api {
        status: status.as_u16(),
        message,
    })
}

impl ChecksApi for GitHubClient {
    async fn list_check_runs(
        &self,
        sha: &str,
        check_name: &str,
    ) -> Result<Vec<CheckRun>, PublishError> {
        trace!("GET check-runs for {} (check_name={})", sha, check_name);
        let url = self.url(
            &format!("/commits/{}/check-runs", sha),
            &[("check_name", check_name)],
        )?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let body: ListCheckRunsResponse = check_status(response).await?.json().await?;
        Ok(body.check_runs)
    }

    async fn update_check_run(
        &self,
        id: u64,
        output: &CheckRunOutput,
    ) -> Result<(), PublishError> {
        trace!("PATCH check-runs/{}", id);
        let url = self.url(&format!("/check-runs/{}", id), &[])?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&UpdateCheckRunRequest { output })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
