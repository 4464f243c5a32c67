use crate::checks::{ChecksApi, Publisher, summary};
use crate::lint::LintSource;
use crate::parser;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info};

/// Final state of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
}

/// Publisher bound to the commit its check run lives on
pub struct Target<C: ChecksApi> {
    pub publisher: Publisher<C>,
    pub sha: String,
}

pub struct Settings {
    pub check_name: Option<String>,
    pub title: String,
    /// Parse and report, but skip the check runs API
    pub dry_run: bool,
}

/// Run the linter, and publish findings to the check run if there are any.
///
/// `connect` is only called once there is something to publish, so a clean
/// run never needs credentials or a commit.
pub async fn run_action<L, C, F>(lint: &L, connect: F, settings: &Settings) -> Outcome
where
    L: LintSource,
    C: ChecksApi,
    F: FnOnce() -> anyhow::Result<Target<C>>,
{
    let pipeline = AssertUnwindSafe(pipeline(lint, connect, settings));
    match pipeline.catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("{:#}", e);
            Outcome::Failed(format!("{:#}", e))
        }
        Err(payload) => {
            let message = format!(
                "An unexpected error occurred: {}",
                panic_message(payload.as_ref())
            );
            error!("{}", message);
            Outcome::Failed(message)
        }
    }
}

async fn pipeline<L, C, F>(lint: &L, connect: F, settings: &Settings) -> anyhow::Result<Outcome>
where
    L: LintSource,
    C: ChecksApi,
    F: FnOnce() -> anyhow::Result<Target<C>>,
{
    let output = lint.run().await?;
    let annotations = parser::parse(&output);
    if annotations.is_empty() {
        info!("No flake8 errors found");
        return Ok(Outcome::Passed);
    }

    let count = annotations.len();
    info!("Found {} annotations", count);
    for a in &annotations {
        info!(
            "{}:{}:{}: {}",
            a.path,
            a.start_line,
            a.start_column.unwrap_or_default(),
            a.message
        );
    }

    if settings.dry_run {
        info!("Dry run - skipping check run update");
    } else {
        let check_name = settings
            .check_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Input required and not supplied: checkName"))?;
        let target = connect()?;
        let id = target
            .publisher
            .publish(&target.sha, check_name, &settings.title, annotations)
            .await?;
        debug!("Check run {} updated", id);
    }

    Ok(Outcome::Failed(summary(count)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Format a message as a GitHub Actions `::error::` workflow command
pub fn workflow_error(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckRunSelection;
    use crate::checks::tests::FakeChecks;
    use crate::lint::LintError;
    use std::cell::Cell;

    struct FakeLint(&'static str);

    impl LintSource for FakeLint {
        async fn run(&self) -> Result<String, LintError> {
            Ok(self.0.to_string())
        }
    }

    struct PanickingLint;

    impl LintSource for PanickingLint {
        async fn run(&self) -> Result<String, LintError> {
            panic!("flake8 output stream closed");
        }
    }

    struct FailingLint;

    impl LintSource for FailingLint {
        async fn run(&self) -> Result<String, LintError> {
            Err(LintError::Spawn {
                command: "flake8 --exit-zero".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        }
    }

    fn settings() -> Settings {
        Settings {
            check_name: Some("lint".into()),
            title: "flake8 failure".into(),
            dry_run: false,
        }
    }

    fn target(fake: &FakeChecks) -> anyhow::Result<Target<&FakeChecks>> {
        Ok(Target {
            publisher: Publisher::new(fake, CheckRunSelection::First),
            sha: "base-sha".into(),
        })
    }

    #[tokio::test]
    async fn test_clean_run_never_connects() {
        let connected = Cell::new(false);
        let fake = FakeChecks::with_runs(&[1]);
        let outcome = run_action(
            &FakeLint("\n"),
            || {
                connected.set(true);
                target(&fake)
            },
            &settings(),
        )
        .await;

        assert_eq!(outcome, Outcome::Passed);
        assert!(!connected.get());
        assert!(fake.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_findings_publish_and_fail() {
        let fake = FakeChecks::with_runs(&[9]);
        let lint = FakeLint(
            "./app.py:12:5: E501 line too long\n./app.py:13:1: W391 blank line at end of file\n",
        );
        let outcome = run_action(&lint, || target(&fake), &settings()).await;

        assert_eq!(outcome, Outcome::Failed("2 errors(s) found".into()));
        let updates = fake.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.summary, "2 errors(s) found");
        assert_eq!(updates[0].1.annotations[0].message, "[E501] line too long");
    }

    #[tokio::test]
    async fn test_lookup_miss_fails_without_update() {
        let fake = FakeChecks::default();
        let lint = FakeLint("a.py:1:1: F401 os imported but unused\n");
        let outcome = run_action(&lint, || target(&fake), &settings()).await;

        assert_eq!(
            outcome,
            Outcome::Failed("No check run named 'lint' found for commit base-sha".into())
        );
        assert!(fake.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_skips_api() {
        let connected = Cell::new(false);
        let fake = FakeChecks::with_runs(&[1]);
        let settings = Settings {
            dry_run: true,
            ..settings()
        };
        let outcome = run_action(
            &FakeLint("a.py:1:1: F401 unused\n"),
            || {
                connected.set(true);
                target(&fake)
            },
            &settings,
        )
        .await;

        assert_eq!(outcome, Outcome::Failed("1 errors(s) found".into()));
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_missing_check_name() {
        let fake = FakeChecks::with_runs(&[1]);
        let settings = Settings {
            check_name: None,
            ..settings()
        };
        let outcome = run_action(
            &FakeLint("a.py:1:1: F401 unused"),
            || target(&fake),
            &settings,
        )
        .await;
        assert_eq!(
            outcome,
            Outcome::Failed("Input required and not supplied: checkName".into())
        );
    }

    #[tokio::test]
    async fn test_connect_error_is_reported() {
        let outcome = run_action(
            &FakeLint("a.py:1:1: F401 unused"),
            || -> anyhow::Result<Target<&'static FakeChecks>> {
                anyhow::bail!("GITHUB_SHA is not set")
            },
            &settings(),
        )
        .await;
        assert_eq!(outcome, Outcome::Failed("GITHUB_SHA is not set".into()));
    }

    #[tokio::test]
    async fn test_lint_failure_is_reported() {
        let fake = FakeChecks::default();
        let outcome = run_action(&FailingLint, || target(&fake), &settings()).await;
        assert_eq!(
            outcome,
            Outcome::Failed("Failed to execute 'flake8 --exit-zero': not found".into())
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_unexpected_error() {
        let fake = FakeChecks::default();
        let outcome = run_action(&PanickingLint, || target(&fake), &settings()).await;
        assert_eq!(
            outcome,
            Outcome::Failed("An unexpected error occurred: flake8 output stream closed".into())
        );
    }

    #[test]
    fn test_workflow_error_escapes_newlines() {
        assert_eq!(workflow_error("3 errors(s) found"), "::error::3 errors(s) found");
        assert_eq!(workflow_error("a\nb\r100%"), "::error::a%0Ab%0D100%25");
    }
}
