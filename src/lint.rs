use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("Failed to execute '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' failed with {status}")]
    Exited { command: String, status: ExitStatus },
}

/// Source of raw linter output
pub trait LintSource {
    async fn run(&self) -> Result<String, LintError>;
}

/// Runs flake8 as a subprocess and captures its stdout
pub struct Flake8 {
    command: String,
    args: Vec<String>,
}

impl Flake8 {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl LintSource for Flake8 {
    async fn run(&self) -> Result<String, LintError> {
        let command_line = self.command_line();
        debug!("Running {}", command_line);

        let output = Command::new(&self.command)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| LintError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!("{}: {}", self.command, line);
        }

        if !output.status.success() {
            return Err(LintError::Exited {
                command: command_line,
                status: output.status,
            });
        }

        trace!("Captured {} bytes of lint output", stdout.len());
        Ok(stdout)
    }
}
