use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser)]
#[command(name = "flake8-checks", version, about = "Publish flake8 findings as check run annotations", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: FLAKE8_CHECKS_LOG=] [default: info]
    #[arg(
        long,
        env = "FLAKE8_CHECKS_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run flake8 and annotate the check run with its findings
    Run(RunArgs),
    /// Parse saved flake8 output and print the annotations as JSON
    Parse(ParseArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Name of the check run to update
    #[arg(long, env = "INPUT_CHECKNAME")]
    pub check_name: Option<String>,

    /// GitHub token with checks:write permission
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Check run output title [default: from config, "flake8 failure"]
    #[arg(long)]
    pub title: Option<String>,

    /// Path to config file
    #[arg(long, default_value = "flake8-checks.toml")]
    pub config: String,

    /// Dry run: parse and report findings without touching the check run
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// File containing flake8 output (reads stdin if omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,
}
