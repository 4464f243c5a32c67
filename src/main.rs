mod action;
mod checks;
mod cli;
mod config;
mod context;
mod lint;
mod parser;
mod types;

use action::{Outcome, Settings, Target};
use anyhow::Context;
use checks::{GitHubClient, Publisher};
use clap::Parser;
use cli::{Cli, Commands, ParseArgs, RunArgs};
use config::Config;
use context::RunContext;
use lint::Flake8;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run(args) => {
            if let Outcome::Failed(message) = run(args).await {
                println!("{}", action::workflow_error(&message));
                std::process::exit(EXIT_FAILURE);
            }
            info!("flake8 passed");
        }
        Commands::Parse(args) => {
            if let Err(e) = parse(args) {
                error!("{:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
    }
}

async fn run(args: RunArgs) -> Outcome {
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => return Outcome::Failed(format!("{:#}", e)),
    };

    let lint = Flake8::new(config.lint.command, config.lint.args);
    let settings = Settings {
        check_name: args.check_name,
        title: args.title.unwrap_or(config.check.title),
        dry_run: args.dry_run,
    };
    let selection = config.check.selection;
    let token = args.token;

    let connect = move || -> anyhow::Result<Target<GitHubClient>> {
        let token = token.context("GITHUB_TOKEN is not set")?;
        let ctx = RunContext::from_env()?;
        let client = GitHubClient::new(ctx.api_url, ctx.repository, token);
        Ok(Target {
            publisher: Publisher::new(client, selection),
            sha: ctx.sha,
        })
    };

    action::run_action(&lint, connect, &settings).await
}

fn parse(args: ParseArgs) -> anyhow::Result<()> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?,
    };
    let annotations = parser::parse(&raw);
    info!("Parsed {} annotations", annotations.len());
    println!("{}", serde_json::to_string_pretty(&annotations)?);
    Ok(())
}
