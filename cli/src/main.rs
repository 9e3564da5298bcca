//! trawl: case-insensitive pattern search across workspace roots.

mod config;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use trawl_tools::{CancellationToken, SearchEngine, SystemMatcher, WorkspaceScope};
use trawl_types::{SearchOutcome, SearchRequest};

use crate::config::TrawlConfig;

#[derive(Debug, Parser)]
#[command(name = "trawl", version, about)]
struct Cli {
    /// Regular expression to search for (matched case-insensitively)
    pattern: String,

    /// File or directory to restrict the search to; relative paths start at the current
    /// directory
    path: Option<String>,

    /// Only search files matching this glob (ignored when PATH is a file)
    #[arg(long, short = 'g', value_name = "GLOB")]
    include: Option<String>,

    /// Workspace root to search; repeat for several roots
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Maximum matches reported across all roots
    #[arg(long, value_name = "N")]
    cap: Option<usize>,

    /// Matcher binary name or path
    #[arg(long, value_name = "PATH")]
    binary: Option<String>,

    /// Config file to use instead of ~/.trawl/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the full response as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the report; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}

fn exit_status(outcome: SearchOutcome) -> u8 {
    match outcome {
        SearchOutcome::Matches => 0,
        SearchOutcome::NoMatches => 1,
        SearchOutcome::Error => 2,
        SearchOutcome::Cancelled => 130,
    }
}

fn load_config(path: Option<&Path>) -> Result<TrawlConfig> {
    let loaded = match path {
        Some(path) => TrawlConfig::load_from(path)?
            .with_context(|| format!("config file not found: {}", path.display()))?,
        None => TrawlConfig::load()?.unwrap_or_default(),
    };
    Ok(loaded)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let tool_config = config
        .search_tool_config()
        .with_overrides(cli.binary, cli.cap, None);

    let cwd = env::current_dir().context("current directory is not accessible")?;
    let roots = if !cli.roots.is_empty() {
        cli.roots
    } else {
        let configured = config.roots();
        if configured.is_empty() {
            vec![cwd.clone()]
        } else {
            configured
        }
    };

    let scope = Arc::new(
        WorkspaceScope::new(roots, config.allow_outside_roots())
            .context("invalid workspace roots")?
            .with_working_dir(&cwd),
    );
    let provider = Arc::new(SystemMatcher::new(tool_config.binary.clone()));
    let engine = SearchEngine::new(tool_config, provider, scope.clone(), scope, cwd);

    let mut request = SearchRequest::new(cli.pattern).context("pattern must not be empty")?;
    if let Some(path) = cli.path {
        request = request.with_scope(path);
    }
    if let Some(glob) = cli.include {
        request = request.with_include(glob);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; cancelling search");
            on_interrupt.cancel();
        }
    });

    let response = engine.search(&request, &cancel).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.report);
        eprintln!("{}", response.status);
    }

    Ok(ExitCode::from(exit_status(response.outcome)))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_status(SearchOutcome::Error))
        }
    }
}
