//! Boots the application once, requests the form page and reports how much
//! memory the process needed. Useful for sizing a deployment target.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use axum::{body::Body, http::Request, http::StatusCode};
use clap::Parser;
use tower::ServiceExt;
use tracing::{error, info, warn};

use news_triage::config::Config;
use news_triage::memory;
use news_triage::routes::{self, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Measure the memory footprint of one request", long_about = None)]
struct Args {
    /// Path to the feeds configuration file
    #[arg(short, long, default_value = "feeds.toml")]
    config: PathBuf,

    /// Memory available on the deployment target, in MiB
    #[arg(short, long, default_value_t = 300.0)]
    budget_mb: f64,
}

async fn run(args: &Args) -> anyhow::Result<memory::MemoryUsage> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.apply_env_overrides();

    let before = memory::current_usage()?;
    info!("Resident memory before startup: {:.1} MiB", before.current_mb());

    let state = Arc::new(AppState::from_config(&config).await?);
    let app = routes::router(state);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    anyhow::ensure!(
        response.status() == StatusCode::OK,
        "GET / returned {}",
        response.status()
    );
    info!("GET / returned {}", response.status());

    memory::current_usage()
}

#[tokio::main]
async fn main() -> ExitCode {
    news_triage::init_tracing();
    let args = Args::parse();

    let usage = match run(&args).await {
        Ok(usage) => usage,
        Err(e) => {
            error!("Profiling run failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("peak resident memory:    {:>8.1} MiB", usage.peak_mb());
    println!("current resident memory: {:>8.1} MiB", usage.current_mb());
    println!("budget:                  {:>8.1} MiB", args.budget_mb);

    if usage.peak_mb() > args.budget_mb {
        warn!(
            "Peak memory {:.1} MiB exceeds the {:.1} MiB budget",
            usage.peak_mb(),
            args.budget_mb
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
