/*
oddpress - batch entry point.
Loads configuration, runs one curation pass and writes the static page.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use oddpress::observe::TracingObserver;
use oddpress::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "oddpress", about = "Curate the weirdest items from a set of RSS feeds into a static page")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "loaded environment file");
    }

    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let settings = match config.resolve() {
        Ok(s) => s,
        Err(e) => {
            error!(%e, "invalid configuration");
            return Err(e);
        }
    };
    info!(
        feeds = settings.pipeline.feed_urls.len(),
        target = settings.pipeline.target_count,
        domain_cap = settings.pipeline.domain_cap,
        "settings resolved"
    );

    let pipeline = Pipeline::from_settings(&settings, Arc::new(TracingObserver))?;

    match pipeline.run().await {
        Ok(report) => {
            info!(
                collected = report.collected,
                candidates = report.candidates,
                picked = report.picked.len(),
                remote_summaries = report.remote_summaries,
                "run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!("run failed: {:#}", e);
            Err(e)
        }
    }
}
