//! HTTP server for applying replacement rules to PowerPoint files.

use anyhow::{Context, Result};
use clap::Parser;
use deck_server::{router, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize logging
    if config.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    log::info!(
        "Listening on {} (upload limit {} MB)",
        config.bind,
        config.max_upload_mb
    );

    axum::serve(listener, router(&config))
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
