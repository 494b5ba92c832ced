//! Charitybot - answers charity registration questions on Twitter
//!
//! Polls the bot's mentions, looks up registered charities by number or by
//! free-text search, and replies with the registry details.

mod cli;
mod common;
mod config;
mod pipeline;
mod registry;
mod twitter;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use cli::Args;
use config::env::{apply_env_overrides, check_empty_env_vars};
use config::{load_config_or_default, validate_config, DEFAULT_HANDLE};
use pipeline::{
    DispatchSettings, Dispatcher, FixtureSource, MentionSource, ReplyFormatter, Watermark,
};
use registry::CharityResolver;
use twitter::TwitterClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Charitybot v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration: file, then environment, then command line
    let (config_path, explicit) = args.config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_config_or_default(&config_path, explicit).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;
    let config = args.apply_overrides(apply_env_overrides(config));

    for var in check_empty_env_vars() {
        warn!("Environment variable {} is set but empty", var);
    }

    validate_config(&config).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Registry: {}", config.registry.backend);
    info!("  Poll interval: {}s", config.bot.poll_interval_secs);
    if config.bot.debug {
        info!("  Debug mode: replies will be logged, not posted");
    }

    let timeout = config.bot.request_timeout();

    // ============================================================
    // Mention source
    // ============================================================
    let source: Arc<dyn MentionSource> = match config.bot.fixtures {
        Some(ref path) => {
            info!("Replaying mentions from {}", path);
            let handle = config.bot.handle.as_deref().unwrap_or(DEFAULT_HANDLE);
            Arc::new(FixtureSource::new(path, handle))
        }
        None => Arc::new(TwitterClient::new(&config.twitter, timeout)?),
    };

    let handle = match config.bot.handle {
        Some(ref handle) => handle.trim_start_matches('@').to_string(),
        None => {
            info!("Verifying credentials...");
            match tokio::time::timeout(timeout, source.authenticated_handle()).await {
                Ok(Ok(handle)) => handle,
                Ok(Err(e)) => {
                    error!("Credential verification failed: {}", e);
                    return Err(e.into());
                }
                Err(_) => {
                    error!("Timed out verifying credentials ({}s)", timeout.as_secs());
                    anyhow::bail!("credential verification timed out");
                }
            }
        }
    };
    info!("Connected. User: [{}]", handle);

    // ============================================================
    // Registry and dispatcher
    // ============================================================
    let resolver = registry::build_resolver(&config.registry, timeout)?;
    info!("Using {} for charity lookups", resolver.name());

    let settings = DispatchSettings {
        handle,
        poll_interval: config.bot.poll_interval(),
        rate_limit_cooldown: config.bot.rate_limit_cooldown(),
        call_timeout: timeout,
        debug: config.bot.debug,
    };
    let dispatcher = Dispatcher::new(
        source,
        resolver,
        ReplyFormatter::new(&config.replies),
        settings,
    )?;

    // Debug runs replay from a fixed point so old mentions are answered again
    let watermark = if config.bot.debug {
        Watermark::starting_at(config.bot.debug_watermark)
    } else {
        Watermark::starting_at(Utc::now())
    };

    // ============================================================
    // Run until a fatal fetch error or a shutdown signal
    // ============================================================
    tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
        result = dispatcher.run(watermark) => {
            if let Err(e) = result {
                error!("Stopping after fatal error: {}", e);
                return Err(e.into());
            }
        }
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
