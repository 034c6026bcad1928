//! windfield - Resolve current wind for map sites
//!
//! Fetches hourly forecasts around each configured site and prints a
//! rendering-ready wind record per site, once or on a refresh interval.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use windfield::cli::{log_filter, Cli};
use windfield::output::{render, OutputFormat};
use windfield::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use windfield::{ForecastClient, ResolverConfig, WindFieldResolver};

/// Sets up stderr logging from RUST_LOG, with `--verbose` raising windfield to debug
fn init_tracing(verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves once and prints the result
async fn run_once(
    resolver: &WindFieldResolver<ForecastClient>,
    config: &ResolverConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let results = resolver
        .resolve_all_within(&config.sites, config.run_timeout())
        .await;
    println!("{}", render(&results, format)?);
    Ok(())
}

/// Runs the refresh loop until Ctrl-C
async fn run_watch(
    resolver: Arc<WindFieldResolver<ForecastClient>>,
    config: &ResolverConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let refresh = RefreshConfig {
        interval: config.refresh_interval(),
        run_timeout: config.run_timeout(),
        run_immediately: true,
    };
    let mut handle = RefreshHandle::spawn(resolver, config.sites.clone(), refresh);
    info!(minutes = config.refresh_minutes, "watching wind field");

    loop {
        tokio::select! {
            message = handle.receiver.recv() => match message {
                Some(RefreshMessage::WindUpdated(results)) => {
                    println!("{}", render(&results, format)?);
                }
                Some(RefreshMessage::RefreshError(error)) => {
                    warn!(%error, "refresh failed");
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ResolverConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config)?;
    config.validate()?;

    let resolver = WindFieldResolver::from_config(&config)?;
    if cli.watch {
        run_watch(Arc::new(resolver), &config, cli.format).await
    } else {
        run_once(&resolver, &config, cli.format).await
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}
