use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod cli;
mod config;
mod error;
mod handlers;
mod router;
mod schemas;

#[cfg(test)]
mod openapi_tests;
#[cfg(test)]
mod test_utils;

use cli::Cli;

/// Main entry point for the SocialNet application.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "socialnet=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("SocialNet starting up");

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
