pub mod api;
pub mod config;
pub mod db;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = fmt().with_env_filter(filter).try_init() {
        eprintln!("tracing init failed: {err}");
    }

    let config = Config::parse();
    tracing::info!(database_url = %config.database_url, "starting users-api");

    api::server::start_server(&config).await
}
