use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod cache;
mod config;
mod error;
mod fetcher;
mod images;
mod models;
mod notifier;
mod parser;
mod pipeline;
mod server;
mod storage;

use config::Config;
use server::{app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    info!("Starting catalog scraper on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let state = AppState {
        config: Arc::new(config),
    };
    axum::serve(listener, app(state)).await?;

    Ok(())
}
