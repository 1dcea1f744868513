//! mixroom-gen - Playlist Generation Microservice
//!
//! Blends the taste profiles of a listening room's members into a
//! single playlist, pulling candidates from the primary catalog
//! (Spotify Web API, caller-supplied token) and the secondary catalog
//! (Last.fm, service-configured key). Stateless between requests.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mixroom_common::config::{
    resolve_chart_region, resolve_lastfm_api_key, resolve_port, TomlConfig,
};
use mixroom_gen::services::request_gate::{RequestGate, DEFAULT_MAX_CONCURRENT};
use mixroom_gen::services::{LastfmClient, PlaylistGenerator, SpotifyClient};
use mixroom_gen::AppState;

#[derive(Debug, Parser)]
#[command(name = "mixroom-gen", about = "Playlist generation microservice")]
struct Args {
    /// HTTP bind port (overrides MIXROOM_PORT and the config file)
    #[arg(long)]
    port: Option<u16>,
    /// Path to a TOML config file
    #[arg(long, env = "MIXROOM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting mixroom-gen (Playlist Generation) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml_config = TomlConfig::load_or_default(args.config.as_deref())?;
    let port = resolve_port(args.port, &toml_config);
    let chart_region = resolve_chart_region(&toml_config);
    let lastfm_api_key = resolve_lastfm_api_key(&toml_config);
    let max_concurrent = toml_config
        .max_concurrent_requests
        .unwrap_or(DEFAULT_MAX_CONCURRENT);

    info!(chart_region = %chart_region, max_concurrent, "Configuration resolved");

    let gate = RequestGate::new(max_concurrent);
    let spotify = Arc::new(SpotifyClient::new(gate)?);
    let lastfm = Arc::new(LastfmClient::new(lastfm_api_key)?);
    let generator = Arc::new(PlaylistGenerator::new(spotify, lastfm, chart_region));

    let state = AppState::new(generator);
    let app = mixroom_gen::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
