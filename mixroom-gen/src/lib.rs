//! mixroom-gen library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::PlaylistGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Playlist generation engine
    pub generator: Arc<PlaylistGenerator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(generator: Arc<PlaylistGenerator>) -> Self {
        Self {
            generator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::generate_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
