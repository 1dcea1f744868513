//! Playlist generation endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::generator::DEFAULT_TOTAL_TRACKS;
use crate::AppState;
use mixroom_common::models::{GeneratedTrack, MemberProfile, PlaylistMode};

/// Smallest playlist a caller can request
pub const MIN_TOTAL_TRACKS: usize = 10;
/// Largest playlist a caller can request
pub const MAX_TOTAL_TRACKS: usize = 50;

/// POST /generate request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Primary catalog bearer token, forwarded per request
    pub access_token: String,
    pub members: Vec<MemberProfile>,
    /// Requested playlist size, clamped to [10, 50]
    pub total_tracks: Option<usize>,
    #[serde(default)]
    pub mode: Option<PlaylistMode>,
}

/// POST /generate response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub tracks: Vec<GeneratedTrack>,
    pub member_count: usize,
}

/// POST /generate
///
/// Generate a blended playlist for the given member profiles.
/// Upstream failures degrade to a shorter playlist; only an entirely
/// empty result is reported as an error.
pub async fn generate_playlist(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    if request.access_token.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing access token".to_string()));
    }
    if request.members.is_empty() {
        return Err(ApiError::BadRequest(
            "No members with preferences".to_string(),
        ));
    }

    let total_tracks = request
        .total_tracks
        .unwrap_or(DEFAULT_TOTAL_TRACKS)
        .clamp(MIN_TOTAL_TRACKS, MAX_TOTAL_TRACKS);
    let mode = request.mode.unwrap_or_default();

    info!(
        members = request.members.len(),
        total_tracks,
        mode = mode.label(),
        "Generating playlist"
    );

    let tracks = state
        .generator
        .generate(&request.members, &request.access_token, total_tracks, mode)
        .await;

    if tracks.is_empty() {
        return Err(ApiError::NotFound(
            "No tracks could be generated; check member preferences and access token".to_string(),
        ));
    }

    info!(tracks = tracks.len(), "Playlist generated");

    Ok(Json(GenerateResponse {
        member_count: request.members.len(),
        tracks,
    }))
}

/// Build generation routes
pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/generate", post(generate_playlist))
}
