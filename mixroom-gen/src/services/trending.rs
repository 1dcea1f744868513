//! Trend resolver
//!
//! Trending tracks come from the primary catalog's curated chart
//! playlists, keyed by mode (energetic modes read the viral chart).
//! When the chart path yields nothing — no credential, upstream
//! error, empty playlist — the resolver falls back to secondary
//! catalog charts and tag charts, resolving each title back onto the
//! primary catalog.

use crate::services::lastfm_client::{LastfmClient, LastfmTrack};
use crate::services::spotify_client::{ChartType, SpotifyClient};
use mixroom_common::models::{GeneratedTrack, PlaylistMode, Track};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Overfetch beyond the requested limit so the shuffle has slack
const CHART_OVERFETCH: usize = 5;
/// Mode tags used for the tag-chart fallback
const FALLBACK_TAGS: usize = 2;

pub struct TrendResolver {
    spotify: Arc<SpotifyClient>,
    lastfm: Arc<LastfmClient>,
    chart_region: String,
}

impl TrendResolver {
    pub fn new(spotify: Arc<SpotifyClient>, lastfm: Arc<LastfmClient>, chart_region: String) -> Self {
        Self {
            spotify,
            lastfm,
            chart_region,
        }
    }

    /// Up to `limit` trending tracks for the given mode
    pub async fn trending(
        &self,
        token: &str,
        limit: usize,
        mode: PlaylistMode,
    ) -> Vec<GeneratedTrack> {
        if limit == 0 {
            return Vec::new();
        }

        if !token.trim().is_empty() {
            let chart = ChartType::for_mode(mode, &self.chart_region);
            let tracks = self
                .spotify
                .chart_playlist_tracks(token, chart, limit + CHART_OVERFETCH)
                .await;
            let picked = pick_chart_tracks(tracks, limit, chart.label(), &mut rand::thread_rng());
            if !picked.is_empty() {
                return picked;
            }
            debug!(chart = chart.label(), "Chart playlist yielded nothing, trying fallback");
        }

        self.fallback(token, limit, mode).await
    }

    async fn fallback(
        &self,
        token: &str,
        limit: usize,
        mode: PlaylistMode,
    ) -> Vec<GeneratedTrack> {
        if !self.lastfm.is_available() {
            return Vec::new();
        }

        let mut candidates: Vec<LastfmTrack> = Vec::new();
        let tags = mode.tags();
        if mode != PlaylistMode::Mixed && !tags.is_empty() {
            for tag in tags.iter().take(FALLBACK_TAGS) {
                candidates.extend(self.lastfm.tag_top_tracks(tag, limit).await);
                if candidates.len() >= limit * 2 {
                    break;
                }
            }
        } else {
            candidates = self.lastfm.chart_top_tracks(limit * 2).await;
        }

        candidates.shuffle(&mut rand::thread_rng());

        let reason = fallback_reason(mode);
        let mut used: HashSet<String> = HashSet::new();
        let mut results: Vec<GeneratedTrack> = Vec::new();

        for candidate in candidates {
            if results.len() >= limit {
                break;
            }
            let Some(track) = self
                .spotify
                .search_track(token, &candidate.name, &candidate.artist.name)
                .await
            else {
                continue;
            };
            if used.insert(track.id.clone()) {
                results.push(GeneratedTrack {
                    track,
                    reason: reason.clone(),
                    for_members: vec!["all".to_string()],
                });
            }
        }

        results
    }
}

/// Shuffle chart tracks for run-to-run variety, then take the first
/// `limit` unique tracks
fn pick_chart_tracks(
    mut tracks: Vec<Track>,
    limit: usize,
    chart_label: &str,
    rng: &mut impl Rng,
) -> Vec<GeneratedTrack> {
    tracks.shuffle(rng);

    let reason = format!("trending ({})", chart_label);
    let mut used: HashSet<String> = HashSet::new();
    let mut results: Vec<GeneratedTrack> = Vec::new();

    for track in tracks {
        if results.len() >= limit {
            break;
        }
        if used.insert(track.id.clone()) {
            results.push(GeneratedTrack {
                track,
                reason: reason.clone(),
                for_members: vec!["all".to_string()],
            });
        }
    }

    results
}

fn fallback_reason(mode: PlaylistMode) -> String {
    if mode == PlaylistMode::Mixed {
        "trending".to_string()
    } else {
        format!("trending ({})", mode.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::request_gate::RequestGate;
    use mixroom_common::models::Album;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chart_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("track {}", id),
            artists: Vec::new(),
            album: Album::default(),
            duration_ms: 0,
            uri: String::new(),
            popularity: None,
        }
    }

    #[test]
    fn test_pick_chart_tracks_caps_and_dedups() {
        let tracks = vec![
            chart_track("a"),
            chart_track("b"),
            chart_track("a"),
            chart_track("c"),
            chart_track("d"),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        let picked = pick_chart_tracks(tracks, 3, "Viral Global", &mut rng);
        assert_eq!(picked.len(), 3);

        // Shuffled output is a set, not a sequence
        let ids: HashSet<_> = picked.iter().map(|t| t.track.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        for track in &picked {
            assert_eq!(track.reason, "trending (Viral Global)");
            assert_eq!(track.for_members, vec!["all".to_string()]);
        }
    }

    #[test]
    fn test_pick_chart_tracks_returns_all_when_under_limit() {
        let tracks = vec![chart_track("a"), chart_track("b")];
        let mut rng = StdRng::seed_from_u64(7);
        let picked = pick_chart_tracks(tracks, 10, "Top Global", &mut rng);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_fallback_reason_by_mode() {
        assert_eq!(fallback_reason(PlaylistMode::Mixed), "trending");
        assert_eq!(fallback_reason(PlaylistMode::Dinner), "trending (Dinner)");
    }

    #[tokio::test]
    async fn test_no_credential_and_no_secondary_is_empty() {
        let spotify = Arc::new(SpotifyClient::new(RequestGate::default()).unwrap());
        let lastfm = Arc::new(LastfmClient::new(None).unwrap());
        let resolver = TrendResolver::new(spotify, lastfm, "global".to_string());

        let tracks = resolver.trending("", 5, PlaylistMode::Party).await;
        assert!(tracks.is_empty());
    }
}
