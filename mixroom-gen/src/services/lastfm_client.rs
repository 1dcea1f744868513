//! Last.fm API client (secondary catalog)
//!
//! Community-tagging service used for similar-artist, top-track, and
//! chart lookups. Every call degrades to an empty result on missing
//! configuration, timeout, or error status so the rest of the
//! pipeline proceeds with partial data; nothing here ever errors out
//! of the generation path.

use crate::services::cache::{TtlCache, TTL_SIMILAR_ARTISTS, TTL_TOP_TRACKS};
use mixroom_common::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const LASTFM_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = concat!("mixroom/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Similar-artist entry
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmArtist {
    pub name: String,
    /// Similarity to the queried artist, reported as a decimal string
    #[serde(default, rename = "match")]
    pub match_score: Option<String>,
}

/// Artist reference inside a track entry
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmTrackArtist {
    pub name: String,
}

/// Track entry from top-track and chart lookups
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmTrack {
    pub name: String,
    pub artist: LastfmTrackArtist,
    /// Play count, reported as a decimal string
    #[serde(default)]
    pub playcount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarArtistsResponse {
    #[serde(default)]
    similarartists: Option<SimilarArtistsBody>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarArtistsBody {
    #[serde(default)]
    artist: Vec<LastfmArtist>,
}

#[derive(Debug, Default, Deserialize)]
struct TopTracksResponse {
    #[serde(default)]
    toptracks: Option<TrackListBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartTracksResponse {
    #[serde(default)]
    tracks: Option<TrackListBody>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackListBody {
    #[serde(default)]
    track: Vec<LastfmTrack>,
}

/// Last.fm client
///
/// Constructed once at startup; an absent API key silently disables
/// all lookups (`is_available` lets callers budget around that).
pub struct LastfmClient {
    http: reqwest::Client,
    api_key: Option<String>,
    similar_cache: TtlCache<(String, usize), Vec<LastfmArtist>>,
    top_tracks_cache: TtlCache<(String, usize), Vec<LastfmTrack>>,
}

impl LastfmClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key,
            similar_cache: TtlCache::new(TTL_SIMILAR_ARTISTS),
            top_tracks_cache: TtlCache::new(TTL_TOP_TRACKS),
        })
    }

    /// Whether the secondary catalog is configured at all
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch<T>(&self, method: &str, params: &[(&str, &str)]) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref()?;

        let mut query: Vec<(&str, &str)> = vec![
            ("method", method),
            ("api_key", api_key),
            ("format", "json"),
        ];
        query.extend_from_slice(params);

        let response = self.http.get(LASTFM_BASE_URL).query(&query).send().await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<T>().await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!(method = %method, error = %e, "Last.fm response parse failed");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(method = %method, status = %response.status(), "Last.fm returned error status");
                None
            }
            Err(e) => {
                warn!(method = %method, error = %e, "Last.fm fetch failed");
                None
            }
        }
    }

    /// Artists similar to the given one, best matches first
    pub async fn similar_artists(&self, artist: &str, limit: usize) -> Vec<LastfmArtist> {
        let key = (artist.to_lowercase(), limit);
        if let Some(artists) = self.similar_cache.get(&key).await {
            return artists;
        }

        let limit = limit.to_string();
        let artists = self
            .fetch::<SimilarArtistsResponse>(
                "artist.getSimilar",
                &[("artist", artist), ("limit", &limit)],
            )
            .await
            .and_then(|r| r.similarartists)
            .map(|b| b.artist)
            .unwrap_or_default();

        if !artists.is_empty() {
            self.similar_cache.insert(key, artists.clone()).await;
        }
        artists
    }

    /// An artist's most-played tracks
    pub async fn top_tracks(&self, artist: &str, limit: usize) -> Vec<LastfmTrack> {
        let key = (artist.to_lowercase(), limit);
        if let Some(tracks) = self.top_tracks_cache.get(&key).await {
            return tracks;
        }

        let limit = limit.to_string();
        let tracks = self
            .fetch::<TopTracksResponse>(
                "artist.getTopTracks",
                &[("artist", artist), ("limit", &limit)],
            )
            .await
            .and_then(|r| r.toptracks)
            .map(|b| b.track)
            .unwrap_or_default();

        if !tracks.is_empty() {
            self.top_tracks_cache.insert(key, tracks.clone()).await;
        }
        tracks
    }

    /// Global chart top tracks
    pub async fn chart_top_tracks(&self, limit: usize) -> Vec<LastfmTrack> {
        let limit = limit.to_string();
        self.fetch::<ChartTracksResponse>("chart.getTopTracks", &[("limit", &limit)])
            .await
            .and_then(|r| r.tracks)
            .map(|b| b.track)
            .unwrap_or_default()
    }

    /// Top tracks for a community tag ("jazz", "workout", ...)
    pub async fn tag_top_tracks(&self, tag: &str, limit: usize) -> Vec<LastfmTrack> {
        let limit = limit.to_string();
        self.fetch::<ChartTracksResponse>("tag.getTopTracks", &[("tag", tag), ("limit", &limit)])
            .await
            .and_then(|r| r.tracks)
            .map(|b| b.track)
            .unwrap_or_default()
    }
}
