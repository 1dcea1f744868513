//! Spotify Web API client (primary catalog)
//!
//! Search, chart-playlist, audio-feature, and search-based
//! recommendation lookups. Error statuses (401/403/429/5xx) are
//! treated as "no data" and degrade to empty/None; only the
//! audio-features fetch surfaces transport failure, so the
//! orchestrator can skip energy filtering instead of aborting.

use crate::services::cache::{TtlCache, TTL_CHARTS, TTL_SEARCH};
use crate::services::name_matcher::is_name_match;
use crate::services::request_gate::RequestGate;
use mixroom_common::models::{AudioFeatures, PlaylistMode, Track};
use mixroom_common::Result;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const SPOTIFY_API: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("mixroom/", env!("CARGO_PKG_VERSION"));

/// Maximum track ids per audio-features request
const AUDIO_FEATURES_BATCH: usize = 100;
/// Search window for track resolution (top hits scanned for a
/// plausible artist match)
const TRACK_SEARCH_LIMIT: usize = 5;
/// Randomized search offset ceiling for recommendation variety
const RECOMMENDATION_OFFSET_RANGE: u32 = 20;

/// Curated chart playlists, top/viral crossed with region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    TopGlobal,
    TopSweden,
    ViralGlobal,
    ViralSweden,
}

impl ChartType {
    pub fn playlist_id(&self) -> &'static str {
        match self {
            ChartType::TopGlobal => "37i9dQZEVXbMDoHDwVN2tF",
            ChartType::TopSweden => "37i9dQZEVXbLp5XoPON0wI",
            ChartType::ViralGlobal => "37i9dQZEVXbLiRSasKsNU9",
            ChartType::ViralSweden => "37i9dQZEVXbJoP1vMsLrMT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartType::TopGlobal => "Top Global",
            ChartType::TopSweden => "Top Sweden",
            ChartType::ViralGlobal => "Viral Global",
            ChartType::ViralSweden => "Viral Sweden",
        }
    }

    /// Chart selection: energetic modes read the viral chart, calmer
    /// ones the regional top chart
    pub fn for_mode(mode: PlaylistMode, region: &str) -> ChartType {
        let regional = region.eq_ignore_ascii_case("sweden");
        match (mode.is_energetic(), regional) {
            (true, true) => ChartType::ViralSweden,
            (true, false) => ChartType::ViralGlobal,
            (false, true) => ChartType::TopSweden,
            (false, false) => ChartType::TopGlobal,
        }
    }
}

/// Artist search hit, with genre tags for affinity scoring
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchTracksResponse {
    #[serde(default)]
    tracks: Option<TrackItems>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackItems {
    #[serde(default)]
    items: Vec<Track>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchArtistsResponse {
    #[serde(default)]
    artists: Option<ArtistItems>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtistItems {
    #[serde(default)]
    items: Vec<SpotifyArtist>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistTracksResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    track: Option<Track>,
}

#[derive(Debug, Default, Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<AudioFeatures>>,
}

/// Spotify client
///
/// Outbound calls route through the request gate; chart lookups are
/// additionally cached for an hour per (chart, limit) key.
pub struct SpotifyClient {
    http: reqwest::Client,
    gate: RequestGate,
    chart_cache: TtlCache<(ChartType, usize), Vec<Track>>,
    search_cache: TtlCache<(String, String), Track>,
}

impl SpotifyClient {
    pub fn new(gate: RequestGate) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            gate,
            chart_cache: TtlCache::new(TTL_CHARTS),
            search_cache: TtlCache::new(TTL_SEARCH),
        })
    }

    async fn get_json<T>(&self, token: &str, url: &str, query: &[(&str, String)]) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let request = self.http.get(url).bearer_auth(token).query(query).send();
        let response = self.gate.run(request).await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<T>().await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Spotify response parse failed");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(url = %url, status = %response.status(), "Spotify returned error status");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Spotify fetch failed");
                None
            }
        }
    }

    /// Resolve a (track, artist) pair to a concrete catalog track
    ///
    /// Scans the top search hits for one whose artist list plausibly
    /// matches the intended artist, preventing fuzzy false positives.
    pub async fn search_track(
        &self,
        token: &str,
        track_name: &str,
        artist_name: &str,
    ) -> Option<Track> {
        let key = (track_name.to_lowercase(), artist_name.to_lowercase());
        if let Some(track) = self.search_cache.get(&key).await {
            return Some(track);
        }

        let query = vec![
            ("q", format!("track:{} artist:{}", track_name, artist_name)),
            ("type", "track".to_string()),
            ("limit", TRACK_SEARCH_LIMIT.to_string()),
        ];
        let response: SearchTracksResponse = self
            .get_json(token, &format!("{}/search", SPOTIFY_API), &query)
            .await?;

        let items = response.tracks.map(|t| t.items).unwrap_or_default();
        let hit = items
            .into_iter()
            .find(|track| track.artists.iter().any(|a| is_name_match(artist_name, &a.name)));

        if let Some(track) = &hit {
            self.search_cache.insert(key, track.clone()).await;
        }
        hit
    }

    /// Search artists by name
    pub async fn search_artists(
        &self,
        token: &str,
        name: &str,
        limit: usize,
    ) -> Vec<SpotifyArtist> {
        if name.trim().is_empty() {
            return Vec::new();
        }

        let query = vec![
            ("q", name.to_string()),
            ("type", "artist".to_string()),
            ("limit", limit.to_string()),
        ];
        let response: Option<SearchArtistsResponse> = self
            .get_json(token, &format!("{}/search", SPOTIFY_API), &query)
            .await;

        response
            .and_then(|r| r.artists)
            .map(|a| a.items)
            .unwrap_or_default()
    }

    /// Tracks from a curated chart playlist, cached per (chart, limit)
    pub async fn chart_playlist_tracks(
        &self,
        token: &str,
        chart: ChartType,
        limit: usize,
    ) -> Vec<Track> {
        let key = (chart, limit);
        if let Some(tracks) = self.chart_cache.get(&key).await {
            debug!(chart = chart.label(), "Chart cache hit");
            return tracks;
        }

        let url = format!("{}/playlists/{}/tracks", SPOTIFY_API, chart.playlist_id());
        let query = vec![
            ("limit", limit.to_string()),
            (
                "fields",
                "items(track(id,name,artists(id,name),album(id,name,images),uri,popularity,duration_ms))"
                    .to_string(),
            ),
        ];
        let response: Option<PlaylistTracksResponse> = self.get_json(token, &url, &query).await;

        let tracks: Vec<Track> = response
            .map(|r| {
                r.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter(|t| !t.id.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if !tracks.is_empty() {
            self.chart_cache.insert(key, tracks.clone()).await;
        }
        tracks
    }

    /// Audio descriptors for the given track ids, keyed by id
    ///
    /// Batched at 100 ids per request. A non-2xx batch is skipped
    /// ("no data" for those tracks); a transport failure is an error
    /// so the caller can fall back to its unfiltered list.
    pub async fn audio_features(
        &self,
        token: &str,
        track_ids: &[String],
    ) -> Result<HashMap<String, AudioFeatures>> {
        let mut features = HashMap::new();

        for batch in track_ids.chunks(AUDIO_FEATURES_BATCH) {
            let query = vec![("ids", batch.join(","))];
            let request = self
                .http
                .get(format!("{}/audio-features", SPOTIFY_API))
                .bearer_auth(token)
                .query(&query)
                .send();
            let response = self.gate.run(request).await?;

            if !response.status().is_success() {
                warn!(status = %response.status(), "Audio features batch returned error status");
                continue;
            }

            let body: AudioFeaturesResponse = response.json().await?;
            for descriptor in body.audio_features.into_iter().flatten() {
                features.insert(descriptor.id.clone(), descriptor);
            }
        }

        Ok(features)
    }

    /// Search-based recommendations
    ///
    /// The dedicated recommendations endpoint is unavailable to
    /// development-mode apps, so this builds per-artist, per-genre,
    /// and one combined search query, each with a randomized offset
    /// for run-to-run variety, and merges deduplicated hits.
    pub async fn recommendations_by_search(
        &self,
        token: &str,
        seed_genres: &[String],
        seed_artists: &[String],
        limit: usize,
    ) -> Vec<Track> {
        if seed_genres.is_empty() && seed_artists.is_empty() {
            return Vec::new();
        }

        let mut queries: Vec<String> = Vec::new();
        for artist in seed_artists.iter().take(3) {
            queries.push(format!("artist:{}", artist));
        }
        for genre in seed_genres.iter().take(5) {
            queries.push(format!("genre:{}", genre));
        }
        if !seed_genres.is_empty() && !seed_artists.is_empty() {
            queries.push(format!("genre:{} artist:{}", seed_genres[0], seed_artists[0]));
        }

        let per_query = limit.div_ceil(queries.len()).max(5);

        let mut seen: HashSet<String> = HashSet::new();
        let mut results: Vec<Track> = Vec::new();

        for q in queries {
            if results.len() >= limit {
                break;
            }

            let offset = rand::thread_rng().gen_range(0..RECOMMENDATION_OFFSET_RANGE);
            let query = vec![
                ("q", q.clone()),
                ("type", "track".to_string()),
                ("limit", per_query.to_string()),
                ("offset", offset.to_string()),
            ];
            let response: Option<SearchTracksResponse> = self
                .get_json(token, &format!("{}/search", SPOTIFY_API), &query)
                .await;

            let Some(response) = response else {
                debug!(query = %q, "Recommendation search yielded no data");
                continue;
            };

            for track in response.tracks.map(|t| t.items).unwrap_or_default() {
                if results.len() >= limit {
                    break;
                }
                if seen.insert(track.id.clone()) {
                    results.push(track);
                }
            }
        }

        results
    }
}
