//! Discovery resolver
//!
//! Expands seed artists into related listening via the secondary
//! catalog, validates each candidate against the primary catalog
//! (name match + genre affinity), and resolves candidate titles to
//! concrete catalog tracks. Seeds are processed concurrently; the
//! merged result follows seed input order, not completion order.

use crate::services::genre_affinity::{genre_affinity, MIN_GENRE_AFFINITY};
use crate::services::lastfm_client::LastfmClient;
use crate::services::name_matcher::is_name_match;
use crate::services::spotify_client::SpotifyClient;
use futures::future::join_all;
use mixroom_common::models::GeneratedTrack;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Similar artists fetched per seed
const SIMILAR_ARTIST_FETCH: usize = 8;
/// Verified similar artists kept per seed (best affinity first)
const MAX_VERIFIED_SIMILAR: usize = 3;
/// Verification stops once this many candidates are accepted
const MAX_VERIFY_CANDIDATES: usize = 5;
/// Seed plus verified similar artists fetched per seed
const MAX_FETCH_ARTISTS: usize = 4;
/// Top tracks fetched per artist
const TOP_TRACKS_PER_ARTIST: usize = 3;

pub struct DiscoveryResolver {
    spotify: Arc<SpotifyClient>,
    lastfm: Arc<LastfmClient>,
}

impl DiscoveryResolver {
    pub fn new(spotify: Arc<SpotifyClient>, lastfm: Arc<LastfmClient>) -> Self {
        Self { spotify, lastfm }
    }

    /// Discover reason-annotated tracks for the given seed artists
    ///
    /// Capped at `limit` and deduplicated by catalog id. `reason` tags
    /// tracks from the seeds themselves; tracks reached through a
    /// similar artist are tagged with the seed they were reached from.
    /// An empty `user_genres` accepts all candidates (callers without
    /// profile data).
    pub async fn discover(
        &self,
        token: &str,
        seed_artists: &[String],
        limit: usize,
        reason: &str,
        for_members: &[String],
        user_genres: &[String],
    ) -> Vec<GeneratedTrack> {
        if limit == 0 || seed_artists.is_empty() {
            return Vec::new();
        }

        let groups = join_all(seed_artists.iter().map(|seed| {
            self.discover_for_seed(token, seed, limit, reason, for_members, user_genres)
        }))
        .await;

        merge_seed_groups(groups, limit)
    }

    async fn discover_for_seed(
        &self,
        token: &str,
        seed: &str,
        limit: usize,
        reason: &str,
        for_members: &[String],
        user_genres: &[String],
    ) -> Vec<GeneratedTrack> {
        let similar = self.lastfm.similar_artists(seed, SIMILAR_ARTIST_FETCH).await;

        // Validate candidates: drop fuzzy near-duplicates of the seed
        // (case variants and the like), require the primary catalog to
        // know the name, and rank survivors by genre affinity.
        let mut scored: Vec<(String, f64)> = Vec::new();
        for candidate in similar {
            if is_name_match(seed, &candidate.name)
                && candidate.name.to_lowercase() != seed.to_lowercase()
            {
                debug!(seed = %seed, candidate = %candidate.name, "Skipping near-duplicate similar artist");
                continue;
            }

            let found = self.spotify.search_artists(token, &candidate.name, 1).await;
            let Some(artist) = found.into_iter().next() else {
                continue;
            };
            if !is_name_match(&candidate.name, &artist.name) {
                continue;
            }

            let affinity = if user_genres.is_empty() {
                1.0
            } else {
                genre_affinity(user_genres, &artist.genres)
            };
            if affinity >= MIN_GENRE_AFFINITY {
                scored.push((artist.name, affinity));
            }
            if scored.len() >= MAX_VERIFY_CANDIDATES {
                break;
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut fetch_artists: Vec<String> = vec![seed.to_string()];
        fetch_artists.extend(scored.into_iter().take(MAX_VERIFIED_SIMILAR).map(|s| s.0));
        fetch_artists.truncate(MAX_FETCH_ARTISTS);

        let mut used: HashSet<String> = HashSet::new();
        let mut results: Vec<GeneratedTrack> = Vec::new();

        for fetch_artist in &fetch_artists {
            if results.len() >= limit {
                break;
            }

            let top = self.lastfm.top_tracks(fetch_artist, TOP_TRACKS_PER_ARTIST).await;
            for candidate in top {
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
                if !used.insert(track.id.clone()) {
                    continue;
                }

                let via_similar = fetch_artist != seed;
                results.push(GeneratedTrack {
                    track,
                    reason: if via_similar {
                        format!("discovery via similar artist {}", seed)
                    } else {
                        reason.to_string()
                    },
                    for_members: for_members.to_vec(),
                });
            }
        }

        results
    }
}

/// Merge per-seed result groups in seed input order, deduplicating by
/// catalog id, until `limit` is reached
fn merge_seed_groups(groups: Vec<Vec<GeneratedTrack>>, limit: usize) -> Vec<GeneratedTrack> {
    let mut used: HashSet<String> = HashSet::new();
    let mut results: Vec<GeneratedTrack> = Vec::new();

    'outer: for group in groups {
        for track in group {
            if results.len() >= limit {
                break 'outer;
            }
            if used.insert(track.track.id.clone()) {
                results.push(track);
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::request_gate::RequestGate;
    use mixroom_common::models::{Album, Track};

    fn track(id: &str, reason: &str) -> GeneratedTrack {
        GeneratedTrack {
            track: Track {
                id: id.to_string(),
                name: format!("track {}", id),
                artists: Vec::new(),
                album: Album::default(),
                duration_ms: 0,
                uri: String::new(),
                popularity: None,
            },
            reason: reason.to_string(),
            for_members: vec!["Alice".to_string()],
        }
    }

    #[test]
    fn test_merge_preserves_seed_order_and_dedups() {
        let groups = vec![
            vec![track("a", "seed one"), track("b", "seed one")],
            vec![track("b", "seed two"), track("c", "seed two")],
        ];

        let merged = merge_seed_groups(groups, 10);
        let ids: Vec<_> = merged.iter().map(|t| t.track.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // First writer wins the provenance tag
        assert_eq!(merged[1].reason, "seed one");
    }

    #[test]
    fn test_merge_respects_limit() {
        let groups = vec![
            vec![track("a", "r"), track("b", "r")],
            vec![track("c", "r"), track("d", "r")],
        ];

        let merged = merge_seed_groups(groups, 3);
        assert_eq!(merged.len(), 3);
    }

    #[tokio::test]
    async fn test_discover_without_secondary_catalog_is_empty() {
        let spotify = Arc::new(SpotifyClient::new(RequestGate::default()).unwrap());
        let lastfm = Arc::new(LastfmClient::new(None).unwrap());
        let resolver = DiscoveryResolver::new(spotify, lastfm);

        let tracks = resolver
            .discover(
                "token",
                &["Miles Davis".to_string()],
                5,
                "Alice likes Miles Davis",
                &["Alice".to_string()],
                &["jazz".to_string()],
            )
            .await;

        assert!(tracks.is_empty());
    }

    #[tokio::test]
    async fn test_discover_with_zero_limit_is_empty() {
        let spotify = Arc::new(SpotifyClient::new(RequestGate::default()).unwrap());
        let lastfm = Arc::new(LastfmClient::new(Some("key".to_string())).unwrap());
        let resolver = DiscoveryResolver::new(spotify, lastfm);

        let tracks = resolver
            .discover("token", &["Miles Davis".to_string()], 0, "r", &[], &[])
            .await;
        assert!(tracks.is_empty());
    }
}
