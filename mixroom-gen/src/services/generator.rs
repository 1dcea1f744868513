//! Playlist generation orchestrator
//!
//! Aggregates member taste profiles into shared and individual pools,
//! splits a fixed track budget across trending / shared / per-member
//! sources, launches the resolvers concurrently, then merges with
//! fixed precedence (trending, shared, individual), backfills
//! under-filled branches via search recommendations, enforces artist
//! diversity, and applies mode-based energy filtering.
//!
//! The pipeline is single-pass and re-entrant: the only shared
//! mutable state across calls is the chart cache and the request
//! gate, both concurrency-safe by construction.

use crate::services::discovery::DiscoveryResolver;
use crate::services::lastfm_client::LastfmClient;
use crate::services::spotify_client::SpotifyClient;
use crate::services::trending::TrendResolver;
use futures::future::join_all;
use mixroom_common::models::{
    AudioFeatures, GeneratedTrack, GenreScore, MemberProfile, PlaylistMode, Track,
};
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default playlist size when the caller does not specify one
pub const DEFAULT_TOTAL_TRACKS: usize = 30;

/// Share of the budget reserved for trending tracks
const TRENDING_SHARE: f64 = 0.2;
/// Share of the post-trending remainder reserved for shared taste
const SHARED_SHARE: f64 = 0.4;
/// Maximum tracks per distinct artist set in one result
const DIVERSITY_MAX_PER_KEY: usize = 2;
/// Energy filtering keeps at least this fraction of its input
const ENERGY_KEEP_RATIO: f64 = 0.6;
/// Tracks scoring below neutral are candidates for energy pruning
const MODE_FIT_THRESHOLD: f64 = 0.5;
/// Seed artists passed to the shared-taste discovery branch
const SHARED_SEED_ARTISTS: usize = 3;
/// Artists pooled per member for the shared branch
const SHARED_ARTISTS_PER_MEMBER: usize = 2;
/// Ceiling on the pooled shared-artist list
const SHARED_ARTIST_POOL: usize = 4;
/// Genre groups a member's backfill is spread across
const BACKFILL_GENRE_GROUPS: usize = 4;

/// Fixed track budget split for one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub trending: usize,
    pub shared: usize,
    pub individual: usize,
    pub per_member: usize,
}

/// Split `total_tracks` across the three source pools
///
/// Trending gets 20% (only when the secondary catalog is configured),
/// shared taste 40% of the remainder (only when at least one genre is
/// shared by two or more members), and individual picks the rest,
/// floored at one track per member.
pub fn allocate_budget(
    total_tracks: usize,
    member_count: usize,
    has_shared_genres: bool,
    secondary_available: bool,
) -> Budget {
    let trending = if secondary_available {
        (total_tracks as f64 * TRENDING_SHARE).round() as usize
    } else {
        0
    };
    let remaining = total_tracks.saturating_sub(trending);

    let shared_cap = if has_shared_genres { remaining } else { 0 };
    let shared = ((remaining as f64 * SHARED_SHARE).round() as usize).min(shared_cap);

    let individual = remaining - shared;
    let per_member = (individual / member_count.max(1)).max(1);

    Budget {
        trending,
        shared,
        individual,
        per_member,
    }
}

/// Aggregate weighted genres across all members
///
/// Returns all genres sorted by member count, then total weight, both
/// descending, plus the shared subset (member count >= 2).
pub fn aggregate_genres(members: &[MemberProfile]) -> (Vec<GenreScore>, Vec<GenreScore>) {
    let mut scores: HashMap<String, GenreScore> = HashMap::new();

    for member in members {
        for pref in &member.genres {
            let entry = scores.entry(pref.value.clone()).or_insert_with(|| GenreScore {
                genre: pref.value.clone(),
                total_weight: 0.0,
                member_count: 0,
                members: Vec::new(),
            });
            entry.total_weight += pref.weight;
            entry.member_count += 1;
            entry.members.push(member.display_name.clone());
        }
    }

    let mut all: Vec<GenreScore> = scores.into_values().collect();
    all.sort_by(|a, b| {
        b.member_count.cmp(&a.member_count).then(
            b.total_weight
                .partial_cmp(&a.total_weight)
                .unwrap_or(Ordering::Equal),
        )
    });

    let shared = all.iter().filter(|g| g.member_count >= 2).cloned().collect();
    (all, shared)
}

/// Cap tracks per distinct artist set
///
/// The key is the lower-cased, comma-joined artist-name list; at most
/// two tracks per key survive, the rest are dropped.
pub fn enforce_artist_diversity(tracks: Vec<GeneratedTrack>) -> Vec<GeneratedTrack> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<GeneratedTrack> = Vec::new();
    let mut overflow = 0usize;

    for track in tracks {
        let key = track
            .track
            .artists
            .iter()
            .map(|a| a.name.to_lowercase())
            .collect::<Vec<_>>()
            .join(", ");
        let count = counts.entry(key).or_insert(0);
        if *count >= DIVERSITY_MAX_PER_KEY {
            overflow += 1;
        } else {
            *count += 1;
            kept.push(track);
        }
    }

    if overflow > 0 {
        debug!(overflow, "Dropped tracks over the artist diversity cap");
    }
    kept
}

/// Weighted mode-fitness score for one track's audio descriptors
pub fn mode_score(features: &AudioFeatures, mode: PlaylistMode) -> f64 {
    match mode {
        PlaylistMode::Party => {
            features.energy * 0.5 + features.danceability * 0.4 + features.valence * 0.1
        }
        PlaylistMode::Dinner => {
            (1.0 - features.energy) * 0.4
                + features.acousticness * 0.3
                + (1.0 - features.danceability) * 0.3
        }
        PlaylistMode::Background => {
            (1.0 - features.energy) * 0.3
                + features.instrumentalness * 0.3
                + features.acousticness * 0.2
                + (1.0 - features.danceability) * 0.2
        }
        PlaylistMode::Workout => {
            features.energy * 0.5
                + features.danceability * 0.3
                + (features.tempo / 150.0).min(1.0) * 0.2
        }
        PlaylistMode::Mixed => MODE_FIT_THRESHOLD,
    }
}

/// Re-rank tracks by mode fitness and prune the worst misfits
///
/// Tracks without descriptor data score neutral 0.5. Tracks scoring
/// below neutral are dropped, but never more than 40% of the input:
/// the best `ceil(0.6 * n)` always survive.
pub fn filter_by_mode_energy(
    tracks: Vec<GeneratedTrack>,
    features: &HashMap<String, AudioFeatures>,
    mode: PlaylistMode,
) -> Vec<GeneratedTrack> {
    if tracks.is_empty() {
        return tracks;
    }

    let min_keep = ((tracks.len() as f64) * ENERGY_KEEP_RATIO).ceil() as usize;

    let mut scored: Vec<(GeneratedTrack, f64)> = tracks
        .into_iter()
        .map(|track| {
            let score = features
                .get(&track.track.id)
                .map(|f| mode_score(f, mode))
                .unwrap_or(MODE_FIT_THRESHOLD);
            (track, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let fitting = scored
        .iter()
        .filter(|(_, score)| *score >= MODE_FIT_THRESHOLD)
        .count();
    let keep = fitting.max(min_keep);

    scored
        .into_iter()
        .take(keep)
        .map(|(track, _)| track)
        .collect()
}

fn push_unique(
    result: &mut Vec<GeneratedTrack>,
    used: &mut HashSet<String>,
    track: GeneratedTrack,
) -> bool {
    if used.insert(track.track.id.clone()) {
        result.push(track);
        true
    } else {
        false
    }
}

fn unique_in_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Playlist generation engine
///
/// Construct once at startup and share; `generate` is safe to call
/// concurrently.
pub struct PlaylistGenerator {
    spotify: Arc<SpotifyClient>,
    lastfm: Arc<LastfmClient>,
    discovery: DiscoveryResolver,
    trending: TrendResolver,
}

impl PlaylistGenerator {
    pub fn new(
        spotify: Arc<SpotifyClient>,
        lastfm: Arc<LastfmClient>,
        chart_region: String,
    ) -> Self {
        let discovery = DiscoveryResolver::new(spotify.clone(), lastfm.clone());
        let trending = TrendResolver::new(spotify.clone(), lastfm.clone(), chart_region);

        Self {
            spotify,
            lastfm,
            discovery,
            trending,
        }
    }

    /// Generate a blended playlist for the given members
    ///
    /// Returns at most `total_tracks` tracks, unique by catalog id,
    /// attributed to the member(s) each pick was generated for. An
    /// empty member list yields an empty result; upstream failures
    /// degrade to a shorter (possibly empty) playlist, never an error.
    pub async fn generate(
        &self,
        members: &[MemberProfile],
        token: &str,
        total_tracks: usize,
        mode: PlaylistMode,
    ) -> Vec<GeneratedTrack> {
        if members.is_empty() {
            return Vec::new();
        }

        let secondary = self.lastfm.is_available();
        let (_all_genres, shared_genres) = aggregate_genres(members);
        let budget = allocate_budget(total_tracks, members.len(), !shared_genres.is_empty(), secondary);
        debug!(
            trending = budget.trending,
            shared = budget.shared,
            individual = budget.individual,
            per_member = budget.per_member,
            members = members.len(),
            mode = mode.label(),
            "Allocated track budget"
        );

        // Shared pool: top artists pooled across members, and the
        // members attributed to the strongest shared genres
        let shared_artist_pool: Vec<String> = members
            .iter()
            .flat_map(|m| {
                m.artists
                    .iter()
                    .take(SHARED_ARTISTS_PER_MEMBER)
                    .map(|a| a.value.clone())
            })
            .take(SHARED_ARTIST_POOL)
            .collect();
        let shared_member_names = unique_in_order(
            shared_genres
                .iter()
                .take(3)
                .flat_map(|g| g.members.iter().cloned()),
        );
        let all_member_genres = unique_in_order(
            members
                .iter()
                .flat_map(|m| m.genres.iter().map(|g| g.value.clone())),
        );

        let trending_branch = async {
            if budget.trending > 0 {
                self.trending.trending(token, budget.trending, mode).await
            } else {
                Vec::new()
            }
        };

        let shared_branch = async {
            if budget.shared > 0 && secondary && !shared_artist_pool.is_empty() {
                let reason = format!(
                    "shared taste: {}",
                    genre_names(&shared_genres, 2).join(", ")
                );
                let seeds = &shared_artist_pool[..shared_artist_pool.len().min(SHARED_SEED_ARTISTS)];
                self.discovery
                    .discover(
                        token,
                        seeds,
                        budget.shared,
                        &reason,
                        &shared_member_names,
                        &all_member_genres,
                    )
                    .await
            } else {
                Vec::new()
            }
        };

        let member_branches = join_all(members.iter().map(|member| async move {
            if !secondary || member.artists.is_empty() {
                return Vec::new();
            }
            let seeds: Vec<String> = member
                .artists
                .iter()
                .take(2)
                .map(|a| a.value.clone())
                .collect();
            let member_genres: Vec<String> =
                member.genres.iter().map(|g| g.value.clone()).collect();
            let names = [member.display_name.clone()];
            let reason = format!("{} likes {}", member.display_name, seeds[0]);
            self.discovery
                .discover(token, &seeds, budget.per_member, &reason, &names, &member_genres)
                .await
        }));

        let (trending_tracks, shared_tracks, member_tracks) =
            tokio::join!(trending_branch, shared_branch, member_branches);

        // Merge with fixed precedence: trending, shared, individual.
        // Precedence decides which provenance tag wins a duplicate.
        let mut used: HashSet<String> = HashSet::new();
        let mut result: Vec<GeneratedTrack> = Vec::new();

        for track in trending_tracks {
            push_unique(&mut result, &mut used, track);
        }

        let mut shared_added = 0usize;
        for track in shared_tracks {
            if shared_added >= budget.shared {
                break;
            }
            if push_unique(&mut result, &mut used, track) {
                shared_added += 1;
            }
        }

        if budget.shared > 0 && !shared_genres.is_empty() && shared_added < budget.shared {
            shared_added += self
                .backfill_shared(
                    token,
                    &shared_genres,
                    &shared_artist_pool,
                    &shared_member_names,
                    budget.shared - shared_added,
                    mode,
                    &mut used,
                    &mut result,
                )
                .await;
            debug!(shared_added, "Shared branch after backfill");
        }

        // Individual picks follow member input order, not completion
        // order: branch results were collected positionally.
        for (member, discovered) in members.iter().zip(member_tracks) {
            if member.genres.is_empty() && member.artists.is_empty() {
                continue;
            }

            let mut added = 0usize;
            for track in discovered {
                if added >= budget.per_member {
                    break;
                }
                if push_unique(&mut result, &mut used, track) {
                    added += 1;
                }
            }

            if added < budget.per_member {
                self.backfill_member(
                    token,
                    member,
                    budget.per_member - added,
                    mode,
                    &mut used,
                    &mut result,
                )
                .await;
            }
        }

        let filtered = enforce_artist_diversity(result);

        if mode != PlaylistMode::Mixed && !filtered.is_empty() {
            let ids: Vec<String> = filtered.iter().map(|t| t.track.id.clone()).collect();
            match self.spotify.audio_features(token, &ids).await {
                Ok(features) => return filter_by_mode_energy(filtered, &features, mode),
                Err(e) => {
                    warn!(error = %e, "Audio features fetch failed, skipping energy filter");
                }
            }
        }

        filtered
    }

    /// Backfill the shared pool via search-based recommendations
    /// seeded by the strongest shared genres and pooled artists
    #[allow(clippy::too_many_arguments)]
    async fn backfill_shared(
        &self,
        token: &str,
        shared_genres: &[GenreScore],
        shared_artist_pool: &[String],
        shared_member_names: &[String],
        needed: usize,
        mode: PlaylistMode,
        used: &mut HashSet<String>,
        result: &mut Vec<GeneratedTrack>,
    ) -> usize {
        let seed_genres = genre_names(shared_genres, 3);
        let seed_artists: Vec<String> = shared_artist_pool.iter().take(2).cloned().collect();

        // Non-default modes prepend mode tags to the genre seed list
        let mut seeds: Vec<String> = if mode != PlaylistMode::Mixed {
            mode.tags()
                .iter()
                .take(2)
                .map(|t| t.to_string())
                .chain(seed_genres.iter().cloned())
                .collect()
        } else {
            seed_genres.clone()
        };
        seeds.truncate(5);

        let tracks = self
            .spotify
            .recommendations_by_search(token, &seeds, &seed_artists, needed)
            .await;

        let reason = format!("shared: {}", seed_genres.iter().take(2).cloned().collect::<Vec<_>>().join(", "));
        let mut added = 0usize;
        for track in tracks {
            if added >= needed {
                break;
            }
            let pick = GeneratedTrack {
                track,
                reason: reason.clone(),
                for_members: shared_member_names.to_vec(),
            };
            if push_unique(result, used, pick) {
                added += 1;
            }
        }
        added
    }

    /// Backfill one member's pool, rotating across their genres
    async fn backfill_member(
        &self,
        token: &str,
        member: &MemberProfile,
        needed: usize,
        mode: PlaylistMode,
        used: &mut HashSet<String>,
        result: &mut Vec<GeneratedTrack>,
    ) -> usize {
        let mut genres: Vec<String> = member.genres.iter().map(|g| g.value.clone()).collect();
        genres.shuffle(&mut rand::thread_rng());
        if genres.is_empty() {
            genres.push("pop".to_string());
        }

        let member_artists: Vec<String> = member
            .artists
            .iter()
            .take(3)
            .map(|a| a.value.clone())
            .collect();

        let groups = genres.len().min(BACKFILL_GENRE_GROUPS);
        let per_genre = needed.div_ceil(groups).max(1);

        let mut added = 0usize;
        for genre in genres.iter().take(groups) {
            if added >= needed {
                break;
            }

            let mut seeds: Vec<String> = vec![genre.clone()];
            if mode != PlaylistMode::Mixed {
                if let Some(tag) = mode.tags().first() {
                    seeds.push(tag.to_string());
                }
            }

            let tracks = self
                .spotify
                .recommendations_by_search(token, &seeds, &member_artists, per_genre + 2)
                .await;

            for track in tracks {
                if added >= needed {
                    break;
                }
                let pick = GeneratedTrack {
                    track,
                    reason: format!("{}'s {}", member.display_name, genre),
                    for_members: vec![member.display_name.clone()],
                };
                if push_unique(result, used, pick) {
                    added += 1;
                }
            }
        }
        added
    }
}

fn genre_names(genres: &[GenreScore], count: usize) -> Vec<String> {
    genres.iter().take(count).map(|g| g.genre.clone()).collect()
}
