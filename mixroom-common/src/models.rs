//! Boundary data model for playlist generation
//!
//! Types exchanged between the generation engine and its callers, plus
//! the catalog track shapes shared by the client and orchestration
//! layers. Catalog responses are deserialized defensively: upstream
//! payloads are never trusted to be fully populated.

use serde::{Deserialize, Serialize};

fn default_weight() -> f64 {
    1.0
}

/// A single weighted preference entry (genre or artist name)
///
/// Weight is a positive real reflecting preference strength; callers
/// that do not track weights omit the field and get 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedPref {
    pub value: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// One room member's taste profile, owned by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub member_id: String,
    pub display_name: String,
    #[serde(default)]
    pub genres: Vec<WeightedPref>,
    #[serde(default)]
    pub artists: Vec<WeightedPref>,
}

/// Artist reference as it appears inside a catalog track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Album artwork image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

/// Album reference as it appears inside a catalog track
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A concrete catalog track (primary catalog search/chart shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

/// A generated track with provenance attribution
///
/// `reason` is a human-readable tag describing why the track was
/// picked; `for_members` names the member(s) it was generated for.
/// Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTrack {
    #[serde(flatten)]
    pub track: Track,
    pub reason: String,
    #[serde(rename = "forMembers")]
    pub for_members: Vec<String>,
}

/// Audio descriptors for one track (most values in [0, 1], tempo in BPM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    #[serde(default)]
    pub energy: f64,
    #[serde(default)]
    pub danceability: f64,
    #[serde(default)]
    pub valence: f64,
    #[serde(default)]
    pub tempo: f64,
    #[serde(default)]
    pub acousticness: f64,
    #[serde(default)]
    pub instrumentalness: f64,
}

/// Playlist generation mode
///
/// Each mode maps to a static set of tag keywords (used to bias
/// recommendations and tag-chart lookups) and a human label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistMode {
    #[default]
    Mixed,
    Dinner,
    Party,
    Background,
    Workout,
}

impl PlaylistMode {
    /// Tag keywords associated with this mode (empty for Mixed)
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            PlaylistMode::Mixed => &[],
            PlaylistMode::Dinner => &["dinner", "jazz", "acoustic", "bossa nova", "lounge"],
            PlaylistMode::Party => &["party", "dance", "edm", "club", "pop"],
            PlaylistMode::Background => {
                &["ambient", "chillout", "instrumental", "lo-fi", "downtempo"]
            }
            PlaylistMode::Workout => &["workout", "gym", "running", "electronic", "high energy"],
        }
    }

    /// Human-readable label for reason strings
    pub fn label(&self) -> &'static str {
        match self {
            PlaylistMode::Mixed => "Mixed",
            PlaylistMode::Dinner => "Dinner",
            PlaylistMode::Party => "Party",
            PlaylistMode::Background => "Background",
            PlaylistMode::Workout => "Workout",
        }
    }

    /// High-energy modes select viral charts instead of top charts
    pub fn is_energetic(&self) -> bool {
        matches!(self, PlaylistMode::Party | PlaylistMode::Workout)
    }
}

/// Aggregated per-genre score for one generation run
///
/// Created and discarded within a single generation call.
#[derive(Debug, Clone)]
pub struct GenreScore {
    pub genre: String,
    pub total_weight: f64,
    pub member_count: usize,
    pub members: Vec<String>,
}
