//! Generation services
//!
//! Catalog clients, matching and scoring helpers, and the pipeline
//! stages the generator composes.

pub mod cache;
pub mod discovery;
pub mod generator;
pub mod genre_affinity;
pub mod lastfm_client;
pub mod name_matcher;
pub mod request_gate;
pub mod spotify_client;
pub mod trending;

pub use generator::PlaylistGenerator;
pub use lastfm_client::LastfmClient;
pub use request_gate::RequestGate;
pub use spotify_client::SpotifyClient;
