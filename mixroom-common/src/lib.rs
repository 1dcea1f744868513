//! # Mixroom Common Library
//!
//! Shared code for the mixroom playlist services including:
//! - Boundary data model (member profiles, tracks, playlist modes)
//! - Common error types
//! - Configuration loading

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
