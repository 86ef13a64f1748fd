//! Cached text-to-speech narration for narrated animation scenes.
//!
//! [`NarrationCache`] turns a line of narration into an audio file and its
//! exact length, keeping every synthesized clip on disk keyed by the text's
//! hash. [`scene::Timeline`] uses those lengths to pad each scene segment so
//! visuals and speech end together.

pub mod api;
pub mod audio;
pub mod cache;
pub mod config;
pub mod error;
pub mod scene;

pub use cache::{
    fingerprint, resolve_narration, resolve_narration_in, NarrationCache, NarrationOrigin, NarrationResult,
};
pub use config::{FallbackPolicy, NarrationConfig};
pub use error::{NarrationError, Result};
