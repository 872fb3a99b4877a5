//! CORS-enabling reverse proxy for HLS.
//!
//! Playlists are fetched from the origin, every URI inside them is rewritten
//! to route back through this service, and media segments are relayed with
//! permissive CORS headers so browser players can consume streams from
//! origins that would otherwise refuse cross-origin requests.

pub mod config;
pub mod error;
pub mod hls;
pub mod metrics;
pub mod origin;
pub mod pipeline;
pub mod server;
