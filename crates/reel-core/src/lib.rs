//! Reel Core - HLS Playlist Engine for Reel
//!
//! This crate provides the core functionality for:
//! - Master playlist parsing with variant streams and rendition groups
//! - Media playlist parsing with per-segment encryption, discontinuity,
//!   and timestamp context
//! - Tag-level access to every playlist line
//! - URI resolution against the playlist location
//! - Async playlist and segment retrieval over HTTP
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │ Line Scanner │───▶│ Tag Dispatch │───▶│ Playlist Builder │
//! └──────────────┘    └──────────────┘    └────────┬─────────┘
//!                                                  │
//! ┌──────────────┐    ┌──────────────┐    ┌────────▼─────────┐
//! │ HTTP Fetcher │───▶│  HLS Client  │    │  Playlist Model  │
//! └──────────────┘    └──────────────┘    └──────────────────┘
//! ```

pub mod client;
pub mod error;
pub mod parser;
pub mod types;
pub mod uri;

pub use client::{ContentFetcher, HlsClient, HttpFetcher};
pub use error::{Error, Result};
pub use parser::PlaylistParser;
pub use types::{
    EncryptionInfo, EncryptionMethod, MasterPlaylist, MediaPlaylist, MediaSegment, Playlist,
    Rendition, RenditionGroup, StreamInfo, Tag,
};

/// Current version of the core engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the core engine with default settings
pub fn init() {
    tracing::info!(version = VERSION, "Reel Core initialized");
}
