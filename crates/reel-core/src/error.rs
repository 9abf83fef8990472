//! Error types for Reel Core

use thiserror::Error;
use url::Url;

/// Result type alias for playlist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Playlist error types
#[derive(Error, Debug)]
pub enum Error {
    // Format errors
    #[error("Invalid playlist format: missing #EXTM3U tag")]
    MissingHeader,

    #[error("Playlist content cannot be empty")]
    EmptyPlaylist,

    #[error("Invalid URI reference: {reference}")]
    InvalidReference {
        reference: String,
        source: url::ParseError,
    },

    // Narrowing errors
    #[error("The playlist at {uri} is not a master playlist")]
    NotMasterPlaylist { uri: Url },

    #[error("The playlist at {uri} is not a media playlist")]
    NotMediaPlaylist { uri: Url },

    // Transport errors
    #[error("Failed to fetch playlist: {0}")]
    PlaylistFetch(String),

    #[error("Failed to fetch segment: {url}")]
    SegmentFetch { url: String, source: reqwest::Error },
}

impl Error {
    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::PlaylistFetch(_) | Error::SegmentFetch { .. })
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingHeader => "MISSING_HEADER",
            Error::EmptyPlaylist => "EMPTY_PLAYLIST",
            Error::InvalidReference { .. } => "INVALID_REFERENCE",
            Error::NotMasterPlaylist { .. } => "NOT_MASTER",
            Error::NotMediaPlaylist { .. } => "NOT_MEDIA",
            Error::PlaylistFetch(_) => "PLAYLIST_FETCH",
            Error::SegmentFetch { .. } => "SEGMENT_FETCH",
        }
    }
}
