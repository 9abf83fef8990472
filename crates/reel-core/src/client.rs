//! Async playlist and segment retrieval

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Error, Result};
use crate::parser::PlaylistParser;
use crate::types::{MasterPlaylist, MediaPlaylist, MediaSegment, Playlist};

/// Abstraction over content retrieval
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches text content such as a playlist document
    async fn fetch_text(&self, url: &Url) -> Result<String>;

    /// Fetches binary content such as a media segment
    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes>;
}

/// HTTP fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Uses a preconfigured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::PlaylistFetch(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| Error::PlaylistFetch(e.to_string()))?;
        response
            .text()
            .await
            .map_err(|e| Error::PlaylistFetch(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::SegmentFetch {
                url: url.to_string(),
                source: e,
            })?;
        let response = response.error_for_status().map_err(|e| Error::SegmentFetch {
            url: url.to_string(),
            source: e,
        })?;
        response.bytes().await.map_err(|e| Error::SegmentFetch {
            url: url.to_string(),
            source: e,
        })
    }
}

/// High-level client for retrieving and parsing playlists
pub struct HlsClient {
    fetcher: Box<dyn ContentFetcher>,
    parser: PlaylistParser,
}

impl HlsClient {
    pub fn new() -> Self {
        Self::with_fetcher(Box::new(HttpFetcher::new()))
    }

    /// Uses a preconfigured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self::with_fetcher(Box::new(HttpFetcher::with_client(client)))
    }

    /// Uses a custom content fetcher
    pub fn with_fetcher(fetcher: Box<dyn ContentFetcher>) -> Self {
        Self {
            fetcher,
            parser: PlaylistParser::new(),
        }
    }

    /// Retrieves and parses the playlist at `uri`
    #[instrument(skip(self))]
    pub async fn get_playlist(&self, uri: &Url) -> Result<Playlist> {
        debug!("Fetching playlist: {}", uri);
        let content = self.fetcher.fetch_text(uri).await?;
        self.parser.parse(&content, uri)
    }

    /// Retrieves the playlist at `uri`, requiring a master playlist
    pub async fn get_master_playlist(&self, uri: &Url) -> Result<MasterPlaylist> {
        self.get_playlist(uri).await?.into_master()
    }

    /// Retrieves the playlist at `uri`, requiring a media playlist
    pub async fn get_media_playlist(&self, uri: &Url) -> Result<MediaPlaylist> {
        self.get_playlist(uri).await?.into_media()
    }

    /// Retrieves the binary payload of a media segment
    #[instrument(skip(self, segment))]
    pub async fn get_segment(&self, segment: &MediaSegment) -> Result<Bytes> {
        debug!(
            sequence = segment.sequence_number,
            "Fetching segment: {}", segment.uri
        );
        self.fetcher.fetch_bytes(&segment.uri).await
    }
}

impl Default for HlsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticFetcher {
        documents: HashMap<String, String>,
        payloads: HashMap<String, Bytes>,
    }

    impl StaticFetcher {
        fn new() -> Self {
            Self {
                documents: HashMap::new(),
                payloads: HashMap::new(),
            }
        }

        fn with_document(mut self, url: &str, content: &str) -> Self {
            self.documents.insert(url.to_string(), content.to_string());
            self
        }

        fn with_payload(mut self, url: &str, payload: &[u8]) -> Self {
            self.payloads
                .insert(url.to_string(), Bytes::copy_from_slice(payload));
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch_text(&self, url: &Url) -> Result<String> {
            self.documents
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::PlaylistFetch(format!("no document at {}", url)))
        }

        async fn fetch_bytes(&self, url: &Url) -> Result<Bytes> {
            self.payloads
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::PlaylistFetch(format!("no payload at {}", url)))
        }
    }

    #[tokio::test]
    async fn test_get_media_playlist_fetches_and_parses() {
        let fetcher = StaticFetcher::new().with_document(
            "http://example.com/media.m3u8",
            "#EXTM3U\n#EXT-X-TARGETDURATION:8\n#EXTINF:7.975,\nsegment-1.ts\n#EXT-X-ENDLIST\n",
        );
        let client = HlsClient::with_fetcher(Box::new(fetcher));
        let uri = Url::parse("http://example.com/media.m3u8").unwrap();

        let playlist = client.get_media_playlist(&uri).await.unwrap();
        assert_eq!(playlist.segments.len(), 1);
        assert_eq!(
            playlist.segments[0].uri.as_str(),
            "http://example.com/segment-1.ts"
        );
    }

    #[tokio::test]
    async fn test_get_segment_returns_payload() {
        let fetcher = StaticFetcher::new()
            .with_document(
                "http://example.com/media.m3u8",
                "#EXTM3U\n#EXTINF:4,\nsegment-1.ts\n#EXT-X-ENDLIST\n",
            )
            .with_payload("http://example.com/segment-1.ts", b"\x47\x40\x00");
        let client = HlsClient::with_fetcher(Box::new(fetcher));
        let uri = Url::parse("http://example.com/media.m3u8").unwrap();

        let playlist = client.get_media_playlist(&uri).await.unwrap();
        let payload = client.get_segment(&playlist.segments[0]).await.unwrap();
        assert_eq!(payload.as_ref(), &b"\x47\x40\x00"[..]);
    }
}
