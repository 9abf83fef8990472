//! Core types for Reel - the parsed HLS playlist model

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// A single playlist tag line, split into name, raw value, and attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name without the leading '#' (e.g. "EXT-X-STREAM-INF")
    pub name: String,
    /// Everything after the first ':' on the line, verbatim
    pub raw_value: Option<String>,
    /// Parsed attribute list, preserving source order
    pub attributes: IndexMap<String, String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, raw_value: Option<String>) -> Self {
        Self {
            name: name.into(),
            raw_value,
            attributes: IndexMap::new(),
        }
    }

    /// Returns the attribute value for `key`, if present
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A parsed playlist, either master (multivariant) or media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Playlist {
    Master(MasterPlaylist),
    Media(MediaPlaylist),
}

impl Playlist {
    /// Protocol compatibility version declared by the playlist
    pub fn version(&self) -> u32 {
        match self {
            Playlist::Master(p) => p.version,
            Playlist::Media(p) => p.version,
        }
    }

    /// Location the playlist was loaded from
    pub fn uri(&self) -> &Url {
        match self {
            Playlist::Master(p) => &p.uri,
            Playlist::Media(p) => &p.uri,
        }
    }

    /// All tags in file order
    pub fn tags(&self) -> &[Tag] {
        match self {
            Playlist::Master(p) => &p.tags,
            Playlist::Media(p) => &p.tags,
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self, Playlist::Master(_))
    }

    /// Narrows to a master playlist, or fails with the playlist location
    pub fn into_master(self) -> Result<MasterPlaylist> {
        match self {
            Playlist::Master(p) => Ok(p),
            Playlist::Media(p) => Err(Error::NotMasterPlaylist { uri: p.uri }),
        }
    }

    /// Narrows to a media playlist, or fails with the playlist location
    pub fn into_media(self) -> Result<MediaPlaylist> {
        match self {
            Playlist::Media(p) => Ok(p),
            Playlist::Master(p) => Err(Error::NotMediaPlaylist { uri: p.uri }),
        }
    }
}

/// Master playlist referencing variant streams and rendition groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterPlaylist {
    pub version: u32,
    pub uri: Url,
    pub tags: Vec<Tag>,
    pub streams: Vec<StreamInfo>,
    pub rendition_groups: Vec<RenditionGroup>,
}

/// Media playlist carrying the segment timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPlaylist {
    pub version: u32,
    pub uri: Url,
    pub tags: Vec<Tag>,
    /// Upper bound on segment duration in seconds
    pub target_duration: f64,
    /// True while the playlist has no EXT-X-ENDLIST (live/event)
    pub is_endless: bool,
    /// Sequence number of the first segment
    pub media_sequence: u64,
    pub has_discontinuity: bool,
    pub playlist_type: Option<String>,
    pub iframes_only: bool,
    pub segments: Vec<MediaSegment>,
}

impl MediaPlaylist {
    /// Sum of all segment durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// One variant stream entry from EXT-X-STREAM-INF
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Resolved media playlist location, if the variant carried one
    pub uri: Option<Url>,
    /// Peak bandwidth in bits per second
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub codecs: Option<String>,
    pub resolution: Option<String>,
    pub frame_rate: Option<f32>,
    pub name: Option<String>,
    pub audio_group: Option<String>,
    pub subtitle_group: Option<String>,
    pub closed_captions_group: Option<String>,
    pub video_range: Option<String>,
    /// Attributes not promoted to a field above, in source order
    pub attributes: IndexMap<String, String>,
}

impl std::fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}kbps {}",
            self.resolution.as_deref().unwrap_or(""),
            self.bandwidth / 1000,
            self.codecs.as_deref().unwrap_or("")
        )
    }
}

/// Alternative renditions sharing a TYPE and GROUP-ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionGroup {
    /// Rendition type (AUDIO, VIDEO, SUBTITLES, CLOSED-CAPTIONS)
    pub media_type: String,
    pub group_id: String,
    pub renditions: Vec<Rendition>,
}

/// One EXT-X-MEDIA rendition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rendition {
    pub uri: Option<Url>,
    pub name: Option<String>,
    pub language: Option<String>,
    pub is_default: bool,
    pub is_forced: bool,
    pub is_autoselect: bool,
    pub characteristics: Option<String>,
    /// Attributes not promoted to a field above, in source order
    pub attributes: IndexMap<String, String>,
}

/// One media segment, with the playback context active at its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSegment {
    /// Resolved segment location
    pub uri: Url,
    /// Duration in seconds from EXTINF
    pub duration: f64,
    pub title: Option<String>,
    pub sequence_number: u64,
    /// True when a discontinuity precedes this segment
    pub has_discontinuity: bool,
    /// Raw EXT-X-BYTERANGE value ("length[@offset]")
    pub byte_range: Option<String>,
    /// Encryption in effect for this segment
    pub encryption: Option<EncryptionInfo>,
    /// Wall-clock time of the first sample, from EXT-X-PROGRAM-DATE-TIME
    pub program_date_time: Option<DateTime<FixedOffset>>,
    /// Tags between this segment's EXTINF and the next, excluding the URI line
    pub tags: Vec<Tag>,
}

/// Segment encryption parameters from EXT-X-KEY
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EncryptionInfo {
    pub method: EncryptionMethod,
    pub key_uri: Option<Url>,
    pub iv: Option<String>,
    pub key_format: Option<String>,
    pub key_format_versions: Option<String>,
}

/// Encryption method declared by EXT-X-KEY
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionMethod {
    #[default]
    None,
    Aes128,
    SampleAes,
    Other(String),
}

impl From<&str> for EncryptionMethod {
    fn from(value: &str) -> Self {
        match value {
            "NONE" => EncryptionMethod::None,
            "AES-128" => EncryptionMethod::Aes128,
            "SAMPLE-AES" => EncryptionMethod::SampleAes,
            other => EncryptionMethod::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncryptionMethod::None => write!(f, "NONE"),
            EncryptionMethod::Aes128 => write!(f, "AES-128"),
            EncryptionMethod::SampleAes => write!(f, "SAMPLE-AES"),
            EncryptionMethod::Other(s) => write!(f, "{}", s),
        }
    }
}
