//! HLS playlist parsing
//!
//! Parsing runs in two passes:
//! - Scan the document line by line into a flat [`Tag`] sequence, folding
//!   each bare URI line into the tag it follows
//! - Assemble the tag sequence into a [`MasterPlaylist`] or [`MediaPlaylist`],
//!   reconstructing segments with their carried-forward encryption,
//!   discontinuity, and timestamp state

mod tags;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{
    EncryptionInfo, EncryptionMethod, MasterPlaylist, MediaPlaylist, MediaSegment, Playlist,
    Rendition, RenditionGroup, StreamInfo, Tag,
};
use crate::uri;

/// Parser for HLS playlists
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaylistParser;

impl PlaylistParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses `content` as an HLS playlist loaded from `location`
    ///
    /// The playlist is a master playlist when any `EXT-X-STREAM-INF` tag is
    /// present, and a media playlist otherwise.
    #[instrument(skip(self, content))]
    pub fn parse(&self, content: &str, location: &Url) -> Result<Playlist> {
        if content.trim().is_empty() {
            return Err(Error::EmptyPlaylist);
        }

        let mut lines = content.lines();
        match lines.find(|line| !line.trim().is_empty()) {
            Some(line) if line.starts_with("#EXTM3U") => {}
            _ => return Err(Error::MissingHeader),
        }

        let tags = scan_tags(lines);
        let version = extract_version(&tags);
        debug!(tags = tags.len(), version, "Scanned playlist tags");

        if tags.iter().any(|t| t.name == "EXT-X-STREAM-INF") {
            Ok(Playlist::Master(self.build_master(
                version, tags, location,
            )?))
        } else {
            Ok(Playlist::Media(self.build_media(version, tags, location)?))
        }
    }

    fn build_master(
        &self,
        version: u32,
        tags: Vec<Tag>,
        location: &Url,
    ) -> Result<MasterPlaylist> {
        let mut streams = Vec::new();
        for tag in tags.iter().filter(|t| t.name == "EXT-X-STREAM-INF") {
            streams.push(self.build_stream_info(tag, location)?);
        }
        let rendition_groups = self.build_rendition_groups(&tags, location)?;
        debug!(
            streams = streams.len(),
            groups = rendition_groups.len(),
            "Assembled master playlist"
        );

        Ok(MasterPlaylist {
            version,
            uri: location.clone(),
            tags,
            streams,
            rendition_groups,
        })
    }

    fn build_stream_info(&self, tag: &Tag, location: &Url) -> Result<StreamInfo> {
        let mut stream = StreamInfo {
            uri: uri::resolve_optional(location, tag.attribute("URI"))?,
            ..Default::default()
        };

        for (key, value) in &tag.attributes {
            match key.as_str() {
                "URI" => {}
                "BANDWIDTH" => stream.bandwidth = value.parse().unwrap_or(0),
                "AVERAGE-BANDWIDTH" => stream.average_bandwidth = value.parse().ok(),
                "CODECS" => stream.codecs = Some(value.clone()),
                "RESOLUTION" => stream.resolution = Some(value.clone()),
                "FRAME-RATE" => stream.frame_rate = value.parse().ok(),
                "NAME" => stream.name = Some(value.clone()),
                "AUDIO" => stream.audio_group = Some(value.clone()),
                "SUBTITLES" => stream.subtitle_group = Some(value.clone()),
                "CLOSED-CAPTIONS" => stream.closed_captions_group = Some(value.clone()),
                "VIDEO-RANGE" => stream.video_range = Some(value.clone()),
                _ => {
                    stream.attributes.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(stream)
    }

    fn build_rendition_groups(
        &self,
        tags: &[Tag],
        location: &Url,
    ) -> Result<Vec<RenditionGroup>> {
        // Rendition tags without both TYPE and GROUP-ID cannot be grouped
        let mut entries: Vec<(&str, &str, &Tag)> = Vec::new();
        for tag in tags.iter().filter(|t| t.name == "EXT-X-MEDIA") {
            if let (Some(media_type), Some(group_id)) =
                (tag.attribute("TYPE"), tag.attribute("GROUP-ID"))
            {
                entries.push((media_type, group_id, tag));
            }
        }

        let mut media_types: Vec<&str> = Vec::new();
        for &(media_type, _, _) in &entries {
            if !media_types.contains(&media_type) {
                media_types.push(media_type);
            }
        }

        let mut groups = Vec::new();
        for media_type in media_types {
            let mut group_ids: Vec<&str> = Vec::new();
            for &(entry_type, group_id, _) in &entries {
                if entry_type == media_type && !group_ids.contains(&group_id) {
                    group_ids.push(group_id);
                }
            }

            for group_id in group_ids {
                let mut renditions = Vec::new();
                for &(entry_type, entry_group, tag) in &entries {
                    if entry_type == media_type && entry_group == group_id {
                        renditions.push(self.build_rendition(tag, location)?);
                    }
                }

                groups.push(RenditionGroup {
                    media_type: media_type.to_string(),
                    group_id: group_id.to_string(),
                    renditions,
                });
            }
        }

        Ok(groups)
    }

    fn build_rendition(&self, tag: &Tag, location: &Url) -> Result<Rendition> {
        let mut rendition = Rendition {
            uri: uri::resolve_optional(location, tag.attribute("URI"))?,
            ..Default::default()
        };

        for (key, value) in &tag.attributes {
            match key.as_str() {
                "TYPE" | "GROUP-ID" | "URI" => {}
                "NAME" => rendition.name = Some(value.clone()),
                "LANGUAGE" => rendition.language = Some(value.clone()),
                "DEFAULT" => rendition.is_default = value.eq_ignore_ascii_case("YES"),
                "FORCED" => rendition.is_forced = value.eq_ignore_ascii_case("YES"),
                "AUTOSELECT" => rendition.is_autoselect = value.eq_ignore_ascii_case("YES"),
                "CHARACTERISTICS" => rendition.characteristics = Some(value.clone()),
                _ => {
                    rendition.attributes.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(rendition)
    }

    fn build_media(&self, version: u32, tags: Vec<Tag>, location: &Url) -> Result<MediaPlaylist> {
        let target_duration = first_raw_value(&tags, "EXT-X-TARGETDURATION")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0.0);
        let media_sequence = first_raw_value(&tags, "EXT-X-MEDIA-SEQUENCE")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let playlist_type = first_raw_value(&tags, "EXT-X-PLAYLIST-TYPE").map(str::to_string);
        let is_endless = !tags.iter().any(|t| t.name == "EXT-X-ENDLIST");
        let iframes_only = tags.iter().any(|t| t.name == "EXT-X-I-FRAMES-ONLY");
        let has_discontinuity = tags.iter().any(|t| t.name == "EXT-X-DISCONTINUITY");

        let segments = self.build_segments(&tags, media_sequence, location)?;
        debug!(
            segments = segments.len(),
            endless = is_endless,
            "Assembled media playlist"
        );

        Ok(MediaPlaylist {
            version,
            uri: location.clone(),
            tags,
            target_duration,
            is_endless,
            media_sequence,
            has_discontinuity,
            playlist_type,
            iframes_only,
            segments,
        })
    }

    fn build_segments(
        &self,
        tags: &[Tag],
        media_sequence: u64,
        location: &Url,
    ) -> Result<Vec<MediaSegment>> {
        let inf_positions: Vec<usize> = tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.name == "EXTINF")
            .map(|(position, _)| position)
            .collect();

        let mut segments = Vec::new();
        let mut current_encryption: Option<EncryptionInfo> = None;
        let mut current_program_date_time: Option<DateTime<FixedOffset>> = None;
        let mut pending_discontinuity = false;

        for (inf_index, &position) in inf_positions.iter().enumerate() {
            let inf = &tags[position];
            let uri_value = match inf.attribute("URI") {
                Some(value) => value,
                None => {
                    warn!(position, "Skipping EXTINF with no media URI");
                    continue;
                }
            };

            let mut segment = MediaSegment {
                uri: uri::resolve(location, uri_value)?,
                duration: inf
                    .attribute("DURATION")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.0),
                title: inf.attribute("TITLE").map(str::to_string),
                sequence_number: media_sequence + segments.len() as u64,
                has_discontinuity: pending_discontinuity,
                byte_range: None,
                encryption: current_encryption.clone(),
                program_date_time: current_program_date_time,
                tags: Vec::new(),
            };

            // The window closes at the next EXTINF position, accepted or not
            let window_end = inf_positions
                .get(inf_index + 1)
                .copied()
                .unwrap_or(tags.len());
            for tag in &tags[position + 1..window_end] {
                match tag.name.as_str() {
                    // A literal "#URI" tag line carries no segment context
                    "URI" => continue,
                    "EXT-X-DISCONTINUITY" => {
                        pending_discontinuity = true;
                        segment.has_discontinuity = true;
                    }
                    "EXT-X-KEY" => {
                        let encryption = self.parse_encryption(tag, location)?;
                        segment.encryption = Some(encryption.clone());
                        current_encryption = Some(encryption);
                    }
                    "EXT-X-BYTERANGE" => {
                        segment.byte_range = tag.raw_value.clone();
                    }
                    "EXT-X-PROGRAM-DATE-TIME" => {
                        if let Some(value) = &tag.raw_value {
                            if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
                                current_program_date_time = Some(date_time);
                                segment.program_date_time = Some(date_time);
                            }
                        }
                    }
                    _ => {}
                }
                segment.tags.push(tag.clone());
            }

            segments.push(segment);
            pending_discontinuity = false;
        }

        Ok(segments)
    }

    fn parse_encryption(&self, tag: &Tag, location: &Url) -> Result<EncryptionInfo> {
        Ok(EncryptionInfo {
            method: tag
                .attribute("METHOD")
                .map(EncryptionMethod::from)
                .unwrap_or_default(),
            key_uri: uri::resolve_optional(location, tag.attribute("URI"))?,
            iv: tag.attribute("IV").map(str::to_string),
            key_format: tag.attribute("KEYFORMAT").map(str::to_string),
            key_format_versions: tag.attribute("KEYFORMATVERSIONS").map(str::to_string),
        })
    }
}

/// Scans the lines after the header into the flat tag sequence
fn scan_tags<'a, I>(lines: I) -> Vec<Tag>
where
    I: Iterator<Item = &'a str>,
{
    let mut tags: Vec<Tag> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if let Some(tag) = tags::parse_tag_line(line) {
                tags.push(tag);
            }
        } else if let Some(last) = tags.last_mut() {
            // Bare URI line, folded into the tag it follows
            last.attributes.insert("URI".to_string(), line.to_string());
        }
    }
    tags
}

/// Version from the first EXT-X-VERSION tag, defaulting to 1
fn extract_version(tags: &[Tag]) -> u32 {
    tags.iter()
        .find(|t| t.name == "EXT-X-VERSION")
        .and_then(|t| t.raw_value.as_deref())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1)
}

fn first_raw_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.name == name)
        .and_then(|t| t.raw_value.as_deref())
        .filter(|v| !v.is_empty())
}
