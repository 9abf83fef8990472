//! CLI command implementations

use anyhow::Context;
use console::style;
use tracing::debug;
use url::Url;

use reel_core::{
    HlsClient, MasterPlaylist, MediaPlaylist, MediaSegment, Playlist, PlaylistParser, Tag,
};

use crate::output::{self, OutputFormat};

/// Load a playlist from an HTTP(S) URL or a local file path
async fn load_playlist(source: &str) -> anyhow::Result<Playlist> {
    if let Ok(url) = Url::parse(source) {
        if matches!(url.scheme(), "http" | "https") {
            let client = HlsClient::new();
            return Ok(client.get_playlist(&url).await?);
        }
    }

    debug!(path = source, "Reading playlist from disk");
    let path = std::fs::canonicalize(source)
        .with_context(|| format!("Cannot resolve path: {}", source))?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Cannot read playlist: {}", path.display()))?;
    let url = Url::from_file_path(&path)
        .map_err(|_| anyhow::anyhow!("Cannot build a file URL for {}", path.display()))?;

    Ok(PlaylistParser::new().parse(&content, &url)?)
}

/// Analyze a playlist
pub async fn analyze(source: &str, format: &str) -> anyhow::Result<()> {
    let playlist = load_playlist(source).await?;

    if let OutputFormat::Json = OutputFormat::from(format) {
        println!("{}", output::to_json(&playlist)?);
        return Ok(());
    }

    println!("Analyzing playlist: {}", source);
    match &playlist {
        Playlist::Master(master) => display_master(master),
        Playlist::Media(media) => display_media(media),
    }

    Ok(())
}

/// List media segments
pub async fn segments(source: &str, limit: usize, format: &str) -> anyhow::Result<()> {
    let media = load_playlist(source).await?.into_media()?;
    let shown = if limit == 0 {
        media.segments.len()
    } else {
        limit.min(media.segments.len())
    };

    if let OutputFormat::Json = OutputFormat::from(format) {
        println!("{}", output::to_json(&media.segments[..shown])?);
        return Ok(());
    }

    println!("Segments in {}:", media.uri);
    display_segments(&media.segments, shown);

    Ok(())
}

/// Dump raw playlist tags
pub async fn tags(source: &str, format: &str) -> anyhow::Result<()> {
    let playlist = load_playlist(source).await?;

    if let OutputFormat::Json = OutputFormat::from(format) {
        println!("{}", output::to_json(playlist.tags())?);
        return Ok(());
    }

    println!("Tags in {}:", playlist.uri());
    display_tags(playlist.tags());

    Ok(())
}

fn display_master(master: &MasterPlaylist) {
    println!("\n{}", style("MASTER PLAYLIST").green().bold());
    println!("  Version: {}", master.version);
    println!("  URI: {}", master.uri);
    println!("  Variants: {}", master.streams.len());

    let mut streams: Vec<_> = master.streams.iter().collect();
    streams.sort_by(|a, b| b.bandwidth.cmp(&a.bandwidth));

    println!("\nVariant Streams:");
    for (i, stream) in streams.iter().enumerate() {
        println!("  {}. {}", i + 1, stream);
        if let Some(average) = stream.average_bandwidth {
            println!("     Average: {}kbps", average / 1000);
        }
        if let Some(frame_rate) = stream.frame_rate {
            println!("     Frame rate: {}", frame_rate);
        }
        if let Some(uri) = &stream.uri {
            println!("     URI: {}", uri);
        }
    }

    if !master.rendition_groups.is_empty() {
        println!("\nRendition Groups:");
        for group in &master.rendition_groups {
            println!("  {} \"{}\":", group.media_type, group.group_id);
            for rendition in &group.renditions {
                let mut flags = Vec::new();
                if rendition.is_default {
                    flags.push("default");
                }
                if rendition.is_forced {
                    flags.push("forced");
                }
                if rendition.is_autoselect {
                    flags.push("autoselect");
                }

                let name = rendition.name.as_deref().unwrap_or("(unnamed)");
                let language = rendition.language.as_deref().unwrap_or("-");
                if flags.is_empty() {
                    println!("    - {} [{}]", name, language);
                } else {
                    println!("    - {} [{}] {}", name, language, flags.join(","));
                }
            }
        }
    }

    display_tags(&master.tags);
}

fn display_media(media: &MediaPlaylist) {
    println!("\n{}", style("MEDIA PLAYLIST").green().bold());
    println!("  Version: {}", media.version);
    println!("  URI: {}", media.uri);
    println!("  Target duration: {}s", media.target_duration);
    println!("  Media sequence: {}", media.media_sequence);
    println!("  Endless: {}", media.is_endless);
    if let Some(playlist_type) = &media.playlist_type {
        println!("  Type: {}", playlist_type);
    }
    if media.iframes_only {
        println!("  I-frames only: true");
    }
    if media.has_discontinuity {
        println!("  Has discontinuity: true");
    }
    println!("  Segments: {}", media.segments.len());
    println!("  Total duration: {:.3}s", media.total_duration());

    display_segments(&media.segments, 10.min(media.segments.len()));
    display_tags(&media.tags);
}

fn display_segments(segments: &[MediaSegment], shown: usize) {
    println!("\nSegments:");
    for segment in &segments[..shown] {
        println!(
            "  #{} {:.3}s {}",
            segment.sequence_number, segment.duration, segment.uri
        );
        if segment.has_discontinuity {
            println!("     discontinuity");
        }
        if let Some(byte_range) = &segment.byte_range {
            println!("     byte range: {}", byte_range);
        }
        if let Some(date_time) = &segment.program_date_time {
            println!("     date time: {}", date_time.to_rfc3339());
        }
        if let Some(encryption) = &segment.encryption {
            match &encryption.key_uri {
                Some(key_uri) => {
                    println!("     encryption: {} key {}", encryption.method, key_uri)
                }
                None => println!("     encryption: {}", encryption.method),
            }
        }
    }
    if segments.len() > shown {
        println!("  ... {} more segments ...", segments.len() - shown);
    }
}

fn display_tags(tags: &[Tag]) {
    println!("\nTags:");
    for tag in tags {
        match &tag.raw_value {
            Some(value) => println!("  #{}:{}", tag.name, value),
            None => println!("  #{}", tag.name),
        }
    }
}
