//! Tag line parsing and attribute tokenization

use indexmap::IndexMap;

use crate::types::Tag;

/// Tags whose value is an attribute list rather than a bare scalar
const ATTRIBUTE_TAGS: [&str; 7] = [
    "EXT-X-MEDIA",
    "EXT-X-I-FRAME-STREAM-INF",
    "EXT-X-SESSION-KEY",
    "EXT-X-SESSION-DATA",
    "EXT-X-KEY",
    "EXT-X-MAP",
    "EXT-X-DATERANGE",
];

/// Parses one '#'-prefixed line into a tag, or None for malformed lines
pub(crate) fn parse_tag_line(line: &str) -> Option<Tag> {
    let rest = line.strip_prefix('#')?;
    let (name, raw_value) = match rest.split_once(':') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }

    let mut tag = Tag::new(name, raw_value);
    match tag.name.as_str() {
        // Version value is a bare integer, kept verbatim
        "EXT-X-VERSION" => {}
        "EXT-X-STREAM-INF" => {
            if let Some(value) = &tag.raw_value {
                tag.attributes = parse_attribute_list(value);
            }
        }
        "EXTINF" => {
            if let Some(value) = tag.raw_value.clone() {
                parse_segment_info(&value, &mut tag.attributes);
            }
        }
        name => {
            if ATTRIBUTE_TAGS.contains(&name) {
                if let Some(value) = &tag.raw_value {
                    tag.attributes = parse_attribute_list(value);
                }
            }
        }
    }
    Some(tag)
}

/// Splits an EXTINF value ("<duration>[,<title>]") into attributes
fn parse_segment_info(value: &str, attributes: &mut IndexMap<String, String>) {
    let (duration_part, title) = match value.split_once(',') {
        Some((duration, title)) => (duration, Some(title)),
        None => (value, None),
    };

    // The duration part must be digits and dots only, or the whole
    // value is left unparsed
    if duration_part.is_empty()
        || !duration_part
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.')
    {
        return;
    }

    if let Ok(duration) = duration_part.parse::<f64>() {
        attributes.insert("DURATION".to_string(), duration.to_string());
    }

    match title {
        Some(title) if !title.is_empty() => {
            attributes.insert("TITLE".to_string(), title.to_string());
        }
        _ => {}
    }
}

fn is_attribute_key_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-'
}

/// Tokenizes a comma-separated attribute list into an ordered map
///
/// Keys are uppercase alphanumerics and hyphens; values are either
/// quoted (commas allowed inside) or run to the next comma. Fragments
/// that do not form a KEY=value pair are skipped. Duplicate keys keep
/// the first position and the last value.
pub(crate) fn parse_attribute_list(value: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();
    let bytes = value.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let key_start = pos;
        while pos < bytes.len() && is_attribute_key_byte(bytes[pos]) {
            pos += 1;
        }
        let valid_key = pos > key_start && pos < bytes.len() && bytes[pos] == b'=';
        if !valid_key {
            // Skip past the next comma and retry
            while pos < bytes.len() && bytes[pos] != b',' {
                pos += 1;
            }
            pos += 1;
            continue;
        }
        let key = &value[key_start..pos];
        pos += 1;

        let attr_value = if pos < bytes.len() && bytes[pos] == b'"' {
            pos += 1;
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != b'"' {
                pos += 1;
            }
            let quoted = &value[value_start..pos];
            if pos < bytes.len() {
                pos += 1;
            }
            quoted
        } else {
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != b',' {
                pos += 1;
            }
            &value[value_start..pos]
        };
        attributes.insert(key.to_string(), attr_value.to_string());

        while pos < bytes.len() && bytes[pos] != b',' {
            pos += 1;
        }
        pos += 1;
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute_list_typical() {
        let attrs = parse_attribute_list("BANDWIDTH=1280000,RESOLUTION=720x480,CODECS=\"mp4a\"");
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs["BANDWIDTH"], "1280000");
        assert_eq!(attrs["RESOLUTION"], "720x480");
        assert_eq!(attrs["CODECS"], "mp4a");
    }

    #[test]
    fn test_parse_attribute_list_quoted_value_keeps_commas() {
        let attrs = parse_attribute_list("CODECS=\"avc1.66.30,mp4a.40.2\",BANDWIDTH=900000");
        assert_eq!(attrs["CODECS"], "avc1.66.30,mp4a.40.2");
        assert_eq!(attrs["BANDWIDTH"], "900000");
    }

    #[test]
    fn test_parse_attribute_list_preserves_source_order() {
        let attrs = parse_attribute_list("B=2,A=1,C=3");
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["B", "A", "C"]);
    }

    #[test]
    fn test_parse_attribute_list_skips_lowercase_keys() {
        let attrs = parse_attribute_list("bandwidth=1,BANDWIDTH=2");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["BANDWIDTH"], "2");
    }

    #[test]
    fn test_parse_attribute_list_duplicate_key_last_value_wins() {
        let attrs = parse_attribute_list("A=1,B=2,A=3");
        assert_eq!(attrs["A"], "3");
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["A", "B"]);
    }

    #[test]
    fn test_parse_attribute_list_unterminated_quote_runs_to_end() {
        let attrs = parse_attribute_list("URI=\"seg.ts,BANDWIDTH=1");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["URI"], "seg.ts,BANDWIDTH=1");
    }

    #[test]
    fn test_parse_attribute_list_empty_unquoted_value() {
        let attrs = parse_attribute_list("NAME=,BANDWIDTH=1");
        assert_eq!(attrs["NAME"], "");
        assert_eq!(attrs["BANDWIDTH"], "1");
    }

    #[test]
    fn test_parse_attribute_list_garbage_fragments_skipped() {
        let attrs = parse_attribute_list("garbage,=5,KEY=ok,trailing");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["KEY"], "ok");
    }

    #[test]
    fn test_parse_tag_line_stream_inf() {
        let tag = parse_tag_line("#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=720x480")
            .unwrap();
        assert_eq!(tag.name, "EXT-X-STREAM-INF");
        assert_eq!(tag.attribute("BANDWIDTH"), Some("1280000"));
        assert_eq!(tag.attribute("RESOLUTION"), Some("720x480"));
    }

    #[test]
    fn test_parse_tag_line_without_value() {
        let tag = parse_tag_line("#EXT-X-ENDLIST").unwrap();
        assert_eq!(tag.name, "EXT-X-ENDLIST");
        assert_eq!(tag.raw_value, None);
        assert!(tag.attributes.is_empty());
    }

    #[test]
    fn test_parse_tag_line_version_kept_verbatim() {
        let tag = parse_tag_line("#EXT-X-VERSION:4").unwrap();
        assert_eq!(tag.raw_value.as_deref(), Some("4"));
        assert!(tag.attributes.is_empty());
    }

    #[test]
    fn test_parse_tag_line_empty_name_rejected() {
        assert!(parse_tag_line("#").is_none());
        assert!(parse_tag_line("#:value").is_none());
    }

    #[test]
    fn test_parse_tag_line_key_attributes() {
        let tag =
            parse_tag_line("#EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\",IV=0x1234").unwrap();
        assert_eq!(tag.attribute("METHOD"), Some("AES-128"));
        assert_eq!(tag.attribute("URI"), Some("key.bin"));
        assert_eq!(tag.attribute("IV"), Some("0x1234"));
    }

    #[test]
    fn test_parse_tag_line_unknown_tag_value_not_tokenized() {
        let tag = parse_tag_line("#EXT-X-START:TIME-OFFSET=25").unwrap();
        assert_eq!(tag.raw_value.as_deref(), Some("TIME-OFFSET=25"));
        assert!(tag.attributes.is_empty());
    }

    #[test]
    fn test_extinf_duration_and_title() {
        let tag = parse_tag_line("#EXTINF:7.975,Segment One").unwrap();
        assert_eq!(tag.attribute("DURATION"), Some("7.975"));
        assert_eq!(tag.attribute("TITLE"), Some("Segment One"));
    }

    #[test]
    fn test_extinf_trailing_comma_without_title() {
        let tag = parse_tag_line("#EXTINF:7.975,").unwrap();
        assert_eq!(tag.attribute("DURATION"), Some("7.975"));
        assert_eq!(tag.attribute("TITLE"), None);
    }

    #[test]
    fn test_extinf_title_keeps_embedded_commas() {
        let tag = parse_tag_line("#EXTINF:7.975,Title,More").unwrap();
        assert_eq!(tag.attribute("DURATION"), Some("7.975"));
        assert_eq!(tag.attribute("TITLE"), Some("Title,More"));
    }

    #[test]
    fn test_extinf_unparsable_duration_keeps_title() {
        let tag = parse_tag_line("#EXTINF:7.9.5,T").unwrap();
        assert_eq!(tag.attribute("DURATION"), None);
        assert_eq!(tag.attribute("TITLE"), Some("T"));
    }

    #[test]
    fn test_extinf_non_numeric_duration_suppresses_both() {
        let tag = parse_tag_line("#EXTINF:bad,T").unwrap();
        assert_eq!(tag.attribute("DURATION"), None);
        assert_eq!(tag.attribute("TITLE"), None);
    }

    #[test]
    fn test_extinf_without_value() {
        let tag = parse_tag_line("#EXTINF").unwrap();
        assert_eq!(tag.raw_value, None);
        assert!(tag.attributes.is_empty());
    }
}
