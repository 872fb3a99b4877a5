use super::playlist::{PlaylistDocument, PlaylistKind};
use std::fmt::Write;
use thiserror::Error;

/// Invariant violations caught while serializing a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("{kind:?} playlist carries {variants} variant(s), {renditions} rendition(s) and {segments} segment(s)")]
    MixedKinds {
        kind: PlaylistKind,
        variants: usize,
        renditions: usize,
        segments: usize,
    },
}

/// Serialize a document back to playlist text.
///
/// Only fields present in the document are written, in a fixed order, so the
/// same document always produces the same bytes.
///
/// # Errors
///
/// Returns [`PlaylistError::MixedKinds`] when a master document holds segments
/// or a media document holds variants, renditions, I-frame variants or
/// session keys.
pub fn write(doc: &PlaylistDocument) -> Result<String, PlaylistError> {
    check_single_kind(doc)?;

    let mut out = String::with_capacity(64 + 96 * (doc.segments.len() + doc.variants.len()));

    let _ = writeln!(out, "#EXTM3U");
    if let Some(version) = doc.version {
        let _ = writeln!(out, "#EXT-X-VERSION:{}", version);
    }
    if doc.independent_segments {
        let _ = writeln!(out, "#EXT-X-INDEPENDENT-SEGMENTS");
    }
    if let Some(sequence) = doc.media_sequence {
        let _ = writeln!(out, "#EXT-X-MEDIA-SEQUENCE:{}", sequence);
    }
    if let Some(sequence) = doc.discontinuity_sequence {
        let _ = writeln!(out, "#EXT-X-DISCONTINUITY-SEQUENCE:{}", sequence);
    }
    if let Some(duration) = doc.target_duration {
        let _ = writeln!(out, "#EXT-X-TARGETDURATION:{}", duration);
    }
    if let Some(playlist_type) = &doc.playlist_type {
        let _ = writeln!(out, "#EXT-X-PLAYLIST-TYPE:{}", playlist_type);
    }
    if doc.end_list {
        let _ = writeln!(out, "#EXT-X-ENDLIST");
    }

    match doc.kind {
        PlaylistKind::Master => {
            for key in &doc.session_keys {
                let _ = writeln!(out, "#EXT-X-SESSION-KEY:{}", key);
            }
            for rendition in &doc.renditions {
                let _ = writeln!(out, "#EXT-X-MEDIA:{}", rendition.attributes);
            }
            for variant in &doc.variants {
                let _ = writeln!(out, "#EXT-X-STREAM-INF:{}", variant.attributes);
                let _ = writeln!(out, "{}", variant.uri);
            }
            for i_frame in &doc.i_frame_variants {
                let _ = writeln!(out, "#EXT-X-I-FRAME-STREAM-INF:{}", i_frame);
            }
        }
        PlaylistKind::Media => {
            for segment in &doc.segments {
                if segment.discontinuity {
                    let _ = writeln!(out, "#EXT-X-DISCONTINUITY");
                }
                if let Some(key) = &segment.key {
                    let _ = writeln!(out, "#EXT-X-KEY:{}", key);
                }
                if let Some(map) = &segment.map {
                    let _ = writeln!(out, "#EXT-X-MAP:{}", map);
                }
                if let Some(timestamp) = &segment.program_date_time {
                    let _ = writeln!(out, "#EXT-X-PROGRAM-DATE-TIME:{}", timestamp);
                }
                if let Some(duration) = segment.duration {
                    let _ = writeln!(
                        out,
                        "#EXTINF:{},{}",
                        duration,
                        segment.title.as_deref().unwrap_or("")
                    );
                }
                if let Some(range) = &segment.byte_range {
                    let _ = writeln!(out, "#EXT-X-BYTERANGE:{}", range);
                }
                if let Some(uri) = &segment.uri {
                    let _ = writeln!(out, "{}", uri);
                }
            }
        }
    }

    Ok(out)
}

fn check_single_kind(doc: &PlaylistDocument) -> Result<(), PlaylistError> {
    let mixed = match doc.kind {
        PlaylistKind::Master => !doc.segments.is_empty(),
        PlaylistKind::Media => doc.has_master_records(),
    };
    if mixed {
        return Err(PlaylistError::MixedKinds {
            kind: doc.kind,
            variants: doc.variants.len(),
            renditions: doc.renditions.len(),
            segments: doc.segments.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::parser::parse;
    use crate::hls::playlist::{AttributeList, Segment, Variant};

    #[test]
    fn media_round_trip_is_identity() {
        let text = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-MEDIA-SEQUENCE:7
#EXT-X-TARGETDURATION:10
#EXT-X-PLAYLIST-TYPE:EVENT
#EXTINF:9.009,
https://cdn.example.com/a.ts
#EXTINF:9.5,Chapter 2
https://cdn.example.com/b.ts
#EXT-X-DISCONTINUITY
#EXTINF:8,
https://cdn.example.com/c.ts
";
        let doc = parse(text);
        let written = write(&doc).unwrap();

        assert_eq!(written, text);
        assert_eq!(parse(&written), doc);
    }

    #[test]
    fn scalars_are_written_in_fixed_order() {
        let doc = parse(
            "#EXTM3U
#EXT-X-ENDLIST
#EXT-X-PLAYLIST-TYPE:VOD
#EXT-X-TARGETDURATION:6
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:6,
a.ts
",
        );
        assert_eq!(
            write(&doc).unwrap(),
            "#EXTM3U
#EXT-X-MEDIA-SEQUENCE:0
#EXT-X-TARGETDURATION:6
#EXT-X-PLAYLIST-TYPE:VOD
#EXT-X-ENDLIST
#EXTINF:6,
a.ts
"
        );
    }

    #[test]
    fn segment_order_is_preserved() {
        let mut doc = PlaylistDocument::default();
        for (uri, duration) in [("A", 9.0), ("B", 9.5), ("C", 8.0)] {
            doc.segments.push(Segment {
                uri: Some(uri.to_string()),
                duration: Some(duration),
                ..Default::default()
            });
        }

        assert_eq!(
            write(&doc).unwrap(),
            "#EXTM3U\n#EXTINF:9,\nA\n#EXTINF:9.5,\nB\n#EXTINF:8,\nC\n"
        );
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let mut media = PlaylistDocument::default();
        media.segments.push(Segment {
            uri: Some("no-duration.ts".to_string()),
            ..Default::default()
        });
        media.segments.push(Segment {
            duration: Some(3.0),
            ..Default::default()
        });
        assert_eq!(
            write(&media).unwrap(),
            "#EXTM3U\nno-duration.ts\n#EXTINF:3,\n"
        );

        let master = PlaylistDocument {
            kind: PlaylistKind::Master,
            variants: vec![
                Variant {
                    uri: "bare.m3u8".to_string(),
                    attributes: AttributeList::new(),
                },
                Variant::default(),
            ],
            ..Default::default()
        };
        assert_eq!(
            write(&master).unwrap(),
            "#EXTM3U\n#EXT-X-STREAM-INF:\nbare.m3u8\n#EXT-X-STREAM-INF:\n\n"
        );
    }

    #[test]
    fn quoted_attributes_survive_round_trip() {
        let text = "#EXTM3U
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"English, main\",URI=\"en.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=128000,CODECS=\"avc1.4d001e,mp4a.40.2\"
low.m3u8
";
        let doc = parse(text);
        assert_eq!(doc.variants[0].attributes.len(), 2);
        assert_eq!(doc.renditions[0].attributes.len(), 4);
        assert_eq!(write(&doc).unwrap(), text);
    }

    #[test]
    fn segment_tags_are_written_before_extinf() {
        let text = "#EXTM3U
#EXT-X-TARGETDURATION:4
#EXT-X-DISCONTINUITY
#EXT-X-KEY:METHOD=AES-128,URI=\"k.bin\"
#EXT-X-MAP:URI=\"init.mp4\"
#EXT-X-PROGRAM-DATE-TIME:2026-01-01T00:00:00.000Z
#EXTINF:4,
#EXT-X-BYTERANGE:500@0
main.mp4
";
        assert_eq!(write(&parse(text)).unwrap(), text);
    }

    #[test]
    fn mixed_documents_are_rejected() {
        let mut doc = PlaylistDocument {
            kind: PlaylistKind::Master,
            variants: vec![Variant::default()],
            ..Default::default()
        };
        doc.segments.push(Segment::default());

        assert!(matches!(
            write(&doc),
            Err(PlaylistError::MixedKinds { segments: 1, .. })
        ));

        let media_with_variants = PlaylistDocument {
            kind: PlaylistKind::Media,
            variants: vec![Variant::default()],
            ..Default::default()
        };
        assert!(write(&media_with_variants).is_err());
    }

    #[test]
    fn output_is_deterministic() {
        let doc = parse("#EXTM3U\n#EXT-X-STREAM-INF:Z=1,A=2,M=3\nv.m3u8\n");
        let first = write(&doc).unwrap();
        for _ in 0..10 {
            assert_eq!(write(&doc).unwrap(), first);
        }
        assert!(first.contains("#EXT-X-STREAM-INF:Z=1,A=2,M=3\n"));
    }

    #[test]
    fn session_keys_and_i_frame_variants_round_trip() {
        let text = "#EXTM3U
#EXT-X-SESSION-KEY:METHOD=AES-128,URI=\"k.bin\"
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"a\",NAME=\"en\",URI=\"en.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=1000,AUDIO=\"a\"
v.m3u8
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=86000,URI=\"i.m3u8\"
";
        let doc = parse(text);
        assert_eq!(write(&doc).unwrap(), text);

        let media_with_i_frames = PlaylistDocument {
            kind: PlaylistKind::Media,
            i_frame_variants: vec![AttributeList::parse("URI=\"i.m3u8\"")],
            ..Default::default()
        };
        assert!(write(&media_with_i_frames).is_err());
    }

    #[test]
    fn infinite_duration_is_never_written() {
        let written = write(&parse("#EXTM3U\n#EXTINF:inf,\na.ts\n")).unwrap();
        assert_eq!(written, "#EXTM3U\na.ts\n");
    }
}
