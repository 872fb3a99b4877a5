use super::playlist::{
    AttributeList, PlaylistDocument, PlaylistKind, Rendition, Segment, Variant,
};
use tracing::{debug, warn};

/// Record opened by a tag line and waiting for its URI line.
enum Open {
    Nothing,
    Variant(Variant),
    Segment(Segment),
}

/// Parse HLS playlist text into a [`PlaylistDocument`].
///
/// Tolerant: unknown tags, comments and unparseable scalar values are
/// skipped instead of failing the whole playlist.
pub fn parse(content: &str) -> PlaylistDocument {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if !content.trim_start().starts_with("#EXTM3U") {
        warn!("Playlist does not start with #EXTM3U, parsing anyway");
    }

    let mut doc = PlaylistDocument::default();
    let mut open = Open::Nothing;
    // Segment-level tags seen before the segment's #EXTINF or URI.
    let mut pending = Segment::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !line.starts_with('#') {
            match std::mem::replace(&mut open, Open::Nothing) {
                Open::Variant(mut variant) => {
                    variant.uri = line.to_string();
                    doc.variants.push(variant);
                }
                Open::Segment(mut segment) => {
                    segment.uri = Some(line.to_string());
                    doc.segments.push(segment);
                }
                Open::Nothing => {
                    let mut segment = std::mem::take(&mut pending);
                    segment.uri = Some(line.to_string());
                    doc.segments.push(segment);
                }
            }
            continue;
        }

        let (tag, value) = line.split_once(':').unwrap_or((line, ""));

        match tag {
            "#EXTM3U" => {}
            "#EXT-X-VERSION" => doc.version = parse_scalar(tag, value),
            "#EXT-X-INDEPENDENT-SEGMENTS" => doc.independent_segments = true,
            "#EXT-X-MEDIA-SEQUENCE" => doc.media_sequence = parse_scalar(tag, value),
            "#EXT-X-DISCONTINUITY-SEQUENCE" => {
                doc.discontinuity_sequence = parse_scalar(tag, value)
            }
            "#EXT-X-TARGETDURATION" => {
                doc.target_duration = parse_scalar(tag, value).filter(is_duration)
            }
            "#EXT-X-PLAYLIST-TYPE" => {
                let value = value.trim();
                if !value.is_empty() {
                    doc.playlist_type = Some(value.to_string());
                }
            }
            "#EXT-X-ENDLIST" => doc.end_list = true,
            "#EXT-X-MEDIA" => doc.renditions.push(Rendition {
                attributes: AttributeList::parse(value),
            }),
            "#EXT-X-I-FRAME-STREAM-INF" => {
                doc.i_frame_variants.push(AttributeList::parse(value))
            }
            "#EXT-X-SESSION-KEY" => doc.session_keys.push(AttributeList::parse(value)),
            "#EXT-X-STREAM-INF" => {
                close(&mut doc, &mut open);
                open = Open::Variant(Variant {
                    uri: String::new(),
                    attributes: AttributeList::parse(value),
                });
            }
            "#EXTINF" => {
                close(&mut doc, &mut open);
                let (duration, title) = value.split_once(',').unwrap_or((value, ""));
                let mut segment = std::mem::take(&mut pending);
                segment.duration = parse_scalar(tag, duration).filter(is_duration);
                let title = title.trim();
                if !title.is_empty() {
                    segment.title = Some(title.to_string());
                }
                open = Open::Segment(segment);
            }
            "#EXT-X-BYTERANGE" => {
                let value = value.trim().to_string();
                match &mut open {
                    Open::Segment(segment) => segment.byte_range = Some(value),
                    _ => pending.byte_range = Some(value),
                }
            }
            "#EXT-X-DISCONTINUITY" => pending.discontinuity = true,
            "#EXT-X-PROGRAM-DATE-TIME" => pending.program_date_time = Some(value.trim().to_string()),
            "#EXT-X-KEY" => pending.key = Some(AttributeList::parse(value)),
            "#EXT-X-MAP" => pending.map = Some(AttributeList::parse(value)),
            _ => debug!("Skipping unrecognized playlist line: {}", line),
        }
    }

    close(&mut doc, &mut open);
    if pending != Segment::default() {
        debug!("Dropping segment tags with no segment after them");
    }

    doc.kind = if doc.has_master_records() {
        PlaylistKind::Master
    } else {
        PlaylistKind::Media
    };

    if doc.is_master() && !doc.segments.is_empty() {
        warn!(
            "Playlist mixes {} variant(s) with {} segment(s); dropping segments",
            doc.variants.len(),
            doc.segments.len()
        );
        doc.segments.clear();
    }

    debug!(
        "Parsed {:?} playlist: {} variant(s), {} segment(s)",
        doc.kind,
        doc.variants.len(),
        doc.segments.len()
    );

    doc
}

/// Keep a record whose URI line never arrived.
fn close(doc: &mut PlaylistDocument, open: &mut Open) {
    match std::mem::replace(open, Open::Nothing) {
        Open::Variant(variant) => doc.variants.push(variant),
        Open::Segment(segment) => doc.segments.push(segment),
        Open::Nothing => {}
    }
}

/// Finite and non-negative; `inf`, `NaN` and negatives are dropped.
fn is_duration(seconds: &f64) -> bool {
    seconds.is_finite() && *seconds >= 0.0
}

fn parse_scalar<T: std::str::FromStr>(tag: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        debug!("Ignoring {} with unparseable value {:?}", tag, value);
    }
    parsed
}
