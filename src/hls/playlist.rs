//! In-memory form of one fetched HLS playlist.
//!
//! A [`PlaylistDocument`] is built per request by [`super::parser::parse`],
//! mutated by [`super::rewrite::rewrite`] and consumed by
//! [`super::writer::write`]. It is never shared between requests.

/// Which of the two HLS playlist kinds a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaylistKind {
    /// Lists variant streams (and alternative renditions).
    Master,
    /// Lists media segments in playback order.
    #[default]
    Media,
}

/// Ordered `KEY=VALUE` attribute list as found on a tag line.
///
/// Values are stored raw, quotes included, so `CODECS="avc1,mp4a"` is
/// written back byte-for-byte. Keys keep the case they were read with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeList {
    entries: Vec<(String, String)>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an attribute list, splitting on commas outside quoted strings.
    ///
    /// Items without an `=` are dropped.
    pub fn parse(input: &str) -> Self {
        let mut entries = Vec::new();

        for item in split_unquoted_commas(input) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            match item.split_once('=') {
                Some((key, value)) => {
                    entries.push((key.trim().to_string(), value.trim().to_string()));
                }
                None => tracing::debug!("Ignoring attribute without value: {}", item),
            }
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Raw value of the first attribute named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `key` with surrounding double quotes removed.
    pub fn get_unquoted(&self, key: &str) -> Option<&str> {
        self.get(key).map(|v| {
            v.strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(v)
        })
    }

    /// Replace the value of `key` in place, or append it if absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Like [`set`](Self::set) but wraps the value in double quotes.
    pub fn set_quoted(&mut self, key: &str, value: &str) {
        self.set(key, format!("\"{value}\""));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for AttributeList {
    /// `KEY=VALUE` pairs joined by commas, no trailing separator.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Split on `,` except inside `"..."`.
fn split_unquoted_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, ch) in input.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);

    parts
}

/// One `#EXT-X-STREAM-INF` entry of a master playlist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variant {
    /// Nested playlist reference; empty when the playlist omitted it.
    pub uri: String,
    pub attributes: AttributeList,
}

/// One `#EXT-X-MEDIA` entry of a master playlist.
///
/// The optional quoted `URI` attribute references a nested playlist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rendition {
    pub attributes: AttributeList,
}

/// One media segment of a media playlist, with the tags that precede it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    /// Absent for metadata-only records.
    pub uri: Option<String>,
    /// Seconds, from `#EXTINF`.
    pub duration: Option<f64>,
    /// Text after the `#EXTINF` comma.
    pub title: Option<String>,
    /// Raw `#EXT-X-BYTERANGE` value.
    pub byte_range: Option<String>,
    pub discontinuity: bool,
    /// Raw `#EXT-X-PROGRAM-DATE-TIME` value.
    pub program_date_time: Option<String>,
    /// Attributes of an `#EXT-X-KEY` placed before this segment.
    pub key: Option<AttributeList>,
    /// Attributes of an `#EXT-X-MAP` placed before this segment.
    pub map: Option<AttributeList>,
}

/// Parsed HLS playlist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaylistDocument {
    pub kind: PlaylistKind,
    pub version: Option<u32>,
    pub independent_segments: bool,
    pub media_sequence: Option<u64>,
    pub discontinuity_sequence: Option<u64>,
    pub target_duration: Option<f64>,
    pub playlist_type: Option<String>,
    pub end_list: bool,
    pub renditions: Vec<Rendition>,
    pub variants: Vec<Variant>,
    /// `#EXT-X-I-FRAME-STREAM-INF` attributes; `URI` names an I-frame playlist.
    pub i_frame_variants: Vec<AttributeList>,
    /// `#EXT-X-SESSION-KEY` attributes.
    pub session_keys: Vec<AttributeList>,
    pub segments: Vec<Segment>,
}

impl PlaylistDocument {
    pub fn is_master(&self) -> bool {
        self.kind == PlaylistKind::Master
    }

    /// Any record that only a master playlist may carry.
    pub fn has_master_records(&self) -> bool {
        !self.variants.is_empty()
            || !self.renditions.is_empty()
            || !self.i_frame_variants.is_empty()
            || !self.session_keys.is_empty()
    }
}
