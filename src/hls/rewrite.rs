//! Point every URI in a playlist back at the proxy.

use super::playlist::{AttributeList, PlaylistDocument};
use super::resolve::resolve;
use tracing::warn;
use url::Url;

/// Paths of the two proxy endpoints that rewritten URIs target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoints {
    /// Receives media segments, keys and init sections.
    pub segment: String,
    /// Receives nested playlists.
    pub playlist: String,
}

impl ProxyEndpoints {
    /// Endpoints mounted under `prefix`, e.g. `/proxy` → `/proxy/segment`, `/proxy/m3u8`.
    pub fn under(prefix: &str) -> Self {
        Self {
            segment: format!("{prefix}/segment"),
            playlist: format!("{prefix}/m3u8"),
        }
    }

    pub fn segment_url(&self, absolute: &str) -> String {
        proxied(&self.segment, absolute)
    }

    pub fn playlist_url(&self, absolute: &str) -> String {
        proxied(&self.playlist, absolute)
    }
}

impl Default for ProxyEndpoints {
    fn default() -> Self {
        Self::under("/proxy")
    }
}

fn proxied(endpoint: &str, absolute: &str) -> String {
    format!("{}?url={}", endpoint, urlencoding::encode(absolute))
}

/// Which endpoint a reference should be routed to.
#[derive(Clone, Copy)]
enum Target {
    Segment,
    Playlist,
}

/// Rewrite all URIs in `doc` in place.
///
/// `base` is the playlist's directory (see [`super::resolve::directory_of`]).
/// Attributes, durations and record order are left alone.
pub fn rewrite(doc: &mut PlaylistDocument, base: &Url, endpoints: &ProxyEndpoints) {
    for variant in &mut doc.variants {
        if let Some(rewritten) = rewrite_reference(&variant.uri, base, endpoints, Target::Playlist)
        {
            variant.uri = rewritten;
        }
    }

    for rendition in &mut doc.renditions {
        rewrite_uri_attribute(&mut rendition.attributes, base, endpoints, Target::Playlist);
    }

    for i_frame in &mut doc.i_frame_variants {
        rewrite_uri_attribute(i_frame, base, endpoints, Target::Playlist);
    }

    for key in &mut doc.session_keys {
        rewrite_uri_attribute(key, base, endpoints, Target::Segment);
    }

    for segment in &mut doc.segments {
        if let Some(uri) = &segment.uri
            && let Some(rewritten) = rewrite_reference(uri, base, endpoints, Target::Segment)
        {
            segment.uri = Some(rewritten);
        }
        if let Some(key) = &mut segment.key {
            rewrite_uri_attribute(key, base, endpoints, Target::Segment);
        }
        if let Some(map) = &mut segment.map {
            rewrite_uri_attribute(map, base, endpoints, Target::Segment);
        }
    }
}

fn rewrite_uri_attribute(
    attributes: &mut AttributeList,
    base: &Url,
    endpoints: &ProxyEndpoints,
    target: Target,
) {
    let Some(uri) = attributes.get_unquoted("URI") else {
        return;
    };
    if let Some(rewritten) = rewrite_reference(uri, base, endpoints, target) {
        attributes.set_quoted("URI", &rewritten);
    }
}

/// Proxy URL for `reference`, or `None` when it must stay as written.
fn rewrite_reference(
    reference: &str,
    base: &Url,
    endpoints: &ProxyEndpoints,
    target: Target,
) -> Option<String> {
    if reference.is_empty() {
        return None;
    }

    let absolute = match resolve(base, reference) {
        Ok(absolute) => absolute,
        Err(e) => {
            warn!("Leaving unresolvable reference {:?} as is: {}", reference, e);
            return None;
        }
    };

    let scheme = absolute.split_once(':').map(|(s, _)| s.to_ascii_lowercase());
    if !matches!(scheme.as_deref(), Some("http" | "https")) {
        warn!("Leaving non-HTTP reference {:?} as is", reference);
        return None;
    }

    Some(match target {
        Target::Segment => endpoints.segment_url(&absolute),
        Target::Playlist => endpoints.playlist_url(&absolute),
    })
}
