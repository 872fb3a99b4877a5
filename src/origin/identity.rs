//! Client identities presented to origin servers.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, ORIGIN, PRAGMA,
    REFERER, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MEDIA_PLAYER_USER_AGENT: &str = "VLC/3.0.16 LibVLC/3.0.16";

const PLAYLIST_ACCEPT: &str = "application/vnd.apple.mpegurl, application/x-mpegURL, application/octet-stream, */*";
const PLAYER_PLAYLIST_ACCEPT: &str = "application/vnd.apple.mpegurl, application/x-mpegURL, */*";

/// What kind of resource is being fetched; decides the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Playlist,
    Segment,
}

/// A named set of request headers.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub name: &'static str,
    headers: Vec<(HeaderName, &'static str)>,
    /// Send `Referer`/`Origin` pointing at the target's own origin.
    same_origin_referer: bool,
}

impl IdentityProfile {
    /// Desktop Chrome making a cross-site fetch.
    pub fn browser(resource: Resource) -> Self {
        let accept = match resource {
            Resource::Playlist => PLAYLIST_ACCEPT,
            Resource::Segment => "*/*",
        };
        Self {
            name: "browser",
            headers: vec![
                (USER_AGENT, BROWSER_USER_AGENT),
                (ACCEPT, accept),
                (ACCEPT_LANGUAGE, "en-US,en;q=0.9"),
                (CACHE_CONTROL, "no-cache"),
                (PRAGMA, "no-cache"),
                (HeaderName::from_static("sec-fetch-dest"), "empty"),
                (HeaderName::from_static("sec-fetch-mode"), "cors"),
                (HeaderName::from_static("sec-fetch-site"), "cross-site"),
            ],
            same_origin_referer: true,
        }
    }

    /// Desktop media player, used when the browser identity is refused.
    pub fn media_player(resource: Resource) -> Self {
        let accept = match resource {
            Resource::Playlist => PLAYER_PLAYLIST_ACCEPT,
            Resource::Segment => "*/*",
        };
        Self {
            name: "media-player",
            headers: vec![
                (USER_AGENT, MEDIA_PLAYER_USER_AGENT),
                (ACCEPT, accept),
                (ACCEPT_LANGUAGE, "en-US,en;q=0.5"),
                (UPGRADE_INSECURE_REQUESTS, "1"),
            ],
            same_origin_referer: false,
        }
    }

    /// Headers for a request to `target`.
    pub fn headers_for(&self, target: &Url) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.headers.len() + 2);
        for (name, value) in &self.headers {
            headers.insert(name.clone(), HeaderValue::from_static(*value));
        }

        if self.same_origin_referer {
            let origin = target.origin().ascii_serialization();
            if let Ok(value) = HeaderValue::from_str(&format!("{origin}/")) {
                headers.insert(REFERER, value);
            }
            if let Ok(value) = HeaderValue::from_str(&origin) {
                headers.insert(ORIGIN, value);
            }
        }

        headers
    }
}
