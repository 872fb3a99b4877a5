//! Playlist proxy pipeline: fetch, decode, parse, rewrite, serialize.
//!
//! Both the HTTP handler and any alternate mount point call
//! [`proxy_playlist`]; the pure half is [`rewrite_playlist`].

use crate::{
    error::{ProxyError, Result},
    hls::{self, ProxyEndpoints, resolve::directory_of},
    origin::{FetchPolicy, fetch_with_fallback},
};
use reqwest::Client;
use tracing::{debug, error, info};
use url::Url;

/// Fetch the playlist at `source` and return it with every URI proxied.
///
/// # Errors
/// Origin failures from [`fetch_with_fallback`], [`ProxyError::OriginUnreachable`]
/// when the body cannot be read, [`ProxyError::MalformedPlaylist`] when it is
/// not UTF-8, and whatever [`rewrite_playlist`] reports.
pub async fn proxy_playlist(
    client: &Client,
    policy: &FetchPolicy,
    endpoints: &ProxyEndpoints,
    source: &Url,
) -> Result<String> {
    let response = fetch_with_fallback(client, source, policy, None).await?;
    let body = response
        .bytes()
        .await
        .map_err(ProxyError::OriginUnreachable)?;

    let text = decode_playlist(&body)?;
    debug!("Fetched playlist {} ({} bytes)", source, body.len());

    rewrite_playlist(text, source, endpoints)
}

/// Rewrite playlist `text` that was served from `source`.
///
/// Relative URIs resolve against the directory of `source`.
pub fn rewrite_playlist(text: &str, source: &Url, endpoints: &ProxyEndpoints) -> Result<String> {
    let base = directory_of(source)
        .map_err(|e| ProxyError::InvalidTarget(format!("{source} cannot be a base URL: {e}")))?;

    let mut doc = hls::parse(text);
    hls::rewrite(&mut doc, &base, endpoints);

    let output = hls::write(&doc).map_err(|e| {
        error!("Serializer refused rewritten playlist from {}: {:?}", source, e);
        ProxyError::from(e)
    })?;

    info!(
        "Rewrote {} playlist from {}: {} variants, {} renditions, {} segments",
        if doc.is_master() { "master" } else { "media" },
        source,
        doc.variants.len(),
        doc.renditions.len(),
        doc.segments.len()
    );

    Ok(output)
}

/// UTF-8 body with any byte-order mark removed.
fn decode_playlist(body: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ProxyError::MalformedPlaylist(format!("body is not UTF-8: {e}")))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:9.0,
seg001.ts
#EXTINF:9.5,
/abs/seg002.ts
#EXTINF:8.0,
https://other.example.com/seg003.ts
#EXT-X-ENDLIST
";

    fn source() -> Url {
        Url::parse("https://cdn.example.com/streams/live/index.m3u8?token=1").unwrap()
    }

    #[test]
    fn media_playlist_is_rewritten() {
        let out = rewrite_playlist(MEDIA, &source(), &ProxyEndpoints::default()).unwrap();
        let uris: Vec<&str> = out.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            uris,
            vec![
                "/proxy/segment?url=https%3A%2F%2Fcdn.example.com%2Fstreams%2Flive%2Fseg001.ts",
                "/proxy/segment?url=https%3A%2F%2Fcdn.example.com%2Fabs%2Fseg002.ts",
                "/proxy/segment?url=https%3A%2F%2Fother.example.com%2Fseg003.ts",
            ]
        );
        assert!(out.contains("#EXTINF:9.5,"));
        assert!(out.contains("#EXT-X-ENDLIST"));
    }

    #[test]
    fn master_playlist_points_at_playlist_endpoint() {
        let master = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=128000,CODECS=\"avc1.4d001e,mp4a.40.2\"
low.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=512000
high.m3u8
";
        let source = Url::parse("https://o.example.com/hls/master.m3u8").unwrap();
        let out = rewrite_playlist(master, &source, &ProxyEndpoints::default()).unwrap();
        assert!(out.contains("/proxy/m3u8?url=https%3A%2F%2Fo.example.com%2Fhls%2Flow.m3u8"));
        assert!(out.contains("/proxy/m3u8?url=https%3A%2F%2Fo.example.com%2Fhls%2Fhigh.m3u8"));
        assert!(out.contains("CODECS=\"avc1.4d001e,mp4a.40.2\""));
    }

    #[test]
    fn bom_and_invalid_utf8() {
        assert_eq!(decode_playlist(b"\xef\xbb\xbf#EXTM3U\n").unwrap(), "#EXTM3U\n");
        let err = decode_playlist(b"#EXTM3U\n\xff\xfe").unwrap_err();
        assert!(matches!(err, ProxyError::MalformedPlaylist(_)));
    }

    #[tokio::test]
    async fn fetches_and_rewrites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/index.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MEDIA))
            .expect(1)
            .mount(&server)
            .await;

        let source = Url::parse(&format!("{}/live/index.m3u8", server.uri())).unwrap();
        let out = proxy_playlist(
            &Client::new(),
            &FetchPolicy::playlist(Duration::from_secs(5)),
            &ProxyEndpoints::under("/api/proxy"),
            &source,
        )
        .await
        .unwrap();

        let expected = format!(
            "/api/proxy/segment?url={}",
            urlencoding::encode(&format!("{}/live/seg001.ts", server.uri()))
        );
        assert!(out.contains(&expected), "missing {expected} in:\n{out}");
    }

    #[tokio::test]
    async fn origin_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = Url::parse(&format!("{}/gone.m3u8", server.uri())).unwrap();
        let err = proxy_playlist(
            &Client::new(),
            &FetchPolicy::playlist(Duration::from_secs(5)),
            &ProxyEndpoints::default(),
            &source,
        )
        .await
        .unwrap_err();
        assert_eq!(err.origin_status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn binary_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0x00]))
            .mount(&server)
            .await;

        let source = Url::parse(&format!("{}/bad.m3u8", server.uri())).unwrap();
        let err = proxy_playlist(
            &Client::new(),
            &FetchPolicy::playlist(Duration::from_secs(5)),
            &ProxyEndpoints::default(),
            &source,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "malformed_playlist");
    }
}
