use crate::{
    error::Result,
    metrics,
    origin::fetch_with_fallback,
    server::{handlers::playlist::TargetQuery, state::AppState, url_validation::parse_target},
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use std::time::Instant;
use tracing::info;

const DEFAULT_SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

/// Relay a segment (or key, or init section) from origin to player
///
/// The incoming `Range` header is forwarded and the body is streamed through
/// without buffering.
pub async fn serve_segment(
    Query(query): Query<TargetQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let start = Instant::now();

    let result = relay(query, &state, headers.get(header::RANGE)).await;

    let status = match &result {
        Ok(response) => response.status(),
        Err(e) => e.status_code(),
    };
    metrics::record_request("segment", status.as_u16());
    metrics::record_duration("segment", start);

    result
}

async fn relay(
    query: TargetQuery,
    state: &AppState,
    range: Option<&HeaderValue>,
) -> Result<Response> {
    let source = parse_target(query.url.as_deref(), state.config.allow_private_origins)?;
    info!(
        "Serving segment: {}{}",
        source,
        range
            .and_then(|r| r.to_str().ok())
            .map(|r| format!(" ({r})"))
            .unwrap_or_default()
    );

    let upstream =
        fetch_with_fallback(&state.http_client, &source, &state.segment_policy, range).await?;

    let status = if upstream.status() == StatusCode::PARTIAL_CONTENT {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut headers = HeaderMap::new();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_SEGMENT_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    // Relayed unchanged
    for name in [
        header::CONTENT_LENGTH,
        header::CONTENT_RANGE,
        header::ACCEPT_RANGES,
    ] {
        if let Some(value) = upstream.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }

    let cache_control = format!("public, max-age={}", state.config.segment_max_age_secs);
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    let stream = upstream
        .bytes_stream()
        .inspect_ok(|chunk| metrics::record_segment_bytes(chunk.len()));

    Ok((status, headers, Body::from_stream(stream)).into_response())
}
