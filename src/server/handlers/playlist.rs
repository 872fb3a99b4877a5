use crate::{
    error::Result,
    metrics, pipeline,
    server::{state::AppState, url_validation::parse_target},
};
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub url: Option<String>,
}

/// Fetch a playlist from origin and return it with every URI proxied
pub async fn serve_playlist(
    Query(query): Query<TargetQuery>,
    State(state): State<AppState>,
) -> Result<Response> {
    let start = Instant::now();

    let result = proxy(query, &state).await;

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    metrics::record_request("playlist", status.as_u16());
    metrics::record_duration("playlist", start);

    let body = result?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/vnd.apple.mpegurl"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        ],
        body,
    )
        .into_response())
}

async fn proxy(query: TargetQuery, state: &AppState) -> Result<String> {
    let source = parse_target(query.url.as_deref(), state.config.allow_private_origins)?;
    info!("Serving playlist: {}", source);

    pipeline::proxy_playlist(
        &state.http_client,
        &state.playlist_policy,
        &state.endpoints,
        &source,
    )
    .await
}
