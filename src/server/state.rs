use crate::{
    config::Config,
    hls::ProxyEndpoints,
    metrics,
    origin::FetchPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::{Client, redirect};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
    /// Where rewritten URIs point back to
    pub endpoints: Arc<ProxyEndpoints>,
    pub playlist_policy: Arc<FetchPolicy>,
    pub segment_policy: Arc<FetchPolicy>,
    /// Render handle of the Prometheus recorder, if this process owns it
    pub prometheus: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .redirect(redirect::Policy::limited(5))
            // Bounds each idle read, not the whole body
            .read_timeout(config.segment_timeout)
            .build()
            .expect("Failed to create HTTP client");

        let endpoints = ProxyEndpoints::under(&config.route_prefix);
        let playlist_policy = FetchPolicy::playlist(config.playlist_timeout);
        let segment_policy = FetchPolicy::segment(config.segment_timeout);

        Self {
            config: Arc::new(config),
            http_client,
            endpoints: Arc::new(endpoints),
            playlist_policy: Arc::new(playlist_policy),
            segment_policy: Arc::new(segment_policy),
            prometheus: metrics::init(),
            started_at: Instant::now(),
        }
    }
}
