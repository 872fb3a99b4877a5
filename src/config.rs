use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Value of `CORS_ORIGIN`: `*` or a comma-separated list of origins
    pub cors_origin: String,
    /// Path prefix of the proxy endpoints, e.g. `/proxy` (no trailing slash)
    pub route_prefix: String,
    /// Per-attempt timeout for playlist fetches
    pub playlist_timeout: Duration,
    /// Wait for segment response headers, and longest idle gap in a body
    pub segment_timeout: Duration,
    /// `max-age` advertised on relayed segments
    pub segment_max_age_secs: u64,
    /// Allow targets on loopback/private IP literals (off in production)
    pub allow_private_origins: bool,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env_flag("DEV_MODE");

        // Port: required in prod, defaults to 3000 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());

        let route_prefix =
            normalize_prefix(&env::var("ROUTE_PREFIX").unwrap_or_else(|_| "/proxy".to_string()));

        let playlist_timeout = Duration::from_secs(env_number("PLAYLIST_TIMEOUT_SECS", 15));
        let segment_timeout = Duration::from_secs(env_number("SEGMENT_TIMEOUT_SECS", 30));
        let segment_max_age_secs = env_number("SEGMENT_MAX_AGE_SECS", 3600);

        let allow_private_origins = env_flag("ALLOW_PRIVATE_ORIGINS");

        Ok(Config {
            port,
            is_dev,
            cors_origin,
            route_prefix,
            playlist_timeout,
            segment_timeout,
            segment_max_age_secs,
            allow_private_origins,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            is_dev: true,
            cors_origin: "*".to_string(),
            route_prefix: "/proxy".to_string(),
            playlist_timeout: Duration::from_secs(15),
            segment_timeout: Duration::from_secs(30),
            segment_max_age_secs: 3600,
            allow_private_origins: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .unwrap_or_else(|_| "false".to_string())
        .parse()
        .unwrap_or(false)
}

fn env_number(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Leading `/`, no trailing `/`; `/` alone becomes the empty prefix.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
