//! HTTP fetch with identity fallback.
//!
//! [`fetch_with_fallback`] is the one place where the "try as a browser, on
//! 403 try once more as a media player" policy lives; both proxy endpoints
//! go through it.

use super::identity::{IdentityProfile, Resource};
use crate::{error::ProxyError, metrics};
use reqwest::{
    Client, Response, StatusCode,
    header::{HeaderValue, RANGE},
};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default per-attempt timeout for playlist fetches.
pub const DEFAULT_PLAYLIST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default per-attempt timeout for segment fetches.
pub const DEFAULT_SEGMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Origin answer that moves on to the next identity profile.
pub fn is_rejection(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN
}

/// What the per-attempt timeout bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Headers and the complete body; for bodies that are buffered.
    WholeExchange,
    /// Response headers only; the body may then stream for as long as it flows.
    ResponseHeaders,
}

/// How to fetch one kind of resource from an origin.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Profiles tried in order; only a rejection advances to the next one.
    /// Never empty.
    profiles: Vec<IdentityProfile>,
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    pub deadline: Deadline,
    /// Statuses that count as a rejection of the current identity.
    pub rejects: fn(StatusCode) -> bool,
}

impl FetchPolicy {
    /// Browser identity first, media player identity as the single fallback.
    ///
    /// Playlists are buffered, so their deadline covers the whole exchange;
    /// segments are streamed and only wait on headers.
    pub fn for_resource(resource: Resource, timeout: Duration) -> Self {
        let deadline = match resource {
            Resource::Playlist => Deadline::WholeExchange,
            Resource::Segment => Deadline::ResponseHeaders,
        };
        Self {
            profiles: vec![
                IdentityProfile::browser(resource),
                IdentityProfile::media_player(resource),
            ],
            timeout,
            deadline,
            rejects: is_rejection,
        }
    }

    /// Replace the identity profiles; `first` is always tried.
    pub fn with_profiles(mut self, first: IdentityProfile, rest: Vec<IdentityProfile>) -> Self {
        self.profiles = std::iter::once(first).chain(rest).collect();
        self
    }

    pub fn profiles(&self) -> &[IdentityProfile] {
        &self.profiles
    }

    pub fn playlist(timeout: Duration) -> Self {
        Self::for_resource(Resource::Playlist, timeout)
    }

    pub fn segment(timeout: Duration) -> Self {
        Self::for_resource(Resource::Segment, timeout)
    }
}

/// Fetch `url` via HTTP GET, falling back to the next identity on rejection.
///
/// Success is any 2xx or 3xx status (redirects are followed by the client).
/// `range` is forwarded verbatim on every attempt.
///
/// # Errors
///
/// - [`ProxyError::OriginUnreachable`] on a transport failure or a timeout
///   inside the exchange, and [`ProxyError::OriginTimeout`] when the
///   headers do not arrive in time; neither tries further profiles.
/// - [`ProxyError::OriginRejected`] when the last profile is rejected too.
/// - [`ProxyError::OriginStatus`] for any other failing status, without
///   trying further profiles.
pub async fn fetch_with_fallback(
    client: &Client,
    url: &Url,
    policy: &FetchPolicy,
    range: Option<&HeaderValue>,
) -> Result<Response, ProxyError> {
    let attempts = policy.profiles.len();
    let mut attempt = 0;

    loop {
        let profile = &policy.profiles[attempt];
        attempt += 1;

        let mut request = client.get(url.clone()).headers(profile.headers_for(url));
        if let Some(range) = range {
            request = request.header(RANGE, range.clone());
        }

        let sent = match policy.deadline {
            Deadline::WholeExchange => request.timeout(policy.timeout).send().await,
            Deadline::ResponseHeaders => {
                match tokio::time::timeout(policy.timeout, request.send()).await {
                    Ok(sent) => sent,
                    Err(_) => {
                        warn!(
                            "No response from {} as {} within {:?} (attempt {}/{})",
                            url, profile.name, policy.timeout, attempt, attempts
                        );
                        metrics::record_origin_error();
                        return Err(ProxyError::OriginTimeout {
                            after: policy.timeout,
                        });
                    }
                }
            }
        };

        let response = sent.map_err(|e| {
            warn!(
                "Origin fetch failed for {} as {} (attempt {}/{}): {}",
                url, profile.name, attempt, attempts, e
            );
            metrics::record_origin_error();
            ProxyError::OriginUnreachable(e)
        })?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            debug!("Origin returned {} for {} as {}", status, url, profile.name);
            return Ok(response);
        }

        metrics::record_origin_error();

        if !(policy.rejects)(status) {
            warn!(
                "Origin returned {} for {} as {}, not retrying",
                status, url, profile.name
            );
            return Err(ProxyError::OriginStatus { status });
        }

        if attempt == attempts {
            warn!(
                "Origin rejected {} with {} as {} (attempt {}/{}), giving up",
                url, status, profile.name, attempt, attempts
            );
            return Err(ProxyError::OriginRejected { status });
        }

        warn!(
            "Origin rejected {} with {} as {}, retrying with a different identity",
            url, status, profile.name
        );
        metrics::record_identity_fallback();
    }
}
