use crate::hls::PlaylistError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Everything that can fail while proxying one request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("URL parameter is required")]
    MissingParameter,

    #[error("invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("origin unreachable: {0}")]
    OriginUnreachable(#[source] reqwest::Error),

    #[error("origin sent no response within {after:?}")]
    OriginTimeout { after: Duration },

    #[error("origin rejected the request with {status} for every identity profile")]
    OriginRejected { status: StatusCode },

    #[error("origin responded with {status}")]
    OriginStatus { status: StatusCode },

    #[error("malformed playlist: {0}")]
    MalformedPlaylist(String),

    #[error("internal serialization fault: {0}")]
    InternalSerializationFault(#[from] PlaylistError),
}

impl ProxyError {
    /// Stable machine-readable name used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter => "missing_parameter",
            Self::InvalidTarget(_) => "invalid_target",
            Self::OriginUnreachable(_) | Self::OriginTimeout { .. } => "origin_unreachable",
            Self::OriginRejected { .. } => "origin_rejected",
            Self::OriginStatus { .. } => "origin_status",
            Self::MalformedPlaylist(_) => "malformed_playlist",
            Self::InternalSerializationFault(_) => "internal_serialization_fault",
        }
    }

    /// Status the origin answered with, when one was received.
    pub fn origin_status(&self) -> Option<StatusCode> {
        match self {
            Self::OriginRejected { status } | Self::OriginStatus { status } => Some(*status),
            Self::OriginUnreachable(e) => e.status(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            Self::InternalSerializationFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OriginUnreachable(_)
            | Self::OriginTimeout { .. }
            | Self::OriginRejected { .. }
            | Self::OriginStatus { .. }
            | Self::MalformedPlaylist(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Self::MissingParameter => "URL parameter is required",
            Self::InvalidTarget(_) => "Invalid target URL",
            Self::OriginUnreachable(_) | Self::OriginTimeout { .. } => "Origin unreachable",
            Self::OriginRejected { .. } => "Origin rejected the request",
            Self::OriginStatus { .. } => "Origin returned an error status",
            Self::MalformedPlaylist(_) => "Malformed playlist",
            Self::InternalSerializationFault(_) => "Internal serialization fault",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && !matches!(self, Self::InternalSerializationFault(_)) {
            warn!("Proxy request failed: {}", self);
        } else if status.is_server_error() {
            error!("Proxy request failed: {:?}", self);
        }

        let origin_status = self
            .origin_status()
            .map(|s| Value::from(s.as_u16()))
            .unwrap_or_else(|| Value::from("unknown"));

        let body = json!({
            "error": self.summary(),
            "kind": self.kind(),
            "details": self.to_string(),
            "status": origin_status,
        });

        (status, Json(body)).into_response()
    }
}
