use std::fmt;

use thiserror::Error;

/// How a request failed before an HTTP response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Timeout => "timeout",
            TransportKind::Connect => "connection failure",
            TransportKind::Other => "transport failure",
        })
    }
}

/// Failure of a Trafikinfo API call.
///
/// Cloneable so the same failure can be returned to the caller and
/// broadcast to passive `api_error` subscribers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("{kind} while querying {object_type}: {message}")]
    Transport {
        kind: TransportKind,
        object_type: String,
        message: String,
    },

    #[error("{object_type} query failed with HTTP status {status}: {body}")]
    Api {
        object_type: String,
        status: u16,
        body: String,
    },

    #[error("{object_type} query returned a body that is not JSON (HTTP status {status}): {body}")]
    MalformedResponse {
        object_type: String,
        status: u16,
        body: String,
    },

    #[error("weather station '{station_id}' was not found in the response")]
    StationNotFound { station_id: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ApiError::Transport {
                kind: TransportKind::Timeout,
                ..
            }
        )
    }
}

/// Failure reported by a host collaborator (settings, capabilities, images, triggers).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("host call failed: {0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
