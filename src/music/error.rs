//! Error types raised while talking to the music streaming service.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`MusicError`] failures.
pub type MusicResult<T> = Result<T, MusicError>;

/// Failures of the external music service. Every variant is retryable by the caller.
#[derive(Debug, Error)]
pub enum MusicError {
    /// The request could not be sent (network, TLS, timeout).
    #[error("failed to send music service request to `{path}`")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with an unexpected status code.
    #[error("unexpected music service response status {status} for `{path}`")]
    Status { path: String, status: StatusCode },
    /// The response payload did not match the expected shape.
    #[error("failed to decode music service response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Credentials are missing or were rejected.
    #[error("music service credentials unavailable: {0}")]
    Credentials(String),
}
