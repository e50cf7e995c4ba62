//! Error types for catalogue API access.
//!
//! None of these are fatal. Callers surface them as a failed search or fetch
//! and keep the triggering query so the action can be retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Token rejected or could not be obtained. Not retried here.
    #[error("not authenticated with the catalogue API")]
    Unauthorized,

    /// No client id/secret configured
    #[error("missing API credentials: set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET")]
    MissingCredentials,

    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status other than 401
    #[error("catalogue API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Feature lookup returned a different number of records than ids sent
    #[error("feature batch returned {got} records for {expected} ids")]
    BatchMismatch { expected: usize, got: usize },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
