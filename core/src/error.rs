//! Error types for the table API client.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because callers
//! branch on them. Every other unexpected status lands in `HttpError` with
//! the raw status code and body. `MissingConfig` is raised lazily, the first
//! time a request is built against an unconfigured client.

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 404, or a filtered read/update that matched no row.
    #[error("resource not found")]
    NotFound,

    /// 401/403: the anon key was missing or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The named configuration value was empty when the client was used.
    #[error("missing configuration value {0}")]
    MissingConfig(&'static str),
}
