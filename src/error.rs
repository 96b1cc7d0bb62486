//! Error types for the analysis engine.

use thiserror::Error;

use crate::category::AnalysisCategory;

/// Failure to turn a response body into one of the tolerated shapes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A flexible integer was neither a JSON integer nor an integer string.
    #[error("type mismatch for `{field}`: expected an integer or integer string, found {found}")]
    TypeMismatch { field: String, found: String },

    /// A required field was absent.
    #[error("missing required field `{0}`")]
    MissingField(String),

    /// The body was not JSON at all.
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),

    /// Every candidate envelope shape was tried and none matched.
    #[error("response matched none of the tolerated shapes ({tried}): {last}")]
    NoMatchingShape { tried: String, last: Box<DecodeError> },

    /// A typed shape failed to deserialize.
    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Failure of a single analysis fetch. All variants are retryable from the
/// caller's side.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response was received.
    #[error("could not reach the analysis service: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("analysis service returned HTTP {0}")]
    HttpStatus(u16),

    /// The service answered 2xx with an empty body.
    #[error("analysis service returned no data")]
    NoData,

    #[error("failed to decode analysis response: {0}")]
    Decode(#[from] DecodeError),

    /// The category has no endpoint and was refused before any request.
    #[error("category `{0}` cannot be fetched")]
    UnsupportedCategory(AnalysisCategory),
}

/// Failure of the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot could not be encoded or decoded: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("database pool error: {0}")]
    Pool(String),

    #[error("no saved analysis for topic `{0}`")]
    NotFound(String),
}

impl From<bb8::RunError<tokio_postgres::Error>> for StoreError {
    fn from(e: bb8::RunError<tokio_postgres::Error>) -> Self {
        match e {
            bb8::RunError::User(inner) => StoreError::Database(inner),
            bb8::RunError::TimedOut => StoreError::Pool("timed out waiting for a connection".to_string()),
        }
    }
}
