use thiserror::Error;

use crate::reply::Status;

/// Errors raised while handling a request.
#[derive(Debug, Error)]
pub enum RestError {
    /// The request body is not valid JSON.
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    /// A create request is not an object or an array of objects, or one of
    /// its items carries an unusable `id`.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// The body's `id` field disagrees with the resource address.
    #[error("Mismatch between id field `{found}` and address `{expected}`")]
    IdMismatch { found: String, expected: String },

    /// The path has no final segment to act as the resource identifier.
    #[error("Missing resource identifier in path")]
    MissingIdentifier,

    /// No document or non-empty collection at the requested path.
    #[error("Not Found")]
    NotFound(String),

    /// The request method is not one of GET, POST, PUT or DELETE.
    #[error("Not Implemented")]
    Unsupported(String),

    /// The secure random source could not supply identifier bytes.
    #[error("identifier generation failed: {0}")]
    Identifier(String),

    #[error("storage failure: {0}")]
    Storage(#[from] lazyrest_store::StoreError),
}

impl RestError {
    /// HTTP status this error resolves to at the dispatcher boundary.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidJson(_)
            | Self::InvalidBatch(_)
            | Self::IdMismatch { .. }
            | Self::MissingIdentifier => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Unsupported(_) => Status::NotImplemented,
            Self::Identifier(_) | Self::Storage(_) => Status::InternalServerError,
        }
    }

    /// Whether the failure originates on the server side and must be logged.
    pub fn is_internal(&self) -> bool {
        self.status() == Status::InternalServerError
    }
}

pub type RestResult<T> = Result<T, RestError>;
