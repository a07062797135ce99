use std::sync::Arc;

use crate::client::ApiError;

/// Failure of a filesystem operation
///
/// Unknown paths only surface here for operations that must return content
/// (`entries`, `read`, `write`). Existence queries answer `false` instead.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("invalid JSON payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("remote API error: {0}")]
    Remote(Arc<ApiError>),
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("read-only path: {0}")]
    ReadOnly(String),
}

impl From<ApiError> for FsError {
    fn from(err: ApiError) -> Self {
        FsError::Remote(Arc::new(err))
    }
}

impl From<Arc<ApiError>> for FsError {
    fn from(err: Arc<ApiError>) -> Self {
        FsError::Remote(err)
    }
}

pub type FsResult<T> = Result<T, FsError>;
