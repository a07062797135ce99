use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
    #[error("response is missing the `{0}` envelope")]
    MissingEnvelope(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
