use reqwest::StatusCode;
use thiserror::Error;

/// Gateway related errors
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
