use shared::RouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url `{url}`: {reason}")]
    Url { url: String, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
}
