use thiserror::Error;

/// Every way a planner operation can end badly. All of them are terminal for the
/// operation that produced them; none of them are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Client-side input problem, detected before any request is sent.
    #[error("{0}")]
    Validation(String),
    #[error("Error connecting to the server: {0}")]
    Transport(String),
    #[error("Error checking route status: {0}")]
    PollFailed(String),
    /// Message reported by the server in an `error` field, kept verbatim.
    #[error("{0}")]
    Server(String),
    #[error("Incomplete route data")]
    Incomplete,
    #[error("Unknown error calculating the route")]
    Unrecognized,
}

impl RouteError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(detail: impl ToString) -> Self {
        Self::Transport(detail.to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
