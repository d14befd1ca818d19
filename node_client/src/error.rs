use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid node URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status. `body` is the node's error text.
    #[error("node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NodeError::Timeout
        } else if e.is_decode() {
            NodeError::InvalidResponse(e.to_string())
        } else {
            NodeError::Request(e.to_string())
        }
    }
}
