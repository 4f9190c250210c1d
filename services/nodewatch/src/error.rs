//! Error types for the nodewatch service

/// Errors that can occur in the nodewatch service
#[derive(Debug, thiserror::Error)]
pub enum NodewatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Delivery error: {message}")]
    Delivery {
        /// Destination status code, `None` when the request never got a response
        status: Option<u16>,
        message: String,
    },

    #[error("Run completed with failures: {0}")]
    Incomplete(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NodewatchError {
    /// Status code carried by a delivery failure, if the destination answered
    pub fn delivery_status(&self) -> Option<u16> {
        match self {
            NodewatchError::Delivery { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for nodewatch operations
pub type Result<T> = std::result::Result<T, NodewatchError>;
