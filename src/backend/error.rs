use reqwest::StatusCode;

/// Failures talking to the gifting backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend rejected the session token")]
    Unauthorized,

    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("backend reported failure: {0}")]
    Reported(String),

    #[error("invalid backend endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl BackendError {
    /// Build the error for a non-success HTTP status, keeping a short body excerpt
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Self::Unauthorized;
        }
        let message: String = body.chars().take(200).collect();
        Self::Status { status, message }
    }
}
