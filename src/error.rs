use thiserror::Error;

/// Every way a deployment-status query can fail.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid time expression '{input}': {reason}")]
    InvalidTimeExpression { input: String, reason: String },

    #[error("invalid time range: '{from}' is later than '{to}'")]
    InvalidTimeRange { from: String, to: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed (HTTP {status}): check the organization ID and credentials")]
    Authentication { status: u16 },

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed API response")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("network error")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ReportError {
    pub(crate) fn invalid_time(input: &str, reason: impl Into<String>) -> Self {
        ReportError::InvalidTimeExpression {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::InvalidTimeExpression { .. } | ReportError::InvalidTimeRange { .. } => 2,
            ReportError::Configuration(_) => 3,
            ReportError::Authentication { .. } => 4,
            ReportError::Api { .. } | ReportError::MalformedResponse(_) => 5,
            ReportError::Network(_) => 6,
        }
    }
}
