use thiserror::Error;

/// Errors returned by ravepay operations.
///
/// A well-formed gateway decline is not an error of the charge flow; it comes
/// back as [`crate::ChargeResult::Failed`]. [`RaveError::Gateway`] is only
/// produced when a caller asks for it (see [`crate::ChargeResult::into_outcome`])
/// or when a requery comes back unsuccessful.
#[derive(Debug, Error)]
pub enum RaveError {
    /// A required field is missing. Raised before anything is sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Key derivation failed or a ciphertext did not decrypt cleanly.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// A response below 500 whose body is not a JSON object.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The gateway answered with a 5xx status. The body is not inspected.
    #[error("server error: status {status}")]
    Server { status: u16 },

    /// The gateway classified the request as failed.
    #[error("gateway declined: code={} message={}", .code.as_deref().unwrap_or("-"), .message.as_deref().unwrap_or("-"))]
    Gateway {
        code: Option<String>,
        message: Option<String>,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RaveError {
    pub(crate) fn missing(field: &str) -> Self {
        RaveError::Validation(format!("{field} is required, and isn't set in payload"))
    }
}
