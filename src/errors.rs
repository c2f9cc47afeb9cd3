//! Error types for the theme license and update client.
//!
//! Transport failures, non-200 replies and unparseable bodies are all
//! rendered identically at the call sites (a generic "try again" message);
//! only [`UpdaterError::ApiLogic`] carries enough detail for fine-grained
//! user-facing messaging.

use thiserror::Error;

use crate::api::Expiry;

pub type UpdaterResult<T> = Result<T, UpdaterError>;

/// Failures raised below the public client surface.
///
/// The public operations on [`crate::license::LicenseClient`] and
/// [`crate::update::UpdateChecker`] never leak these to callers; they are
/// absorbed into renderable messages or cache fallback records.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// Connection or timeout failure before an HTTP status was received.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The endpoint answered with something other than 200.
    #[error("unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    /// The body was not the expected JSON object.
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    /// The body parsed but the API reported `success: false`.
    ///
    /// Carries the first error code from the response's `errors` mapping and
    /// the `expires` field, which the expired-key message interpolates.
    #[error("API rejected the request: {code}")]
    ApiLogic { code: String, expires: Option<Expiry> },

    /// Configuration sources could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl From<reqwest::Error> for UpdaterError {
    fn from(err: reqwest::Error) -> Self {
        UpdaterError::Transport(err.to_string())
    }
}

impl UpdaterError {
    /// True for the failure classes that share the generic user message.
    pub fn is_generic(&self) -> bool {
        !matches!(self, UpdaterError::ApiLogic { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_logic_is_not_generic() {
        let err = UpdaterError::ApiLogic {
            code: "missing_license_key".to_string(),
            expires: None,
        };
        assert!(!err.is_generic());
    }

    #[test]
    fn transport_and_status_errors_are_generic() {
        assert!(UpdaterError::Transport("connection refused".to_string()).is_generic());
        assert!(UpdaterError::HttpStatus { status: 503 }.is_generic());
        assert!(UpdaterError::MalformedResponse("not json".to_string()).is_generic());
    }
}
