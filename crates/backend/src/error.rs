//! Typed error enum for the backend crate.

use thiserror::Error;

/// Errors from generation backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response: no {0} returned")]
    EmptyResponse(&'static str),
    #[error("generation job failed: {0}")]
    JobFailed(String),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
    #[error("stopped by user")]
    Cancelled,
    #[error("all retries exhausted, last error: {0}")]
    RetriesExhausted(Box<BackendError>),
    #[error("{0}")]
    Other(String),
}

/// How the retry wrapper should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Cancellation requested; stop immediately, never retry.
    Cancelled,
    /// Transient; retry within budget.
    Retryable,
    /// Permanent; propagate unwrapped.
    Fatal,
}

/// Whether a stringified vendor error looks transient.
///
/// The vendor does not always surface a status code, so overload conditions
/// are matched by substring against the message (case-insensitive).
#[must_use]
pub fn is_retryable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["503", "429", "500", "overloaded", "internal server error"]
        .iter()
        .any(|needle| lower.contains(needle))
}

impl BackendError {
    /// Classifies this error for the retry wrapper.
    ///
    /// All matching rules live here so the policy stays centralized and
    /// swappable if the vendor's error shape changes.
    #[must_use]
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::Cancelled => ErrorClass::Cancelled,
            Self::HttpRequest(_) => ErrorClass::Retryable,
            Self::HttpStatus { code, body } => {
                if matches!(code, 429 | 500 | 503) || is_retryable_message(body) {
                    ErrorClass::Retryable
                } else {
                    ErrorClass::Fatal
                }
            },
            Self::Other(message) => {
                if is_retryable_message(message) {
                    ErrorClass::Retryable
                } else {
                    ErrorClass::Fatal
                }
            },
            _ => ErrorClass::Fatal,
        }
    }

    /// Whether this error is transient and should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.classify() == ErrorClass::Retryable
    }

    /// Short human-readable message for the user-facing layer.
    ///
    /// Known vendor shapes get a specific message; anything unrecognized
    /// falls back to a generic one. Nothing technical leaks through.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "Stopped.".to_owned(),
            Self::RetriesExhausted(last) => format!(
                "The model kept failing after several attempts: {}",
                last.user_message()
            ),
            Self::HttpStatus { code: 429, .. } => {
                "The model is receiving too many requests. Try again in a moment.".to_owned()
            },
            Self::HttpStatus { code: 500 | 503, .. } => {
                "The model is overloaded right now. Try again in a moment.".to_owned()
            },
            Self::JobFailed(message) => format!("Generation failed: {message}"),
            Self::HttpRequest(_) => "Could not reach the generation service.".to_owned(),
            _ => "Something went wrong during generation.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_classify_as_retryable() {
        for code in [429, 500, 503] {
            let err = BackendError::HttpStatus { code, body: String::new() };
            assert_eq!(err.classify(), ErrorClass::Retryable, "code {code}");
        }
        let err = BackendError::HttpStatus { code: 401, body: "Unauthorized".into() };
        assert_eq!(err.classify(), ErrorClass::Fatal);
    }

    #[test]
    fn message_matching_is_case_insensitive() {
        assert!(is_retryable_message("Model OVERLOADED, slow down"));
        assert!(is_retryable_message("Internal Server Error"));
        assert!(is_retryable_message("got 429 from upstream"));
        assert!(!is_retryable_message("invalid request"));
    }

    #[test]
    fn cancelled_outranks_everything() {
        assert_eq!(BackendError::Cancelled.classify(), ErrorClass::Cancelled);
    }

    #[test]
    fn exhaustion_is_not_retryable() {
        let err = BackendError::RetriesExhausted(Box::new(BackendError::HttpStatus {
            code: 503,
            body: String::new(),
        }));
        assert_eq!(err.classify(), ErrorClass::Fatal);
    }
}
