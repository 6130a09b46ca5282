use std::fmt::Display;

use crate::print::auto_redact;

const BODY_PREVIEW_LEN: usize = 200;

/// A [`serde_json::Error`] together with the text that failed to parse.
#[derive(Debug, thiserror::Error)]
pub struct JsonError {
    #[source]
    pub error: serde_json::Error,
    pub json: String,
}

impl Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "couldn't parse JSON: {}", self.error)?;
        if self.json.trim().is_empty() {
            return write!(f, " (empty body)");
        }
        let mut preview: String = self.json.chars().take(BODY_PREVIEW_LEN).collect();
        if preview.len() < self.json.len() {
            preview.push_str("...");
        }
        write!(f, "\nbody: {}", auto_redact(&preview))
    }
}

/// Attach the offending text to a JSON parsing error.
///
/// ```
/// use mcid_core::IntoJsonError;
///
/// let text = "{not json";
/// let err = serde_json::from_str::<serde_json::Value>(text)
///     .json(text)
///     .unwrap_err();
/// assert_eq!(err.json, text);
/// ```
pub trait IntoJsonError<T> {
    #[allow(clippy::missing_errors_doc)]
    fn json(self, text: impl Into<String>) -> Result<T, JsonError>;
}

impl<T> IntoJsonError<T> for Result<T, serde_json::Error> {
    fn json(self, text: impl Into<String>) -> Result<T, JsonError> {
        self.map_err(|error| JsonError {
            error,
            json: text.into(),
        })
    }
}

/// A request that never produced an HTTP response
/// (DNS, connection, TLS, timeout, body read).
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("request failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RequestError {
    /// Wrap a failure coming from a transport that isn't `reqwest`.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            RequestError::Reqwest(err) => err.is_timeout(),
            RequestError::Other(_) => false,
        }
    }
}
