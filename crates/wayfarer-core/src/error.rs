//! Error types for Wayfarer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure; the request URL is stripped on conversion
    #[error("HTTP request error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The generative service kept answering 503 until the retry budget ran out
    #[error("AI service overloaded after {attempts} attempts: {message}")]
    Overloaded { attempts: u32, message: String },

    /// Non-retryable upstream status
    #[error("API error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}

impl Error {
    /// Whether the error came from the transport itself (connect, timeout, body read)
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Whether the caller sent something unusable (maps to 400 at the HTTP edge)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::InvalidRequest("bad dates".into()).is_client_error());
        assert!(!Error::Config("missing key".into()).is_client_error());
        assert!(!Error::Upstream {
            status: 500,
            message: "boom".into()
        }
        .is_transport());
    }

    #[test]
    fn test_upstream_display() {
        let err = Error::Upstream {
            status: 400,
            message: "bad request".into(),
        };
        assert_eq!(err.to_string(), "API error: 400 - bad request");
    }
}
