//! Errors raised by the HTTP and Web API layers.

use thiserror::Error;

/// Failure of a request or of client setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// The transport failed for a reason not covered below.
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// A body was not the JSON the caller expected.
    #[error("malformed JSON body: {0}")]
    Json(String),
    /// The server answered with a non-2xx status.
    ///
    /// `message` holds the response body when there was one.
    #[error("HTTP {status}{}", body_suffix(.message))]
    HttpStatus { status: u16, message: Option<String> },
    #[error("proxy rejected: {0}")]
    Proxy(String),
    /// Client settings could not be read.
    #[error("bad client configuration: {0}")]
    Config(String),
}

fn body_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl NetworkError {
    /// Whether sending the same request again could succeed.
    ///
    /// Throttling (429), server errors, timeouts and refused connections qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

macro_rules! from_display {
    ($($source:ty => $variant:ident),* $(,)?) => {$(
        impl From<$source> for NetworkError {
            fn from(err: $source) -> Self {
                Self::$variant(err.to_string())
            }
        }
    )*};
}

from_display! {
    url::ParseError => InvalidUrl,
    serde_json::Error => Json,
    toml::de::Error => Config,
    http::header::InvalidHeaderName => InvalidHeader,
    http::header::InvalidHeaderValue => InvalidHeader,
}

/// Result of a network operation.
pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = NetworkError::HttpStatus {
            status: 404,
            message: Some("Entity not found".into()),
        };
        assert_eq!(err.to_string(), "HTTP 404: Entity not found");
        assert_eq!(
            NetworkError::HttpStatus { status: 500, message: None }.to_string(),
            "HTTP 500"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(NetworkError::Timeout.is_transient());
        assert!(NetworkError::HttpStatus { status: 503, message: None }.is_transient());
        assert!(NetworkError::HttpStatus { status: 429, message: None }.is_transient());
        assert!(!NetworkError::HttpStatus { status: 401, message: None }.is_transient());
        assert!(!NetworkError::Json("eof".into()).is_transient());
    }

    #[test]
    fn test_conversions_pick_variant() {
        let err: NetworkError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, NetworkError::InvalidUrl(_)));
        let err: NetworkError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(matches!(err, NetworkError::Json(_)));
    }
}
