//! Error types for hb-core
//!
//! Only failures the caller cannot treat as an ordinary outcome live here.
//! Application-level rejections from the service (not found, permission
//! denied, ...) are carried by [`crate::ApiStatus`] instead.

use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the harbor client libraries
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration, detected before any request
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed bucket/object path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// URL that cannot be parsed or composed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Token that cannot be decoded or does not verify
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Connection, timeout or TLS failure from the HTTP exchange
    #[error("Network error: {0}")]
    Network(String),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Profile file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Profile file could not be written
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Named profile does not exist
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Offset outside the bounds of the object
    #[error("Offset out of range: {0}")]
    OutOfRange(String),

    /// Anything else
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether the error came from the transport rather than local state
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidPath(_) | Error::InvalidUrl(_) => 2,
            Error::Network(_) => 3,
            Error::Auth(_) => 4,
            Error::ProfileNotFound(_) => 5,
            _ => 1,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("access key is empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: access key is empty");

        let err = Error::OutOfRange("offset 10 >= object size 5".to_string());
        assert!(err.to_string().contains("offset 10"));
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(!err.is_network());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::InvalidPath("x".into()).exit_code(), 2);
        assert_eq!(Error::Network("refused".into()).exit_code(), 3);
        assert_eq!(Error::ProfileNotFound("p".into()).exit_code(), 5);
        assert_eq!(Error::Auth("bad signature".into()).exit_code(), 4);
        assert_eq!(Error::General("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_profile_file_errors() {
        let err: Error = toml::from_str::<toml::Table>("version = ").unwrap_err().into();
        assert!(matches!(err, Error::TomlDe(_)));
        assert!(err.to_string().starts_with("TOML parse error"));
        assert_eq!(err.exit_code(), 1);
    }
}
