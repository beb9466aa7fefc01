//! Client configuration
//!
//! A [`ClientConfig`] is built once, validated, and then handed to every
//! component that needs it. Nothing here is process-global or mutable after
//! construction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MIB: u32 = 1024 * 1024;

/// Default validity window for request signatures, in seconds
pub const DEFAULT_SIGNATURE_TTL_SECS: u64 = 3600;

/// Path prefixes of the service's API families
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiPrefixes {
    pub object: String,
    pub directory: String,
    pub bucket: String,
    #[serde(rename = "move")]
    pub move_: String,
    pub metadata: String,
    pub stats: String,
}

impl Default for ApiPrefixes {
    fn default() -> Self {
        Self {
            object: "obj".to_string(),
            directory: "dir".to_string(),
            bucket: "buckets".to_string(),
            move_: "move".to_string(),
            metadata: "metadata".to_string(),
            stats: "stats".to_string(),
        }
    }
}

/// Chunk sizing for object transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes requested per download chunk
    pub download_chunk_size: u32,
    /// Bytes sent per upload chunk
    pub upload_chunk_size: u32,
    /// Largest chunk the service accepts
    pub max_chunk_size: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            download_chunk_size: 10 * MIB,
            upload_chunk_size: 5 * MIB,
            max_chunk_size: 20 * MIB,
        }
    }
}

impl TransferConfig {
    pub fn validate(&self) -> Result<()> {
        if self.download_chunk_size == 0 || self.upload_chunk_size == 0 {
            return Err(Error::Config("chunk sizes must be positive".to_string()));
        }
        if self.download_chunk_size > self.max_chunk_size {
            return Err(Error::Config(format!(
                "download chunk size {} exceeds the maximum of {}",
                self.download_chunk_size, self.max_chunk_size
            )));
        }
        if self.upload_chunk_size > self.max_chunk_size {
            return Err(Error::Config(format!(
                "upload chunk size {} exceeds the maximum of {}",
                self.upload_chunk_size, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

/// Everything a client needs to reach and authenticate against the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and authority, e.g. `https://obs.example.org`
    pub endpoint: String,
    /// API version path segment
    pub api_version: String,
    pub access_key: String,
    pub secret_key: String,
    pub prefixes: ApiPrefixes,
    /// How long a request signature stays valid
    pub signature_ttl_secs: u64,
    /// Per-request timeout handed to the HTTP client
    pub timeout_secs: Option<u64>,
    pub transfer: TransferConfig,
}

impl ClientConfig {
    /// Create a configuration with default prefixes and chunk sizes
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: "v1".to_string(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            prefixes: ApiPrefixes::default(),
            signature_ttl_secs: DEFAULT_SIGNATURE_TTL_SECS,
            timeout_secs: None,
            transfer: TransferConfig::default(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_prefixes(mut self, prefixes: ApiPrefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn with_signature_ttl(mut self, secs: u64) -> Self {
        self.signature_ttl_secs = secs;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_transfer(mut self, transfer: TransferConfig) -> Self {
        self.transfer = transfer;
        self
    }

    /// Check the configuration before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(Error::Config(
                "both access key and secret key must be configured".to_string(),
            ));
        }

        let endpoint = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {e}", self.endpoint)))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(Error::Config(format!(
                "endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }
        if endpoint.host_str().is_none() {
            return Err(Error::Config(format!(
                "endpoint '{}' has no host",
                self.endpoint
            )));
        }

        if self.signature_ttl_secs == 0 {
            return Err(Error::Config(
                "signature validity must be at least one second".to_string(),
            ));
        }

        self.transfer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://obs.example.org", "ak", "sk");
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.signature_ttl_secs, 3600);
        assert_eq!(config.prefixes.object, "obj");
        assert_eq!(config.prefixes.move_, "move");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let config = ClientConfig::new("https://obs.example.org", "", "sk");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ClientConfig::new("https://obs.example.org", "ak", "");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = ClientConfig::new("obs.example.org", "ak", "sk");
        assert!(config.validate().is_err());

        let config = ClientConfig::new("ftp://obs.example.org", "ak", "sk");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = ClientConfig::new("http://localhost:8000", "ak", "sk").with_signature_ttl(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transfer_limits() {
        let transfer = TransferConfig {
            download_chunk_size: 32 * MIB,
            ..Default::default()
        };
        assert!(transfer.validate().is_err());

        let transfer = TransferConfig {
            upload_chunk_size: 0,
            ..Default::default()
        };
        assert!(transfer.validate().is_err());

        assert!(TransferConfig::default().validate().is_ok());
    }

    #[test]
    fn test_prefixes_deserialize_partial() {
        let prefixes: ApiPrefixes = toml::from_str("object = \"o\"\nmove = \"mv\"").unwrap();
        assert_eq!(prefixes.object, "o");
        assert_eq!(prefixes.move_, "mv");
        assert_eq!(prefixes.directory, "dir");
    }
}
