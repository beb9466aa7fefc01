//! Request signing
//!
//! Every request carries a capability token bound to the request's
//! canonical path, its method and a deadline:
//!
//! ```text
//! evhb-auth <access_key>:<base64url(hmac_sha1(secret, payload_b64))>:<payload_b64>
//! payload_b64 = base64url({"path_of_url": ..., "method": ..., "deadline": ...})
//! ```
//!
//! The token is self-describing, so it can be verified without any shared
//! session state. [`Credential::verify`] does exactly what the service does.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Scheme tag that prefixes every authorization header value
pub const AUTH_SCHEME: &str = "evhb-auth";

/// The signed part of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Unescaped `path?query` of the request
    pub path_of_url: String,
    /// Upper-case HTTP method
    pub method: String,
    /// Unix timestamp after which the token is void
    pub deadline: i64,
}

/// Access key / secret key pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_key: String,
    secret_key: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Sign a request that stays valid for `ttl_secs` from now
    pub fn sign(&self, canonical_path: &str, method: &http::Method, ttl_secs: u64) -> Result<String> {
        let ttl = i64::try_from(ttl_secs)
            .map_err(|_| Error::Config(format!("signature validity {ttl_secs}s is too large")))?;
        let deadline = jiff::Timestamp::now().as_second().saturating_add(ttl);
        self.sign_until(canonical_path, method.as_str(), deadline)
    }

    /// Sign a request with an explicit deadline
    pub fn sign_until(&self, canonical_path: &str, method: &str, deadline: i64) -> Result<String> {
        let payload = SignedPayload {
            path_of_url: canonical_path.to_string(),
            method: method.to_ascii_uppercase(),
            deadline,
        };
        let payload_b64 = URL_SAFE.encode(serde_json::to_vec(&payload)?);
        let signature = URL_SAFE.encode(self.mac(payload_b64.as_bytes())?);

        Ok(format!(
            "{AUTH_SCHEME} {}:{signature}:{payload_b64}",
            self.access_key
        ))
    }

    /// Check a token the way the service does and return its payload.
    ///
    /// Fails when the token is malformed, was issued for another access
    /// key, carries a bad signature, or expired before `now`.
    pub fn verify(&self, token: &str, now: i64) -> Result<SignedPayload> {
        let parts = TokenParts::parse(token)?;
        if parts.access_key != self.access_key {
            return Err(Error::Auth(format!(
                "token was issued for access key '{}'",
                parts.access_key
            )));
        }

        let signature = URL_SAFE
            .decode(parts.signature)
            .map_err(|e| Error::Auth(format!("signature is not base64url: {e}")))?;
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| Error::Auth(e.to_string()))?;
        mac.update(parts.payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::Auth("signature mismatch".to_string()))?;

        let payload = parts.payload()?;
        if payload.deadline < now {
            return Err(Error::Auth(format!(
                "token expired at {}",
                payload.deadline
            )));
        }
        Ok(payload)
    }

    fn mac(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| Error::Auth(e.to_string()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// The three fields of a token, still encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub access_key: &'a str,
    pub signature: &'a str,
    pub payload_b64: &'a str,
}

impl<'a> TokenParts<'a> {
    pub fn parse(token: &'a str) -> Result<Self> {
        let rest = token
            .strip_prefix(AUTH_SCHEME)
            .and_then(|r| r.strip_prefix(' '))
            .ok_or_else(|| Error::Auth(format!("token does not start with '{AUTH_SCHEME} '")))?;

        let mut fields = rest.splitn(3, ':');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(access_key), Some(signature), Some(payload_b64))
                if !access_key.is_empty() && !signature.is_empty() && !payload_b64.is_empty() =>
            {
                Ok(Self {
                    access_key,
                    signature,
                    payload_b64,
                })
            }
            _ => Err(Error::Auth("token must have three ':' separated fields".to_string())),
        }
    }

    /// Decode the payload without checking the signature
    pub fn payload(&self) -> Result<SignedPayload> {
        let bytes = URL_SAFE
            .decode(self.payload_b64)
            .map_err(|e| Error::Auth(format!("payload is not base64url: {e}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
