//! Interpretation of service responses into typed results

use bytes::Bytes;
use hb_core::{ApiResult, ApiStatus, Error, Result};
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::dispatch::describe;

/// A fully read response
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: ApiStatus,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub async fn read(response: reqwest::Response) -> Result<Self> {
        let code = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(describe(&e)))?;

        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let status = ApiStatus::from_response(code, content_type, &body);
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Integer value of a response header
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    /// Result without payload, with default messages
    pub fn status_only(self, on_success: &str, on_failure: &str) -> ApiResult<()> {
        let status = self.status.or_message(on_success, on_failure);
        let data = status.ok.then_some(());
        ApiResult::new(status, data)
    }

    /// Result carrying the JSON body on success.
    ///
    /// A successful response whose body does not decode becomes a failure
    /// with the same status code.
    pub fn json<T: DeserializeOwned>(self, on_success: &str, on_failure: &str) -> ApiResult<T> {
        let status = self.status.or_message(on_success, on_failure);
        if !status.ok {
            return ApiResult::status_only(status);
        }
        match serde_json::from_slice::<T>(&self.body) {
            Ok(data) => ApiResult::new(status, Some(data)),
            Err(e) => {
                tracing::debug!(error = %e, "Response body does not decode");
                ApiResult::status_only(ApiStatus::failure(
                    status.code,
                    format!("malformed response body: {e}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(code: u16, body: &'static str) -> Reply {
        Reply {
            status: ApiStatus::from_response(code, Some("application/json"), body.as_bytes()),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_status_only_defaults() {
        let ok = reply(204, "").status_only("deleted", "delete failed");
        assert!(ok.is_ok());
        assert_eq!(ok.message(), "deleted");

        let failed = reply(404, r#"{"code_text": "no such key"}"#).status_only("deleted", "delete failed");
        assert!(!failed.is_ok());
        assert_eq!(failed.message(), "no such key");
        assert_eq!(failed.data, None);
    }

    #[test]
    fn test_json_payload() {
        let result = reply(200, r#"{"space": 10, "count": 2}"#)
            .json::<hb_core::StatsInfo>("ok", "failed");
        assert_eq!(result.data.unwrap().count, 2);

        let broken = reply(200, "[1, 2").json::<hb_core::StatsInfo>("ok", "failed");
        assert!(!broken.is_ok());
        assert_eq!(broken.code(), 200);
        assert!(broken.message().starts_with("malformed response body"));
    }

    #[test]
    fn test_header_u64() {
        let mut r = reply(200, "");
        r.headers.insert("evob_chunk_size", "42".parse().unwrap());
        r.headers.insert("evob_obj_size", "x".parse().unwrap());
        assert_eq!(r.header_u64("evob_chunk_size"), Some(42));
        assert_eq!(r.header_u64("evob_obj_size"), None);
        assert_eq!(r.header_u64("missing"), None);
    }
}
