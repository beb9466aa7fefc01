//! Typed outcomes of service calls
//!
//! The service answers expected failures (not found, permission denied,
//! conflicting names, ...) with a status code and a message. Those are
//! values, not errors: every call returns an [`ApiResult`] and leaves
//! [`crate::Error`] for transport and local failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys that may carry the message of an error body, in priority order
const MESSAGE_KEYS: [&str; 3] = ["code_text", "detail", "non_field_errors"];

/// Longest raw body kept as a message
const MAX_RAW_MESSAGE: usize = 512;

/// Success flag, human-readable message and HTTP status code
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiStatus {
    pub ok: bool,
    pub message: String,
    pub code: u16,
}

impl ApiStatus {
    pub fn success(code: u16, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            code,
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            code,
        }
    }

    /// Interpret a response from its status code, content type and body.
    ///
    /// JSON bodies contribute the first of `code_text`, `detail` and
    /// `non_field_errors`. A failed response without a JSON body uses the
    /// raw body text as its message.
    pub fn from_response(code: u16, content_type: Option<&str>, body: &[u8]) -> Self {
        let ok = (200..300).contains(&code);
        let is_json = content_type.is_some_and(|ct| ct.starts_with("application/json"));

        let message = if is_json {
            match serde_json::from_slice::<Value>(body) {
                Ok(value) => message_from_json(&value).unwrap_or_default(),
                Err(_) => raw_message(body),
            }
        } else if ok {
            String::new()
        } else {
            raw_message(body)
        };

        Self { ok, message, code }
    }

    /// Fill in a message when the service did not provide one
    pub fn or_message(mut self, on_success: &str, on_failure: &str) -> Self {
        if self.message.is_empty() {
            self.message = if self.ok { on_success } else { on_failure }.to_string();
        }
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }

    pub fn is_denied(&self) -> bool {
        self.code == 401 || self.code == 403
    }

    pub fn is_conflict(&self) -> bool {
        self.code == 409
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Pull the message out of a parsed JSON body
pub fn message_from_json(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let found = MESSAGE_KEYS.iter().find_map(|k| map.get(*k))?;

    let msg = match found {
        Value::String(s) => s.clone(),
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        other => other.to_string(),
    };
    Some(msg)
}

fn raw_message(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(MAX_RAW_MESSAGE) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Status envelope plus an optional payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    pub fn new(status: ApiStatus, data: Option<T>) -> Self {
        Self { status, data }
    }

    /// A result that carries no payload
    pub fn status_only(status: ApiStatus) -> Self {
        Self { status, data: None }
    }

    pub fn is_ok(&self) -> bool {
        self.status.ok
    }

    pub fn message(&self) -> &str {
        &self.status.message
    }

    pub fn code(&self) -> u16 {
        self.status.code
    }

    /// Payload on success, the status otherwise
    pub fn into_result(self) -> std::result::Result<T, ApiStatus> {
        match (self.status.ok, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(self.status),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        ApiResult {
            status: self.status,
            data: self.data.map(f),
        }
    }
}
