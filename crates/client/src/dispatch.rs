//! Signed request dispatch
//!
//! Every request goes through [`Dispatcher::execute`]: parameters are merged
//! into the URL, the unescaped `path?query` is signed and the token is sent
//! in the `Authorization` header. Status codes are left to the caller.

use hb_core::{ClientConfig, Credential, Error, Result, canonical_path, merge_query};
use http::Method;
use http::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Request body variants the service accepts
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
    Multipart(reqwest::multipart::Form),
}

/// Optional parts of a request
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Query parameters; these replace same-named ones already in the URL
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add the fields of a serializable struct as query parameters.
    ///
    /// `None` fields are skipped; non-string values use their JSON text.
    pub fn query<T: Serialize>(mut self, query: &T) -> Result<Self> {
        let Value::Object(fields) = serde_json::to_value(query)? else {
            return Err(Error::General(
                "query parameters must serialize to a map".to_string(),
            ));
        };
        for (key, value) in fields {
            match value {
                Value::Null => {}
                Value::String(s) => self.params.push((key, s)),
                other => self.params.push((key, other.to_string())),
            }
        }
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }
}

/// Signs and sends requests
#[derive(Debug, Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
    credential: Credential,
    signature_ttl_secs: u64,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            credential: Credential::new(&config.access_key, &config.secret_key),
            signature_ttl_secs: config.signature_ttl_secs,
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Build the signed request without sending it.
    ///
    /// Fails before any network activity when the URL does not parse.
    pub fn build_request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Request> {
        let mut url = Url::parse(url)?;
        merge_query(&mut url, &options.params);

        let canonical = canonical_path(&url)?;
        let token = self
            .credential
            .sign(&canonical, &method, self.signature_ttl_secs)?;
        tracing::debug!(method = %method, path = %canonical, "Signing request");

        let mut builder = self.http.request(method, url);
        for (name, value) in options.headers {
            builder = builder.header(name, value);
        }
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let mut request = builder
            .build()
            .map_err(|e| Error::General(format!("failed to build request: {e}")))?;
        let value = HeaderValue::from_str(&token)
            .map_err(|e| Error::Auth(format!("token is not a valid header value: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(request)
    }

    /// Sign and send a request, returning the raw response.
    ///
    /// Transport failures come back as [`Error::Network`] and are never
    /// retried here.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Response> {
        let request = self.build_request(method, url, options)?;
        self.http
            .execute(request)
            .await
            .map_err(|e| Error::Network(describe(&e)))
    }
}

/// Render a reqwest error with its failure class
pub(crate) fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Request timeout: {error}")
    } else if error.is_connect() {
        format!("Connection failed: {error}")
    } else if error.is_body() || error.is_decode() {
        format!("Response body error: {error}")
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> Dispatcher {
        let config = ClientConfig::new("http://127.0.0.1:8000", "ak", "sk");
        Dispatcher::new(&config).unwrap()
    }

    fn token(request: &reqwest::Request) -> &str {
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
    }

    #[test]
    fn test_signs_unescaped_path_and_query() {
        let d = dispatcher();
        let request = d
            .build_request(
                Method::GET,
                "http://127.0.0.1:8000/api/v1/obj/b/%E6%88%91/?a=1",
                RequestOptions::new().param("size", 10),
            )
            .unwrap();

        assert_eq!(request.url().query(), Some("a=1&size=10"));
        let payload = d.credential().verify(token(&request), 0).unwrap();
        assert_eq!(payload.path_of_url, "/api/v1/obj/b/我/?a=1&size=10");
        assert_eq!(payload.method, "GET");
    }

    #[test]
    fn test_params_override_existing_query() {
        let d = dispatcher();
        let request = d
            .build_request(
                Method::DELETE,
                "http://127.0.0.1:8000/x/?b=2&a=1",
                RequestOptions::new().param("b", "3"),
            )
            .unwrap();
        assert_eq!(request.url().query(), Some("a=1&b=3"));
        let payload = d.credential().verify(token(&request), 0).unwrap();
        assert_eq!(payload.path_of_url, "/x/?a=1&b=3");
        assert_eq!(payload.method, "DELETE");
    }

    #[test]
    fn test_repeated_query_names_are_signed() {
        let d = dispatcher();
        let request = d
            .build_request(
                Method::GET,
                "http://127.0.0.1:8000/x/?tag=a&tag=b",
                RequestOptions::new().param("size", 1),
            )
            .unwrap();
        assert_eq!(request.url().query(), Some("size=1&tag=a&tag=b"));
        let payload = d.credential().verify(token(&request), 0).unwrap();
        assert_eq!(payload.path_of_url, "/x/?size=1&tag=a&tag=b");
    }

    #[test]
    fn test_query_struct() {
        #[derive(Serialize)]
        struct Page {
            limit: u32,
            ordering: Option<String>,
            share: bool,
        }

        let options = RequestOptions::new()
            .query(&Page {
                limit: 5,
                ordering: None,
                share: true,
            })
            .unwrap();
        assert_eq!(
            options.params,
            vec![
                ("limit".to_string(), "5".to_string()),
                ("share".to_string(), "true".to_string())
            ]
        );
        assert!(RequestOptions::new().query(&42).is_err());
    }

    #[test]
    fn test_caller_cannot_replace_token() {
        let d = dispatcher();
        let request = d
            .build_request(
                Method::POST,
                "http://127.0.0.1:8000/x/",
                RequestOptions::new().header("Authorization", "forged"),
            )
            .unwrap();
        assert_eq!(request.headers().get_all(AUTHORIZATION).iter().count(), 1);
        assert!(token(&request).starts_with("evhb-auth ak:"));
    }

    #[test]
    fn test_no_query_signs_bare_path() {
        let d = dispatcher();
        let request = d
            .build_request(Method::PUT, "http://127.0.0.1:8000/a/b/", RequestOptions::new())
            .unwrap();
        assert!(request.url().query().is_none());
        let payload = d.credential().verify(token(&request), 0).unwrap();
        assert_eq!(payload.path_of_url, "/a/b/");
    }

    #[tokio::test]
    async fn test_malformed_url_fails_before_network() {
        let err = dispatcher()
            .execute(Method::GET, "not a url", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let config = ClientConfig::new("http://127.0.0.1:1", "ak", "sk").with_timeout(5);
        let d = Dispatcher::new(&config).unwrap();
        let err = d
            .execute(Method::GET, "http://127.0.0.1:1/api/", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_network());
    }
}
