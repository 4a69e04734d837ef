// Storefront REST client
//
// Wraps `reqwest::Client` with base-URL resolution, bearer-token injection,
// and `{ success, message, data }` envelope unwrapping. Resource keys are
// plain `path?query` strings resolved against the configured base URL.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, generic_message};
use crate::transport::TransportConfig;

/// Per-request options for [`ApiClient::fetch`].
///
/// `Default` is a bare `GET` with no body and no extra headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Async client for the storefront backend.
///
/// Cheaply cloneable; clones share the connection pool and the bearer
/// token, so a login through one handle authenticates all of them.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    /// Bearer token sent on every request once set.
    token: ArcSwapOption<SecretString>,
}

impl ApiClient {
    /// Build a client from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::from_parts(
            http,
            Self::normalize_base_url(base_url)?,
            transport.timeout,
        ))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        Ok(Self::from_parts(
            http,
            Self::normalize_base_url(base_url)?,
            TransportConfig::default().timeout,
        ))
    }

    fn from_parts(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout,
                token: ArcSwapOption::empty(),
            }),
        }
    }

    /// Ensure the base URL path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The configured base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // ── Bearer token ─────────────────────────────────────────────────

    /// Store a bearer token for all subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        debug!("storing bearer token");
        self.inner.token.store(Some(Arc::new(token)));
    }

    /// Forget the bearer token.
    pub fn clear_token(&self) {
        self.inner.token.store(None);
    }

    pub fn has_token(&self) -> bool {
        self.inner.token.load().is_some()
    }

    fn apply_auth(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.inner.token.load();
        let Some(token) = guard.as_ref() else {
            return Ok(builder);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        value.set_sensitive(true);
        Ok(builder.header(AUTHORIZATION, value))
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Resolve a resource key (e.g. `"/v1/users?page=1"`) against the base URL.
    pub fn url(&self, key: &str) -> Result<Url, Error> {
        Ok(self.inner.base_url.join(key.trim_start_matches('/'))?)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Issue a request for `key` and return the normalized response body.
    ///
    /// 2xx responses are unwrapped from the `{ success, message, data }`
    /// envelope when present. No retries are attempted.
    pub async fn fetch(&self, key: &str, options: RequestOptions) -> Result<Value, Error> {
        let url = self.url(key)?;
        debug!(method = %options.method, %url, "sending request");

        let mut builder = self
            .inner
            .http
            .request(options.method, url)
            .headers(options.headers);
        if let Some(ref body) = options.body {
            builder = builder.json(body);
        }
        let builder = self.apply_auth(builder)?;

        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        let value = self.fetch(key, RequestOptions::default()).await?;
        decode(value)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        key: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.send_json(Method::POST, key, body).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        key: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.send_json(Method::PUT, key, body).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        key: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.send_json(Method::PATCH, key, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        let value = self.fetch(key, RequestOptions::new(Method::DELETE)).await?;
        decode(value)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        key: &str,
        body: &B,
    ) -> Result<T, Error> {
        let body = serde_json::to_value(body).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        let value = self
            .fetch(key, RequestOptions::new(method).with_body(body))
            .await?;
        decode(value)
    }

    // ── Response handling ────────────────────────────────────────────

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.inner.timeout.as_secs(),
            }
        } else {
            Error::Network(err)
        }
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| generic_message(status.as_u16()));
            return Err(Error::Http {
                status: status.as_u16(),
                message,
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        unwrap_envelope(status.as_u16(), value)
    }
}

/// Pull a user-facing message out of an error body.
///
/// Accepts `{"message": "..."}` and `{"error": "..."}` shapes.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(String::from)
}

/// Strip the `{ success, message, data }` envelope from a 2xx body.
///
/// Bodies without envelope markers pass through untouched.
fn unwrap_envelope(status: u16, value: Value) -> Result<Value, Error> {
    let Value::Object(mut map) = value else {
        return Ok(value);
    };

    if map.get("success") == Some(&Value::Bool(false)) {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| generic_message(status), String::from);
        return Err(Error::Rejected { status, message });
    }

    let is_envelope = map.contains_key("success") || map.contains_key("message");
    if is_envelope {
        if let Some(data) = map.remove("data") {
            trace!("unwrapped response envelope");
            return Ok(data);
        }
    }

    Ok(Value::Object(map))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_with_data_is_unwrapped() {
        let out = unwrap_envelope(200, json!({"success": true, "data": [1, 2]})).unwrap();
        assert_eq!(out, json!([1, 2]));
    }

    #[test]
    fn plain_object_passes_through() {
        let body = json!({"id": 7, "data": "not an envelope"});
        assert_eq!(unwrap_envelope(200, body.clone()).unwrap(), body);
    }

    #[test]
    fn success_false_is_rejected_with_message() {
        let err = unwrap_envelope(200, json!({"success": false, "message": "Name already exists"}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected { status: 200, ref message } if message == "Name already exists"
        ));
    }

    #[test]
    fn success_false_without_message_uses_generic() {
        let err = unwrap_envelope(201, json!({"success": false})).unwrap_err();
        assert_eq!(err.user_message(), "Request failed with status 201");
    }

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials","error":"x"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(error_message(r#"{"error":"Forbidden"}"#).as_deref(), Some("Forbidden"));
        assert_eq!(error_message("<html>"), None);
        assert_eq!(error_message(r#"{"message":""}"#), None);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = ApiClient::normalize_base_url("https://api.example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/");
    }

    #[test]
    fn keys_resolve_under_base_path() {
        let client =
            ApiClient::with_client(reqwest::Client::new(), "https://api.example.com/api").unwrap();
        let url = client.url("/v1/users?page=1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/users?page=1");
    }
}
