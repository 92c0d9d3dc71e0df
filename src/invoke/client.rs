//! Address-transparent service invocation through the local sidecar.
//!
//! Callers name a logical service and a relative path; the sidecar resolves
//! the service to a real endpoint and forwards the call. The client keeps no
//! address table and does not retry: every call is a single round trip.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::invoke::config::SidecarConfig;
use crate::invoke::error::{InvokeError, InvokeResult};
use crate::invoke::method::HttpVerb;

/// Sidecar API prefix for service invocation.
const INVOKE_PREFIX: &str = "v1.0/invoke";

/// One logical call: verb, target service, relative path and optional JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationRequest {
    /// Verb to forward.
    pub verb: HttpVerb,
    /// Logical service name resolved by the sidecar.
    pub service: String,
    /// Path relative to the service root, optionally with a query string.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
}

impl InvocationRequest {
    /// Build a request without a body.
    #[must_use]
    pub fn new(verb: HttpVerb, service: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb,
            service: service.into(),
            path: path.into(),
            body: None,
        }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// Returns [`InvokeError::InvalidRequest`] if `body` cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> InvokeResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| InvokeError::InvalidRequest(format!("request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Something that can carry an [`InvocationRequest`] to its target.
///
/// Returns the raw body of a successful response.
#[async_trait]
pub trait ServiceInvoker: Send + Sync {
    /// Perform one round trip.
    async fn invoke_raw(&self, request: InvocationRequest) -> InvokeResult<Vec<u8>>;
}

/// Decode a successful response body. An empty body reads as JSON `null`.
///
/// # Errors
/// Returns [`InvokeError::Deserialization`] if the body does not match `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> InvokeResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// HTTP client for the sidecar's service invocation API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct SidecarClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl SidecarClient {
    /// Create a client for the configured sidecar.
    ///
    /// # Errors
    /// Returns an error if the endpoint is invalid or the HTTP client cannot be built.
    pub fn new(config: &SidecarConfig) -> InvokeResult<Self> {
        let endpoint = config.endpoint_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| InvokeError::InvalidRequest(format!("http client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// Create a client from `SIDECAR_HTTP_ENDPOINT` or the default local address.
    ///
    /// # Errors
    /// Returns an error if the configured endpoint is invalid.
    pub fn from_env() -> InvokeResult<Self> {
        Self::new(&SidecarConfig::from_env()?)
    }

    /// Sidecar base URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sidecar URL that forwards `path` to `service`.
    ///
    /// # Errors
    /// Returns [`InvokeError::InvalidRequest`] for an unusable service name or path.
    pub fn invocation_url(&self, service: &str, path: &str) -> InvokeResult<Url> {
        validate_service_name(service)?;
        let path = path.trim_start_matches('/');
        let route = path.split(['?', '#']).next().unwrap_or_default();
        if route.split(['/', '\\']).any(is_dot_segment) {
            return Err(InvokeError::InvalidRequest(format!(
                "path `{path}` escapes the service root"
            )));
        }
        Ok(self
            .endpoint
            .join(&format!("{INVOKE_PREFIX}/{service}/method/{path}"))?)
    }

    /// Invoke and deserialize the response body into `T`.
    ///
    /// # Errors
    /// Returns [`InvokeError::Unreachable`], [`InvokeError::Status`] or
    /// [`InvokeError::Deserialization`] depending on where the call failed.
    pub async fn invoke<T: DeserializeOwned>(&self, request: InvocationRequest) -> InvokeResult<T> {
        let body = self.invoke_raw(request).await?;
        decode(&body)
    }

    /// Invoke and discard the response body.
    ///
    /// # Errors
    /// Returns [`InvokeError::Unreachable`] or [`InvokeError::Status`].
    pub async fn invoke_unit(&self, request: InvocationRequest) -> InvokeResult<()> {
        self.invoke_raw(request).await.map(drop)
    }

    /// `GET` shortcut.
    ///
    /// # Errors
    /// See [`SidecarClient::invoke`].
    pub async fn get<T: DeserializeOwned>(&self, service: &str, path: &str) -> InvokeResult<T> {
        self.invoke(InvocationRequest::new(HttpVerb::Get, service, path))
            .await
    }

    /// `DELETE` shortcut.
    ///
    /// # Errors
    /// See [`SidecarClient::invoke_unit`].
    pub async fn delete(&self, service: &str, path: &str) -> InvokeResult<()> {
        self.invoke_unit(InvocationRequest::new(HttpVerb::Delete, service, path))
            .await
    }
}

#[async_trait]
impl ServiceInvoker for SidecarClient {
    async fn invoke_raw(&self, request: InvocationRequest) -> InvokeResult<Vec<u8>> {
        let url = self.invocation_url(&request.service, &request.path)?;
        tracing::debug!(verb = %request.verb, service = %request.service, %url, "invoking");

        let mut builder = self.client.request(request.verb.as_method(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(service = %request.service, path = %request.path, "sidecar call failed: {e}");
            InvokeError::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            tracing::warn!(
                service = %request.service,
                path = %request.path,
                status = status.as_u16(),
                "invocation returned error status"
            );
            return Err(InvokeError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}

/// `.` or `..`, including percent-encoded spellings URL resolution honours.
fn is_dot_segment(segment: &str) -> bool {
    urlencoding::decode(segment).is_ok_and(|decoded| matches!(decoded.as_ref(), "." | ".."))
}

fn validate_service_name(service: &str) -> InvokeResult<()> {
    if service.is_empty() {
        return Err(InvokeError::InvalidRequest(
            "service name is empty".to_string(),
        ));
    }
    if !service
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(InvokeError::InvalidRequest(format!(
            "service name `{service}` contains unsupported characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Path, RawQuery};
    use axum::http::{Method, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::any;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::test_support::{closed_port, spawn_app};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[derive(Debug, Deserialize)]
    struct Echo {
        app: String,
        path: String,
        method: String,
        query: Option<String>,
        body: serde_json::Value,
    }

    async fn echo(
        method: Method,
        Path((app, path)): Path<(String, String)>,
        RawQuery(query): RawQuery,
        body: Bytes,
    ) -> Response {
        match path.as_str() {
            "fail" => (StatusCode::SERVICE_UNAVAILABLE, "target down").into_response(),
            "missing" => StatusCode::NOT_FOUND.into_response(),
            "empty" => StatusCode::OK.into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                StatusCode::OK.into_response()
            }
            _ => {
                let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
                axum::Json(json!({
                    "app": app,
                    "path": path,
                    "method": method.as_str(),
                    "query": query,
                    "body": body,
                }))
                .into_response()
            }
        }
    }

    async fn fake_sidecar() -> Result<SidecarClient, Box<dyn std::error::Error>> {
        let app = Router::new().route("/v1.0/invoke/{app}/method/{*path}", any(echo));
        let addr = spawn_app(app).await?;
        let config = SidecarConfig::new()
            .with_endpoint(format!("http://{addr}"))
            .with_timeout(Duration::from_millis(500));
        Ok(SidecarClient::new(&config)?)
    }

    #[test]
    fn test_invocation_url_shape() -> TestResult {
        let client = SidecarClient::new(&SidecarConfig::default())?;
        let url = client.invocation_url("tasksmanager-backend-api", "/api/tasks?createdBy=u1")?;
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:3500/v1.0/invoke/tasksmanager-backend-api/method/api/tasks?createdBy=u1"
        );
        Ok(())
    }

    #[test]
    fn test_invocation_url_rejects_bad_input() -> TestResult {
        let client = SidecarClient::new(&SidecarConfig::default())?;
        assert!(matches!(
            client.invocation_url("", "api/tasks"),
            Err(InvokeError::InvalidRequest(_))
        ));
        assert!(matches!(
            client.invocation_url("a/b", "api/tasks"),
            Err(InvokeError::InvalidRequest(_))
        ));
        for escaping in [
            "../../admin",
            "%2e%2e/%2e%2e/%2e%2e/admin",
            "api/%2E./admin",
            "api/.%2e/admin?x=1",
            "..\\admin",
            "./api",
        ] {
            assert!(
                matches!(
                    client.invocation_url("svc", escaping),
                    Err(InvokeError::InvalidRequest(_))
                ),
                "{escaping} was accepted"
            );
        }
        let dotted = client.invocation_url("svc", "api/v1.2/..x")?;
        assert!(dotted.path().ends_with("/v1.0/invoke/svc/method/api/v1.2/..x"));
        Ok(())
    }

    #[test]
    fn test_decode_empty_body_as_null() -> TestResult {
        let value: Option<u32> = decode(b"")?;
        assert_eq!(value, None);
        assert!(matches!(
            decode::<u32>(b"{}"),
            Err(InvokeError::Deserialization(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_is_forwarded_by_logical_name() -> TestResult {
        let client = fake_sidecar().await?;
        let echo: Echo = client
            .get("contacts-api", "api/contacts?createdBy=u1")
            .await?;

        assert_eq!(echo.app, "contacts-api");
        assert_eq!(echo.path, "api/contacts");
        assert_eq!(echo.method, "GET");
        assert_eq!(echo.query.as_deref(), Some("createdBy=u1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_post_carries_json_body() -> TestResult {
        let client = fake_sidecar().await?;
        let request = InvocationRequest::new(HttpVerb::Post, "contacts-api", "api/contacts")
            .with_json(&json!({ "name": "A" }))?;
        let echo: Echo = client.invoke(request).await?;

        assert_eq!(echo.method, "POST");
        assert_eq!(echo.body, json!({ "name": "A" }));
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() -> TestResult {
        let client = fake_sidecar().await?;
        let result: InvokeResult<Echo> = client.get("svc", "fail").await;
        match result {
            Err(InvokeError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "target down");
            }
            other => return Err(format!("expected status error, got {other:?}").into()),
        }

        let missing = client.delete("svc", "missing").await;
        assert!(missing.as_ref().is_err_and(InvokeError::is_not_found));
        Ok(())
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_deserialization_error() -> TestResult {
        let client = fake_sidecar().await?;
        let result: InvokeResult<Vec<u32>> = client.get("svc", "anything").await;
        assert!(matches!(result, Err(InvokeError::Deserialization(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_unit_invocation_ignores_empty_body() -> TestResult {
        let client = fake_sidecar().await?;
        client
            .invoke_unit(InvocationRequest::new(HttpVerb::Put, "svc", "empty"))
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable() -> TestResult {
        let client = fake_sidecar().await?;
        let result: InvokeResult<()> = client.delete("svc", "slow").await;
        assert!(matches!(result, Err(InvokeError::Unreachable(ref e)) if e.is_timeout()));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_sidecar_delete() -> TestResult {
        let port = closed_port().await?;
        let config = SidecarConfig::new().with_endpoint(format!("http://127.0.0.1:{port}"));
        let client = SidecarClient::new(&config)?;

        let id = uuid::Uuid::new_v4();
        let result = client
            .delete("tasksmanager-backend-api", &format!("api/tasks/{id}"))
            .await;

        assert!(matches!(result, Err(InvokeError::Unreachable(_))));
        assert!(result.is_err_and(|e| e.is_transport()));
        Ok(())
    }
}
