//! Invocation forwarding: resolve the app id, call it, relay the answer.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use url::Url;

use crate::invoke::HttpVerb;
use crate::sidecar::config::{RetryPolicy, SidecarServerConfig};
use crate::sidecar::error::{SidecarError, SidecarResult};
use crate::sidecar::registry::AppRegistry;

/// Headers copied from the target's response back to the caller.
const RELAYED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::LOCATION];

/// State shared by the forwarding handlers.
pub struct SidecarState {
    registry: Arc<AppRegistry>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl SidecarState {
    /// Create forwarding state over `registry`.
    ///
    /// # Errors
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(registry: Arc<AppRegistry>, config: &SidecarServerConfig) -> SidecarResult<Arc<Self>> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Arc::new(Self {
            registry,
            client,
            retry: config.retry,
        }))
    }

    /// Registry used for resolution.
    #[must_use]
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }
}

/// Create the sidecar router.
pub fn create_router(state: Arc<SidecarState>) -> Router {
    Router::new()
        .route("/v1.0/healthz", get(|| async { StatusCode::NO_CONTENT }))
        .route("/v1.0/invoke/{app_id}/method/{*path}", any(forward))
        .with_state(state)
}

async fn forward(
    State(state): State<Arc<SidecarState>>,
    method: Method,
    Path((app_id, path)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> SidecarResult<Response> {
    let verb = HttpVerb::from_method(&method)
        .ok_or_else(|| SidecarError::UnsupportedMethod(method.to_string()))?;
    let base = state
        .registry
        .resolve(&app_id)
        .ok_or_else(|| SidecarError::UnknownApp(app_id.clone()))?;

    let target = target_url(&base, &path, query.as_deref())?;
    tracing::debug!(%verb, app = %app_id, %target, "forwarding");

    let upstream = send_with_retry(&state, verb, &target, headers.get(header::CONTENT_TYPE), body).await?;
    relay(upstream).await
}

/// Append `path` below an app's base URL and attach `query`.
///
/// `path` arrives percent-decoded, so each segment is re-encoded on its own
/// and the result can never leave the base URL.
fn target_url(base: &Url, path: &str, query: Option<&str>) -> SidecarResult<Url> {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    if segments.iter().any(|segment| matches!(*segment, "." | "..")) {
        return Err(SidecarError::InvalidPath(path.to_string()));
    }

    let mut target = base.clone();
    target
        .path_segments_mut()
        .map_err(|()| SidecarError::InvalidPath(path.to_string()))?
        .pop_if_empty()
        .extend(segments);
    target.set_query(query.filter(|q| !q.is_empty()));
    Ok(target)
}

async fn send_with_retry(
    state: &SidecarState,
    verb: HttpVerb,
    target: &Url,
    content_type: Option<&HeaderValue>,
    body: Bytes,
) -> SidecarResult<reqwest::Response> {
    let max_retries = if verb.is_idempotent() {
        state.retry.max_retries
    } else {
        0
    };

    let mut retries = 0;
    loop {
        let mut request = state
            .client
            .request(verb.as_method(), target.clone())
            .body(body.clone());
        if let Some(value) = content_type {
            request = request.header(header::CONTENT_TYPE, value.clone());
        }

        let error = match request.send().await {
            Ok(response) => return Ok(response),
            Err(err) => SidecarError::from(err),
        };
        if retries >= max_retries || !error.is_retryable() {
            return Err(error);
        }
        retries += 1;
        tracing::warn!(%verb, %target, retries, "retrying after: {error}");
        tokio::time::sleep(state.retry.delay_for(retries)).await;
    }
}

async fn relay(upstream: reqwest::Response) -> SidecarResult<Response> {
    let mut builder = Response::builder().status(upstream.status());
    for name in RELAYED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }
    let bytes = upstream.bytes().await?;
    builder
        .body(Body::from(bytes))
        .map_err(|e| SidecarError::Relay(e.to_string()))
}
