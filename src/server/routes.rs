//! HTTP route handlers for the entity API.
//!
//! Each entity type gets the same five routes under `/api/{collection}`;
//! tasks add `PUT /api/tasks/{id}/markcomplete`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::entities::{Contact, Entity, EntityId, EntityManager, Session, Task, ValidationError};

use super::state::AppState;

/// Shared handle to one entity store.
type Manager<E> = Arc<dyn EntityManager<E>>;

/// Error half of every handler result, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        tracing::debug!("rejected request: {err}");
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected body: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

/// JSON body whose decoding failures answer 400 like any other validation failure.
type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::clone(&state))
        .merge(entity_routes::<Contact>(Arc::clone(&state.contacts)))
        .merge(entity_routes::<Session>(Arc::clone(&state.sessions)))
        .merge(entity_routes::<Task>(Arc::clone(&state.tasks)))
        .merge(task_action_routes(Arc::clone(&state.tasks)))
}

/// CRUD routes for one entity type, bound to its store.
pub fn entity_routes<E: Entity>(manager: Manager<E>) -> Router {
    let collection = format!("/api/{}", E::COLLECTION);
    let item = format!("{collection}/{{id}}");
    Router::new()
        .route(&collection, get(list_entities::<E>).post(create_entity::<E>))
        .route(
            &item,
            get(get_entity::<E>)
                .put(update_entity::<E>)
                .delete(delete_entity::<E>),
        )
        .with_state(manager)
}

fn task_action_routes(tasks: Manager<Task>) -> Router {
    Router::new()
        .route("/api/tasks/{id}/markcomplete", put(mark_task_complete))
        .with_state(tasks)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sidecar-crud",
        "version": env!("CARGO_PKG_VERSION"),
        "entities": {
            "contacts": state.contacts.len(),
            "sessions": state.sessions.len(),
            "tasks": state.tasks.len(),
        }
    }))
}

fn parse_id(raw: &str) -> Result<EntityId, ApiError> {
    raw.parse::<EntityId>()
        .map_err(|_| ValidationError::MalformedId(raw.to_string()).into())
}

fn not_found<E: Entity>(id: EntityId) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        format!("{} `{id}` not found", E::COLLECTION),
    )
}

/// `GET /api/{collection}[?filter=value]`: filtered listing, or everything without the filter.
async fn list_entities<E: Entity>(
    State(manager): State<Manager<E>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<E>> {
    let found = match params.get(E::FILTER_PARAM) {
        Some(value) => manager.get_all_by_filter(value),
        None => manager.get_all(),
    };
    let now = Utc::now();
    Json(found.into_iter().map(|entity| entity.for_read(now)).collect())
}

/// `GET /api/{collection}/{id}`.
async fn get_entity<E: Entity>(
    State(manager): State<Manager<E>>,
    Path(raw_id): Path<String>,
) -> Result<Json<E>, ApiError> {
    let id = parse_id(&raw_id)?;
    manager
        .get_by_id(id)
        .map(|entity| Json(entity.for_read(Utc::now())))
        .ok_or_else(|| not_found::<E>(id))
}

/// `POST /api/{collection}`: 201 with a `Location` header and the new id as body.
async fn create_entity<E: Entity>(
    State(manager): State<Manager<E>>,
    body: JsonBody<E::Draft>,
) -> Result<Response, ApiError> {
    let Json(draft) = body?;
    E::validate_draft(&draft)?;
    let id = manager.create(draft);
    let location = format!("/api/{}/{id}", E::COLLECTION);
    tracing::info!(collection = E::COLLECTION, %id, "created");
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(id)).into_response())
}

/// `PUT /api/{collection}/{id}`.
async fn update_entity<E: Entity>(
    State(manager): State<Manager<E>>,
    Path(raw_id): Path<String>,
    body: JsonBody<E::Patch>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(patch) = body?;
    E::validate_patch(&patch)?;
    if manager.update(id, patch) {
        Ok(StatusCode::OK)
    } else {
        Err(not_found::<E>(id))
    }
}

/// `DELETE /api/{collection}/{id}`.
async fn delete_entity<E: Entity>(
    State(manager): State<Manager<E>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    if manager.delete(id) {
        tracing::info!(collection = E::COLLECTION, %id, "deleted");
        Ok(StatusCode::OK)
    } else {
        Err(not_found::<E>(id))
    }
}

/// `PUT /api/tasks/{id}/markcomplete`.
async fn mark_task_complete(
    State(tasks): State<Manager<Task>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    if tasks.modify(id, &Task::mark_completed) {
        Ok(StatusCode::OK)
    } else {
        Err(not_found::<Task>(id))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Duration;
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn router() -> (Arc<AppState>, Router) {
        let state = AppState::new();
        (Arc::clone(&state), create_router(state))
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        Ok(router.clone().oneshot(request).await?)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, Box<dyn std::error::Error>> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn contact_json(name: &str, owner: &str) -> serde_json::Value {
        json!({
            "name": name,
            "email": format!("{}@x.com", name.to_lowercase()),
            "phoneNumber": "555",
            "contactCreatedBy": owner,
        })
    }

    #[tokio::test]
    async fn test_create_returns_201_with_location() -> TestResult {
        let (state, router) = router();
        let response = send(&router, "POST", "/api/contacts", Some(contact_json("A", "u1"))).await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();
        let id: EntityId = read_json(response).await?;
        assert_eq!(location, format!("/api/contacts/{id}"));
        assert!(state.contacts.get_by_id(id).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_by_creator_scenario() -> TestResult {
        let (_, router) = router();
        send(&router, "POST", "/api/contacts", Some(contact_json("A", "u1"))).await?;

        let mine: Vec<Contact> =
            read_json(send(&router, "GET", "/api/contacts?createdBy=u1", None).await?).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "A");
        assert_eq!(mine[0].email, "a@x.com");

        let response = send(&router, "GET", "/api/contacts?createdBy=u2", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let theirs: Vec<Contact> = read_json(response).await?;
        assert!(theirs.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_and_malformed() -> TestResult {
        let (_, router) = router();
        let missing = send(&router, "GET", &format!("/api/contacts/{}", EntityId::new()), None).await?;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let malformed = send(&router, "GET", "/api/contacts/not-a-uuid", None).await?;
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_paths() -> TestResult {
        let (state, router) = router();
        let id = state.contacts.create(serde_json::from_value(contact_json("A", "u1"))?);
        let uri = format!("/api/contacts/{id}");
        let patch = json!({ "name": "B", "email": "b@x.com", "phoneNumber": "" });

        let ok = send(&router, "PUT", &uri, Some(patch.clone())).await?;
        assert_eq!(ok.status(), StatusCode::OK);
        let fetched: Contact = read_json(send(&router, "GET", &uri, None).await?).await?;
        assert_eq!(fetched.name, "B");
        assert_eq!(fetched.contact_created_by, "u1");

        let missing = send(&router, "PUT", &format!("/api/contacts/{}", EntityId::new()), Some(patch)).await?;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let invalid = send(
            &router,
            "PUT",
            &uri,
            Some(json!({ "name": "B", "email": "nope", "phoneNumber": "" })),
        )
        .await?;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_incomplete_body_is_400_with_json_error() -> TestResult {
        let (state, router) = router();
        let partial = json!({ "name": "B" });

        let created = send(&router, "POST", "/api/contacts", Some(partial.clone())).await?;
        assert_eq!(created.status(), StatusCode::BAD_REQUEST);
        let error: serde_json::Value = read_json(created).await?;
        assert!(error["error"].as_str().is_some_and(|msg| msg.contains("email")));
        assert!(state.contacts.is_empty());

        let id = state.contacts.create(serde_json::from_value(contact_json("A", "u1"))?);
        let updated = send(&router, "PUT", &format!("/api/contacts/{id}"), Some(partial)).await?;
        assert_eq!(updated.status(), StatusCode::BAD_REQUEST);
        let update_error: serde_json::Value = read_json(updated).await?;
        assert!(update_error["error"].is_string());

        let mistyped = json!({ "taskName": 7, "taskCreatedBy": "u1" });
        let rejected = send(&router, "POST", "/api/tasks", Some(mistyped)).await?;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_then_404() -> TestResult {
        let (state, router) = router();
        let id = state.contacts.create(serde_json::from_value(contact_json("A", "u1"))?);
        let uri = format!("/api/contacts/{id}");

        assert_eq!(send(&router, "DELETE", &uri, None).await?.status(), StatusCode::OK);
        assert_eq!(send(&router, "DELETE", &uri, None).await?.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(&router, "GET", &uri, None).await?.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_sessions_filter_by_speaker_and_validate_range() -> TestResult {
        let (_, router) = router();
        let start = Utc::now();
        let session = json!({
            "name": "Ownership",
            "start": start,
            "end": start + Duration::hours(1),
            "speaker": "Will",
            "speakerEmail": "will@example.com",
        });
        let created = send(&router, "POST", "/api/sessions", Some(session)).await?;
        assert_eq!(created.status(), StatusCode::CREATED);

        let listed: Vec<Session> =
            read_json(send(&router, "GET", "/api/sessions?speaker=Will", None).await?).await?;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].description.is_none());

        let everything: Vec<Session> =
            read_json(send(&router, "GET", "/api/sessions", None).await?).await?;
        assert_eq!(everything.len(), 1);

        let inverted = json!({
            "name": "Backwards",
            "start": start,
            "end": start - Duration::hours(1),
            "speaker": "Will",
            "speakerEmail": "will@example.com",
        });
        let rejected = send(&router, "POST", "/api/sessions", Some(inverted)).await?;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_task_complete() -> TestResult {
        let (_, router) = router();
        let task = json!({
            "taskName": "write docs",
            "taskCreatedBy": "u1",
            "taskDueDate": Utc::now() - Duration::days(1),
            "taskAssignedTo": "dev@x.com",
        });
        let created = send(&router, "POST", "/api/tasks", Some(task)).await?;
        let id: EntityId = read_json(created).await?;
        let uri = format!("/api/tasks/{id}");

        let before: Task = read_json(send(&router, "GET", &uri, None).await?).await?;
        assert!(before.is_over_due);
        assert!(!before.is_completed);

        let done = send(&router, "PUT", &format!("{uri}/markcomplete"), None).await?;
        assert_eq!(done.status(), StatusCode::OK);

        let after: Task = read_json(send(&router, "GET", &uri, None).await?).await?;
        assert!(after.is_completed);
        assert!(!after.is_over_due);

        let missing = send(&router, "PUT", &format!("/api/tasks/{}/markcomplete", EntityId::new()), None).await?;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_health_reports_counts() -> TestResult {
        let (state, router) = router();
        state.contacts.create(serde_json::from_value(contact_json("A", "u1"))?);

        let health: serde_json::Value = read_json(send(&router, "GET", "/health", None).await?).await?;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["entities"]["contacts"], 1);
        assert_eq!(health["entities"]["tasks"], 0);
        Ok(())
    }
}
