//! Typed entity operations over a [`ServiceInvoker`].

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::entities::{Entity, EntityId, Task};
use crate::invoke::{HttpVerb, InvocationRequest, InvokeResult, ServiceInvoker, SidecarClient, decode};

/// Client for one entity collection served by a logical service.
///
/// Missing entities come back as `None` / `false`; every other failure is an
/// [`InvokeError`](crate::invoke::InvokeError) so callers can tell an empty
/// result from a broken call.
pub struct EntityServiceClient<E, I = SidecarClient> {
    invoker: I,
    service: String,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity, I: ServiceInvoker> EntityServiceClient<E, I> {
    /// Address the collection of `E` served by `service`.
    pub fn new(invoker: I, service: impl Into<String>) -> Self {
        Self {
            invoker,
            service: service.into(),
            entity: PhantomData,
        }
    }

    /// Logical service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Underlying invoker.
    #[must_use]
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Entities whose filter attribute equals `value` exactly.
    ///
    /// # Errors
    /// Returns the invocation failure.
    pub async fn list_by(&self, value: &str) -> InvokeResult<Vec<E>> {
        let path = format!(
            "{}?{}={}",
            collection_path::<E>(),
            E::FILTER_PARAM,
            urlencoding::encode(value)
        );
        self.fetch(self.request(HttpVerb::Get, path)).await
    }

    /// Every entity in the collection.
    ///
    /// # Errors
    /// Returns the invocation failure.
    pub async fn list_all(&self) -> InvokeResult<Vec<E>> {
        self.fetch(self.request(HttpVerb::Get, collection_path::<E>()))
            .await
    }

    /// One entity, or `None` if the service does not know `id`.
    ///
    /// # Errors
    /// Returns the invocation failure for anything but a missing entity.
    pub async fn get(&self, id: EntityId) -> InvokeResult<Option<E>> {
        match self.fetch(self.request(HttpVerb::Get, item_path::<E>(id))).await {
            Ok(entity) => Ok(Some(entity)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create an entity and return the id the service assigned.
    ///
    /// # Errors
    /// Returns the invocation failure, including a 400 for an invalid draft.
    pub async fn create(&self, draft: &E::Draft) -> InvokeResult<EntityId> {
        let request = self
            .request(HttpVerb::Post, collection_path::<E>())
            .with_json(draft)?;
        self.fetch(request).await
    }

    /// Replace the mutable fields of `id`. Returns `false` if it does not exist.
    ///
    /// # Errors
    /// Returns the invocation failure for anything but a missing entity.
    pub async fn update(&self, id: EntityId, patch: &E::Patch) -> InvokeResult<bool> {
        let request = self
            .request(HttpVerb::Put, item_path::<E>(id))
            .with_json(patch)?;
        self.acknowledge(request).await
    }

    /// Delete `id`. Returns `false` if it did not exist.
    ///
    /// # Errors
    /// Returns the invocation failure for anything but a missing entity.
    pub async fn delete(&self, id: EntityId) -> InvokeResult<bool> {
        self.acknowledge(self.request(HttpVerb::Delete, item_path::<E>(id)))
            .await
    }

    fn request(&self, verb: HttpVerb, path: String) -> InvocationRequest {
        InvocationRequest::new(verb, self.service.as_str(), path)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: InvocationRequest) -> InvokeResult<T> {
        let body = self.invoker.invoke_raw(request).await?;
        decode(&body)
    }

    async fn acknowledge(&self, request: InvocationRequest) -> InvokeResult<bool> {
        match self.invoker.invoke_raw(request).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl<I: ServiceInvoker> EntityServiceClient<Task, I> {
    /// Flag a task as completed. Returns `false` if it does not exist.
    ///
    /// # Errors
    /// Returns the invocation failure for anything but a missing task.
    pub async fn mark_complete(&self, id: EntityId) -> InvokeResult<bool> {
        let path = format!("{}/markcomplete", item_path::<Task>(id));
        self.acknowledge(self.request(HttpVerb::Put, path)).await
    }
}

fn collection_path<E: Entity>() -> String {
    format!("api/{}", E::COLLECTION)
}

fn item_path<E: Entity>(id: EntityId) -> String {
    format!("api/{}/{id}", E::COLLECTION)
}
