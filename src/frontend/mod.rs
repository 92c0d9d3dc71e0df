//! Front-end access to the entity APIs.
//!
//! Page handlers talk to a back-end service only through its logical name;
//! [`EntityServiceClient`] maps the entity operations onto sidecar
//! invocations.

pub mod client;

pub use client::EntityServiceClient;

/// Logical name the task front end uses for its back end.
pub const TASKS_BACKEND_SERVICE: &str = "tasksmanager-backend-api";
