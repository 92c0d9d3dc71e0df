//! Sidecar service invocation.
//!
//! Front ends call back-end services by logical name through a local sidecar:
//! - `method`: the closed set of forwarded verbs
//! - `config`: sidecar endpoint and timeouts
//! - `client`: [`SidecarClient`] and the [`ServiceInvoker`] seam
//! - `error`: [`InvokeError`] taxonomy

pub mod client;
pub mod config;
pub mod error;
pub mod method;

pub use client::{InvocationRequest, ServiceInvoker, SidecarClient, decode};
pub use config::SidecarConfig;
pub use error::{InvokeError, InvokeResult};
pub use method::HttpVerb;
