//! Entity model and the generic in-memory manager.
//!
//! - `ids`: the [`EntityId`] newtype
//! - `model`: the [`Entity`] trait and the contact / session / task shapes
//! - `manager`: [`EntityManager`] contract and its DashMap-backed store
//! - `seed`: sample data for demo deployments

pub mod errors;
pub mod ids;
pub mod manager;
pub mod model;
pub mod seed;

pub use errors::{ValidationError, ValidationResult};
pub use ids::EntityId;
pub use manager::{EntityManager, InMemoryEntityManager};
pub use model::{
    Contact, ContactPatch, Entity, NewContact, NewTask, Session, SessionDetails, Task, TaskPatch,
};
