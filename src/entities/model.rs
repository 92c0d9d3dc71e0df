//! Entity shapes managed by the generic store.
//!
//! Every concrete entity plugs into [`crate::entities::EntityManager`] through
//! the [`Entity`] trait. The trait fixes the create payload (`Draft`), the
//! update payload (`Patch`), the field used for filtered listings and the
//! REST collection name.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entities::errors::{ValidationError, ValidationResult, require};
use crate::entities::ids::EntityId;

/// An entity type that can live in an entity store.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Payload accepted by `create`.
    type Draft: Clone + Send + Sync + Serialize + DeserializeOwned + 'static;
    /// Payload accepted by `update`; replaces every mutable attribute.
    type Patch: Clone + Send + Sync + Serialize + DeserializeOwned + 'static;

    /// REST collection segment (`/api/{COLLECTION}`).
    const COLLECTION: &'static str;
    /// Query parameter carrying the filter value on list requests.
    const FILTER_PARAM: &'static str;

    /// Build a new entity from a draft. `now` stamps both timestamps.
    fn from_draft(id: EntityId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Overwrite mutable attributes from `patch`. Id, creation time and owner stay.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Stored identifier.
    fn id(&self) -> EntityId;

    /// Value compared by filtered listings.
    fn filter_value(&self) -> &str;

    /// Creation timestamp.
    fn created_on(&self) -> DateTime<Utc>;

    /// Last mutation timestamp.
    fn updated_on(&self) -> DateTime<Utc>;

    /// Refresh the last mutation timestamp.
    fn touch(&mut self, now: DateTime<Utc>);

    /// Fill read-time derived fields before the entity leaves the service.
    #[must_use]
    fn for_read(self, _now: DateTime<Utc>) -> Self {
        self
    }

    /// Boundary check for create payloads.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] describing the first rejected field.
    fn validate_draft(_draft: &Self::Draft) -> ValidationResult {
        Ok(())
    }

    /// Boundary check for update payloads.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] describing the first rejected field.
    fn validate_patch(_patch: &Self::Patch) -> ValidationResult {
        Ok(())
    }
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

fn validate_email(field: &'static str, value: &str) -> ValidationResult {
    require(field, value)?;
    match email_regex() {
        Some(re) if re.is_match(value.trim()) => Ok(()),
        Some(_) => Err(ValidationError::Invalid {
            field,
            reason: format!("`{value}` is not an email address"),
        }),
        None => Ok(()),
    }
}

// ===== Contact ==============================================================

/// An address-book contact owned by the user who created it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Identifier.
    pub contact_id: EntityId,
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number, free form.
    pub phone_number: String,
    /// Owner; never changed by updates.
    pub contact_created_by: String,
    /// Creation time.
    pub contact_created_on: DateTime<Utc>,
    /// Last update time.
    pub contact_updated_on: DateTime<Utc>,
}

/// Create payload for [`Contact`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone_number: String,
    /// Owner.
    pub contact_created_by: String,
}

/// Update payload for [`Contact`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone_number: String,
}

impl Entity for Contact {
    type Draft = NewContact;
    type Patch = ContactPatch;

    const COLLECTION: &'static str = "contacts";
    const FILTER_PARAM: &'static str = "createdBy";

    fn from_draft(id: EntityId, draft: NewContact, now: DateTime<Utc>) -> Self {
        Self {
            contact_id: id,
            name: draft.name,
            email: draft.email,
            phone_number: draft.phone_number,
            contact_created_by: draft.contact_created_by,
            contact_created_on: now,
            contact_updated_on: now,
        }
    }

    fn apply_patch(&mut self, patch: ContactPatch) {
        self.name = patch.name;
        self.email = patch.email;
        self.phone_number = patch.phone_number;
    }

    fn id(&self) -> EntityId {
        self.contact_id
    }

    fn filter_value(&self) -> &str {
        &self.contact_created_by
    }

    fn created_on(&self) -> DateTime<Utc> {
        self.contact_created_on
    }

    fn updated_on(&self) -> DateTime<Utc> {
        self.contact_updated_on
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.contact_updated_on = now;
    }

    fn validate_draft(draft: &NewContact) -> ValidationResult {
        require("name", &draft.name)?;
        validate_email("email", &draft.email)?;
        require("contactCreatedBy", &draft.contact_created_by)
    }

    fn validate_patch(patch: &ContactPatch) -> ValidationResult {
        require("name", &patch.name)?;
        validate_email("email", &patch.email)
    }
}

// ===== Session ==============================================================

/// A conference session, listed per speaker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Identifier.
    pub id: EntityId,
    /// Title.
    pub name: String,
    /// Optional abstract.
    pub description: Option<String>,
    /// Start time.
    pub start: DateTime<Utc>,
    /// End time.
    pub end: DateTime<Utc>,
    /// Optional room or venue.
    pub location: Option<String>,
    /// Speaker name; also the filter field.
    pub speaker: String,
    /// Speaker contact address.
    pub speaker_email: String,
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Last update time.
    pub updated_on: DateTime<Utc>,
}

/// Create and update payload for [`Session`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    /// Title.
    pub name: String,
    /// Optional abstract.
    #[serde(default)]
    pub description: Option<String>,
    /// Start time.
    pub start: DateTime<Utc>,
    /// End time.
    pub end: DateTime<Utc>,
    /// Optional room or venue.
    #[serde(default)]
    pub location: Option<String>,
    /// Speaker name.
    pub speaker: String,
    /// Speaker contact address.
    pub speaker_email: String,
}

impl SessionDetails {
    fn validate(&self) -> ValidationResult {
        require("name", &self.name)?;
        require("speaker", &self.speaker)?;
        validate_email("speakerEmail", &self.speaker_email)?;
        if self.end < self.start {
            return Err(ValidationError::Invalid {
                field: "end",
                reason: "session ends before it starts".to_string(),
            });
        }
        Ok(())
    }
}

impl Entity for Session {
    type Draft = SessionDetails;
    type Patch = SessionDetails;

    const COLLECTION: &'static str = "sessions";
    const FILTER_PARAM: &'static str = "speaker";

    fn from_draft(id: EntityId, draft: SessionDetails, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            start: draft.start,
            end: draft.end,
            location: draft.location,
            speaker: draft.speaker,
            speaker_email: draft.speaker_email,
            created_on: now,
            updated_on: now,
        }
    }

    fn apply_patch(&mut self, patch: SessionDetails) {
        self.name = patch.name;
        self.description = patch.description;
        self.start = patch.start;
        self.end = patch.end;
        self.location = patch.location;
        self.speaker = patch.speaker;
        self.speaker_email = patch.speaker_email;
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn filter_value(&self) -> &str {
        &self.speaker
    }

    fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    fn updated_on(&self) -> DateTime<Utc> {
        self.updated_on
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_on = now;
    }

    fn validate_draft(draft: &SessionDetails) -> ValidationResult {
        draft.validate()
    }

    fn validate_patch(patch: &SessionDetails) -> ValidationResult {
        patch.validate()
    }
}

// ===== Task =================================================================

/// A to-do item owned by its creator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier.
    pub task_id: EntityId,
    /// Short description.
    pub task_name: String,
    /// Owner; never changed by updates.
    pub task_created_by: String,
    /// Creation time.
    pub task_created_on: DateTime<Utc>,
    /// Last update time.
    pub task_updated_on: DateTime<Utc>,
    /// Deadline.
    pub task_due_date: DateTime<Utc>,
    /// Assignee address.
    pub task_assigned_to: String,
    /// Completion flag, set through `markcomplete`.
    pub is_completed: bool,
    /// Derived at read time: due date passed and not completed.
    #[serde(default)]
    pub is_over_due: bool,
}

impl Task {
    /// Whether the task is past due at `now` and still open.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.task_due_date < now
    }

    /// Mark the task as done.
    pub const fn mark_completed(&mut self) {
        self.is_completed = true;
        self.is_over_due = false;
    }

    /// Recompute the derived overdue flag against `now`.
    #[must_use]
    pub fn with_overdue_flag(mut self, now: DateTime<Utc>) -> Self {
        self.is_over_due = self.is_overdue_at(now);
        self
    }
}

/// Create payload for [`Task`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Short description.
    pub task_name: String,
    /// Owner.
    pub task_created_by: String,
    /// Deadline.
    pub task_due_date: DateTime<Utc>,
    /// Assignee address.
    pub task_assigned_to: String,
}

/// Update payload for [`Task`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Short description.
    pub task_name: String,
    /// Deadline.
    pub task_due_date: DateTime<Utc>,
    /// Assignee address.
    pub task_assigned_to: String,
}

impl Entity for Task {
    type Draft = NewTask;
    type Patch = TaskPatch;

    const COLLECTION: &'static str = "tasks";
    const FILTER_PARAM: &'static str = "createdBy";

    fn from_draft(id: EntityId, draft: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            task_id: id,
            task_name: draft.task_name,
            task_created_by: draft.task_created_by,
            task_created_on: now,
            task_updated_on: now,
            task_due_date: draft.task_due_date,
            task_assigned_to: draft.task_assigned_to,
            is_completed: false,
            is_over_due: false,
        }
    }

    fn apply_patch(&mut self, patch: TaskPatch) {
        self.task_name = patch.task_name;
        self.task_due_date = patch.task_due_date;
        self.task_assigned_to = patch.task_assigned_to;
    }

    fn id(&self) -> EntityId {
        self.task_id
    }

    fn filter_value(&self) -> &str {
        &self.task_created_by
    }

    fn created_on(&self) -> DateTime<Utc> {
        self.task_created_on
    }

    fn updated_on(&self) -> DateTime<Utc> {
        self.task_updated_on
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.task_updated_on = now;
    }

    fn for_read(self, now: DateTime<Utc>) -> Self {
        self.with_overdue_flag(now)
    }

    fn validate_draft(draft: &NewTask) -> ValidationResult {
        require("taskName", &draft.task_name)?;
        require("taskCreatedBy", &draft.task_created_by)?;
        validate_email("taskAssignedTo", &draft.task_assigned_to)
    }

    fn validate_patch(patch: &TaskPatch) -> ValidationResult {
        require("taskName", &patch.task_name)?;
        validate_email("taskAssignedTo", &patch.task_assigned_to)
    }
}
