//! Record traits shared by todo lists/items and notes/attachments.
//!
//! A [`ParentRecord`] owns a collection of [`ChildRecord`]s logically, while
//! the server persists each child independently under the parent's path.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ids::{ChildId, ParentId};

/// Request body for creating a child record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePayload {
    /// JSON body, e.g. `{"description": "..."}`.
    Json(serde_json::Value),
    /// Multipart upload with a single `file` part.
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// A record that owns child records (todo list, note).
pub trait ParentRecord:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Child: ChildRecord;
    /// Fields sent when creating or updating the parent.
    type Draft: fmt::Debug + Serialize + Send + Sync;

    /// Collection path segment, e.g. `todos`.
    const COLLECTION: &'static str;

    fn id(&self) -> &ParentId;

    fn children(&self) -> &[Self::Child];

    /// Copy of this record with its children replaced.
    #[must_use]
    fn with_children(&self, children: Vec<Self::Child>) -> Self;
}

/// A record persisted under a parent (todo item, attachment).
pub trait ChildRecord:
    Clone + fmt::Debug + PartialEq + DeserializeOwned + Send + Sync + 'static
{
    /// Input used to create the child.
    type Draft: fmt::Debug + Send + Sync;
    /// Partial update; fields left `None` are untouched.
    type Patch: fmt::Debug + Clone + Serialize + Send + Sync;

    /// Collection of the owning parent, e.g. `todos`.
    const PARENT_COLLECTION: &'static str;
    /// Child path segment under the parent, e.g. `items`.
    const SEGMENT: &'static str;
    /// Human label used in notifications, e.g. `Item`.
    const LABEL: &'static str;

    fn id(&self) -> &ChildId;

    /// Build the locally visible stand-in shown until the server confirms.
    fn placeholder(id: ChildId, parent_id: &ParentId, draft: &Self::Draft) -> Self;

    /// Shallow-merge the set fields of `patch` into this record.
    fn apply_patch(&mut self, patch: &Self::Patch);

    fn create_payload(draft: &Self::Draft) -> CreatePayload;
}

/// A child carrying a completion flag.
pub trait Completable: ChildRecord {
    fn is_completed(&self) -> bool;

    fn completion_patch(completed: bool) -> Self::Patch;
}

/// A child with a single editable text field.
pub trait Editable: ChildRecord {
    fn text_patch(text: String) -> Self::Patch;
}
