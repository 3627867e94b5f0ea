//! Data models for Quire

mod attachment;
mod ids;
mod note;
mod record;
mod todo;

pub use attachment::{Attachment, AttachmentPatch, AttachmentUpload};
pub use ids::{ChildId, ParentId};
pub use note::{Note, NoteDraft};
pub use record::{ChildRecord, Completable, CreatePayload, Editable, ParentRecord};
pub use todo::{TodoItem, TodoItemDraft, TodoItemPatch, TodoList, TodoListDraft};
