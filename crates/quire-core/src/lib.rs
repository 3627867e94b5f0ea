//! quire-core - Core library for Quire
//!
//! This crate contains the shared models, the REST API client, and the
//! optimistic sync engine that keeps todo items and note attachments in step
//! with the remote workspace API.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    Attachment, AttachmentUpload, ChildId, Note, ParentId, TodoItem, TodoList,
};
