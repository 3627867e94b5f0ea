//! Attachment model

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::ids::{ChildId, ParentId};
use super::record::{ChildRecord, CreatePayload};

/// File attachment metadata for a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Server identifier, or a temporary id while the upload is in flight.
    pub id: ChildId,
    /// Parent note identifier.
    pub note_id: ParentId,
    /// Original file name.
    pub file_name: String,
    /// Content MIME type.
    #[serde(default)]
    pub content_type: String,
    /// Attachment size in bytes.
    #[serde(default)]
    pub size_bytes: u64,
    /// Download URL, once the server has stored the file.
    #[serde(default)]
    pub url: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// A file waiting to be uploaded as an attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for AttachmentUpload {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AttachmentUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl AttachmentUpload {
    /// Create an upload from in-memory bytes.
    ///
    /// An empty content type falls back to a guess from the file name.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let file_name = file_name.into().trim().to_string();
        if file_name.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment file name cannot be empty".to_string(),
            ));
        }

        let content_type = content_type.into().trim().to_string();
        let content_type = if content_type.is_empty() {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        } else {
            content_type
        };

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("{} has no usable file name", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        Self::new(file_name, "", bytes)
    }
}

/// Partial update for an attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ChildRecord for Attachment {
    type Draft = AttachmentUpload;
    type Patch = AttachmentPatch;

    const PARENT_COLLECTION: &'static str = "notes";
    const SEGMENT: &'static str = "attachments";
    const LABEL: &'static str = "Attachment";

    fn id(&self) -> &ChildId {
        &self.id
    }

    fn placeholder(id: ChildId, parent_id: &ParentId, draft: &AttachmentUpload) -> Self {
        Self {
            id,
            note_id: parent_id.clone(),
            file_name: draft.file_name.clone(),
            content_type: draft.content_type.clone(),
            size_bytes: draft.bytes.len() as u64,
            url: None,
            created_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, patch: &AttachmentPatch) {
        if let Some(file_name) = &patch.file_name {
            self.file_name.clone_from(file_name);
        }
    }

    fn create_payload(draft: &AttachmentUpload) -> CreatePayload {
        CreatePayload::File {
            file_name: draft.file_name.clone(),
            content_type: draft.content_type.clone(),
            bytes: draft.bytes.clone(),
        }
    }
}
