//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::ids::ParentId;
use super::record::ParentRecord;

/// A note with its file attachments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Server identifier
    pub id: ParentId,
    /// Note title
    pub title: String,
    /// Plain text content
    #[serde(default)]
    pub content: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    /// Attachments, when the server embeds them
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Note {
    /// Get first line of the content, truncated to `max_len` characters
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Fields sent when creating or updating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> crate::Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Note title cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            title,
            content: content.into(),
        })
    }
}

impl ParentRecord for Note {
    type Child = Attachment;
    type Draft = NoteDraft;

    const COLLECTION: &'static str = "notes";

    fn id(&self) -> &ParentId {
        &self.id
    }

    fn children(&self) -> &[Attachment] {
        &self.attachments
    }

    fn with_children(&self, children: Vec<Attachment>) -> Self {
        Self {
            attachments: children,
            ..self.clone()
        }
    }
}
