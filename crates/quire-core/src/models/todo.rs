//! Todo list and todo item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChildId, ParentId};
use super::record::{ChildRecord, Completable, CreatePayload, Editable, ParentRecord};

/// A todo list with its checklist items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    /// Server identifier
    pub id: ParentId,
    /// List title
    pub title: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    /// Checklist items, when the server embeds them
    #[serde(default)]
    pub items: Vec<TodoItem>,
}

impl TodoList {
    /// Number of completed items
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    /// Number of items
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.items.len()
    }
}

/// Fields sent when creating or renaming a todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoListDraft {
    pub title: String,
}

impl TodoListDraft {
    pub fn new(title: impl Into<String>) -> crate::Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Todo list title cannot be empty".to_string(),
            ));
        }
        Ok(Self { title })
    }
}

impl ParentRecord for TodoList {
    type Child = TodoItem;
    type Draft = TodoListDraft;

    const COLLECTION: &'static str = "todos";

    fn id(&self) -> &ParentId {
        &self.id
    }

    fn children(&self) -> &[TodoItem] {
        &self.items
    }

    fn with_children(&self, children: Vec<TodoItem>) -> Self {
        Self {
            items: children,
            ..self.clone()
        }
    }
}

/// A checklist item on a todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Server identifier, or a temporary id while unconfirmed
    pub id: ChildId,
    /// Owning todo list
    pub todo_list_id: ParentId,
    /// Item text
    pub description: String,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Text of a todo item about to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoItemDraft {
    pub description: String,
}

impl TodoItemDraft {
    pub fn new(description: impl Into<String>) -> crate::Result<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Todo item description cannot be empty".to_string(),
            ));
        }
        Ok(Self { description })
    }
}

/// Partial update for a todo item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodoItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ChildRecord for TodoItem {
    type Draft = TodoItemDraft;
    type Patch = TodoItemPatch;

    const PARENT_COLLECTION: &'static str = "todos";
    const SEGMENT: &'static str = "items";
    const LABEL: &'static str = "Item";

    fn id(&self) -> &ChildId {
        &self.id
    }

    fn placeholder(id: ChildId, parent_id: &ParentId, draft: &TodoItemDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            todo_list_id: parent_id.clone(),
            description: draft.description.clone(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &TodoItemPatch) {
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    fn create_payload(draft: &TodoItemDraft) -> CreatePayload {
        CreatePayload::Json(serde_json::json!({ "description": draft.description }))
    }
}

impl Completable for TodoItem {
    fn is_completed(&self) -> bool {
        self.completed
    }

    fn completion_patch(completed: bool) -> TodoItemPatch {
        TodoItemPatch {
            completed: Some(completed),
            ..TodoItemPatch::default()
        }
    }
}

impl Editable for TodoItem {
    fn text_patch(text: String) -> TodoItemPatch {
        TodoItemPatch {
            description: Some(text),
            ..TodoItemPatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item(id: &str, completed: bool) -> TodoItem {
        TodoItem {
            completed,
            ..TodoItem::placeholder(ChildId::new(id), &ParentId::new("list"), &TodoItemDraft::new("x").unwrap())
        }
    }

    #[test]
    fn test_counts_follow_items() {
        let list = TodoList {
            id: ParentId::new("list"),
            title: "Groceries".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![item("1", true), item("2", false), item("3", true)],
        };
        assert_eq!(list.completed_count(), 2);
        assert_eq!(list.total_count(), 3);

        let emptied = list.with_children(Vec::new());
        assert_eq!(emptied.total_count(), 0);
        assert_eq!(emptied.title, "Groceries");
    }

    #[test]
    fn test_patch_is_shallow() {
        let mut todo = item("1", false);
        todo.apply_patch(&TodoItem::completion_patch(true));
        assert!(todo.completed);
        assert_eq!(todo.description, "x");

        todo.apply_patch(&TodoItem::text_patch("milk".to_string()));
        assert_eq!(todo.description, "milk");
        assert!(todo.completed);
    }

    #[test]
    fn test_patch_skips_absent_fields_on_the_wire() {
        let json = serde_json::to_value(TodoItem::completion_patch(false)).unwrap();
        assert_eq!(json, serde_json::json!({ "completed": false }));
    }

    #[test]
    fn test_item_deserializes_from_camel_case() {
        let parsed: TodoItem = serde_json::from_str(
            r#"{"id": 5, "todoListId": "l1", "description": "eggs", "completed": true}"#,
        )
        .unwrap();
        assert_eq!(parsed.id.as_str(), "5");
        assert_eq!(parsed.todo_list_id.as_str(), "l1");
        assert!(parsed.completed);
    }

    #[test]
    fn test_item_draft_rejects_blank_description() {
        assert!(TodoItemDraft::new(" \t ").is_err());
        let draft = TodoItemDraft::new(" eggs ").unwrap();
        assert_eq!(draft.description, "eggs");
        assert_eq!(
            TodoItem::create_payload(&draft),
            CreatePayload::Json(serde_json::json!({ "description": "eggs" }))
        );
    }

    #[test]
    fn test_list_draft_rejects_blank_title() {
        assert!(TodoListDraft::new("   ").is_err());
        assert_eq!(TodoListDraft::new(" Chores ").unwrap().title, "Chores");
    }
}
