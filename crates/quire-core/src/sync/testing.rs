//! In-memory stand-in for the workspace API.
//!
//! Each call consumes the next scripted behaviour for its operation, if any:
//! it can be held open until a `oneshot` sender fires and/or fail. Unscripted
//! calls succeed immediately against the fake server's own copy of the list.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::api::{ApiError, ApiResult, ChildRemote};
use crate::models::{ChildId, ChildRecord, ParentId, TodoItem, TodoItemDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct Script {
    gate: Option<oneshot::Receiver<()>>,
    failure: Option<ApiError>,
}

struct FakeState<C> {
    children: Vec<C>,
    scripts: HashMap<Op, VecDeque<Script>>,
    calls: HashMap<Op, usize>,
}

pub struct FakeRemote<C> {
    state: Mutex<FakeState<C>>,
    next_id: AtomicU64,
}

impl<C: ChildRecord> FakeRemote<C> {
    pub fn new() -> Self {
        Self::with_children(Vec::new())
    }

    pub fn with_children(children: Vec<C>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                children,
                scripts: HashMap::new(),
                calls: HashMap::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState<C>> {
        self.state.lock().unwrap()
    }

    fn push(&self, op: Op, script: Script) {
        self.lock().scripts.entry(op).or_default().push_back(script);
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    pub fn fail_next(&self, op: Op) {
        self.fail_next_with(op, Self::server_error());
    }

    pub fn fail_next_with(&self, op: Op, error: ApiError) {
        self.push(
            op,
            Script {
                gate: None,
                failure: Some(error),
            },
        );
    }

    /// Hold the next `op` call open until the returned sender fires.
    pub fn hold_next(&self, op: Op) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.push(
            op,
            Script {
                gate: Some(receiver),
                failure: None,
            },
        );
        sender
    }

    /// Hold the next `op` call open, then fail it.
    pub fn hold_and_fail_next(&self, op: Op) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.push(
            op,
            Script {
                gate: Some(receiver),
                failure: Some(Self::server_error()),
            },
        );
        sender
    }

    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn server_children(&self) -> Vec<C> {
        self.lock().children.clone()
    }

    async fn enter(&self, op: Op) -> ApiResult<()> {
        let script = {
            let mut state = self.lock();
            *state.calls.entry(op).or_default() += 1;
            state
                .scripts
                .get_mut(&op)
                .and_then(VecDeque::pop_front)
                .unwrap_or_default()
        };
        if let Some(gate) = script.gate {
            let _ = gate.await;
        }
        script.failure.map_or(Ok(()), Err)
    }
}

impl FakeRemote<TodoItem> {
    pub fn with_todo_items(items: &[(&str, &str, bool)]) -> Self {
        let parent_id = ParentId::new("list");
        Self::with_children(
            items
                .iter()
                .map(|(id, description, completed)| TodoItem {
                    completed: *completed,
                    ..TodoItem::placeholder(
                        ChildId::new(*id),
                        &parent_id,
                        &TodoItemDraft {
                            description: (*description).to_string(),
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn rename_on_server(&self, id: &str, description: &str) {
        let mut state = self.lock();
        if let Some(item) = state.children.iter_mut().find(|item| item.id.as_str() == id) {
            item.description = description.to_string();
        }
    }
}

fn not_found(id: &ChildId) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{id} not found"),
    }
}

impl<C: ChildRecord> ChildRemote<C> for FakeRemote<C> {
    async fn list_children(&self, _parent_id: &ParentId) -> ApiResult<Vec<C>> {
        self.enter(Op::List).await?;
        Ok(self.lock().children.clone())
    }

    async fn create_child(&self, parent_id: &ParentId, draft: &C::Draft) -> ApiResult<C> {
        self.enter(Op::Create).await?;
        let id = ChildId::new(format!(
            "srv-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        let created = C::placeholder(id, parent_id, draft);
        self.lock().children.push(created.clone());
        Ok(created)
    }

    async fn update_child(
        &self,
        _parent_id: &ParentId,
        id: &ChildId,
        patch: &C::Patch,
    ) -> ApiResult<C> {
        self.enter(Op::Update).await?;
        let mut state = self.lock();
        let child = state
            .children
            .iter_mut()
            .find(|child| child.id() == id)
            .ok_or_else(|| not_found(id))?;
        child.apply_patch(patch);
        Ok(child.clone())
    }

    async fn delete_child(&self, _parent_id: &ParentId, id: &ChildId) -> ApiResult<()> {
        self.enter(Op::Delete).await?;
        let mut state = self.lock();
        let before = state.children.len();
        state.children.retain(|child| child.id() != id);
        if state.children.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}
