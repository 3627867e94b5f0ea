//! Apply-then-confirm-or-rollback for child mutations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::api::ChildRemote;
use crate::models::{ChildId, ChildRecord, Completable, Editable, ParentId};

use super::pending::PendingSet;
use super::store::EntityStore;
use super::{within, FetchError, MutationError, Notice, Outcome, Rejection, Settlement};

#[derive(Debug)]
struct Shared<C> {
    store: EntityStore<C>,
    pending: PendingSet,
    notices: Vec<Notice>,
}

impl<C: ChildRecord> Shared<C> {
    /// Refuse ids that are in flight or unknown, otherwise mark them pending.
    fn begin(&mut self, id: &ChildId) -> Result<(), Rejection> {
        if self.pending.is_pending(id) {
            return Err(Rejection::Pending);
        }
        if !self.store.contains(id) {
            return Err(Rejection::Missing);
        }
        self.pending.mark(id.clone());
        Ok(())
    }

    fn settle(&self, outcome: Outcome) -> Settlement<C> {
        Settlement {
            outcome,
            children: self.store.snapshot(),
        }
    }
}

/// Keeps an id pending until it is released under the lock.
///
/// Dropped unreleased (the mutation future was abandoned mid-call), it unmarks
/// the id and removes a placeholder it was guarding.
struct PendingGuard<C: ChildRecord> {
    shared: Arc<Mutex<Shared<C>>>,
    id: Option<ChildId>,
    placeholder: bool,
}

impl<C: ChildRecord> PendingGuard<C> {
    fn release(mut self, shared: &mut Shared<C>) {
        if let Some(id) = self.id.take() {
            shared.pending.unmark(&id);
        }
    }
}

impl<C: ChildRecord> Drop for PendingGuard<C> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        tracing::debug!("{} {} abandoned before it settled", C::LABEL, id);
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.pending.unmark(&id);
        if self.placeholder {
            shared.store.remove(&id);
        }
    }
}

/// Coordinates optimistic mutations of one parent's children.
///
/// Clones share the same store, so concurrent mutations of different ids can
/// be driven from separate tasks. The lock is never held across a remote
/// call; every reconciliation re-reads the store as it is at settlement.
pub struct MutationCoordinator<C, R> {
    parent_id: ParentId,
    remote: Arc<R>,
    shared: Arc<Mutex<Shared<C>>>,
    request_timeout: Duration,
}

impl<C, R> Clone for MutationCoordinator<C, R> {
    fn clone(&self) -> Self {
        Self {
            parent_id: self.parent_id.clone(),
            remote: Arc::clone(&self.remote),
            shared: Arc::clone(&self.shared),
            request_timeout: self.request_timeout,
        }
    }
}

impl<C: ChildRecord, R: ChildRemote<C>> MutationCoordinator<C, R> {
    pub fn new(parent_id: ParentId, remote: Arc<R>, request_timeout: Duration) -> Self {
        Self {
            parent_id,
            remote,
            shared: Arc::new(Mutex::new(Shared {
                store: EntityStore::new(),
                pending: PendingSet::new(),
                notices: Vec::new(),
            })),
            request_timeout,
        }
    }

    pub const fn parent_id(&self) -> &ParentId {
        &self.parent_id
    }

    fn lock(&self) -> MutexGuard<'_, Shared<C>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard(&self, id: &ChildId, placeholder: bool) -> PendingGuard<C> {
        PendingGuard {
            shared: Arc::clone(&self.shared),
            id: Some(id.clone()),
            placeholder,
        }
    }

    /// Whether `other` is a clone of this coordinator, sharing its store.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn children(&self) -> Vec<C> {
        self.lock().store.snapshot()
    }

    pub fn is_pending(&self, id: &ChildId) -> bool {
        self.lock().pending.is_pending(id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.lock().notices)
    }

    /// Fetch the child list without touching the store.
    pub async fn fetch(&self) -> Result<Vec<C>, FetchError> {
        within(
            self.request_timeout,
            self.remote.list_children(&self.parent_id),
            FetchError::TimedOut,
        )
        .await
    }

    /// Replace the store contents with a fetched list.
    pub fn install(&self, children: Vec<C>) {
        self.lock().store.replace_all(children);
    }

    /// Fetch and install the child list. On failure the store is unchanged.
    pub async fn load(&self) -> Result<Vec<C>, FetchError> {
        let children = self.fetch().await?;
        self.install(children.clone());
        Ok(children)
    }

    /// Add a child: show a placeholder at once, then swap in the server record.
    pub async fn create(&self, draft: C::Draft) -> Settlement<C> {
        let temp_id = ChildId::temporary();
        let guard = {
            let mut shared = self.lock();
            let placeholder = C::placeholder(temp_id.clone(), &self.parent_id, &draft);
            shared.store.apply_optimistic(placeholder);
            shared.pending.mark(temp_id.clone());
            self.guard(&temp_id, true)
        };
        tracing::debug!(
            "Creating {} under {} as {}",
            C::LABEL,
            self.parent_id,
            temp_id
        );

        let result = within(
            self.request_timeout,
            self.remote.create_child(&self.parent_id, &draft),
            MutationError::TimedOut,
        )
        .await;

        let mut shared = self.lock();
        guard.release(&mut shared);
        let outcome = match result {
            Ok(created) => {
                let created_id = created.id().clone();
                if shared.store.replace(&temp_id, created) {
                    tracing::info!("{} {} created", C::LABEL, created_id);
                    shared
                        .notices
                        .push(Notice::success(format!("{} added", C::LABEL)));
                    Outcome::Applied
                } else {
                    tracing::debug!(
                        "Placeholder {} left the store before {} was confirmed",
                        temp_id,
                        created_id
                    );
                    Outcome::Skipped
                }
            }
            Err(error) => {
                shared.store.remove(&temp_id);
                tracing::warn!("Failed to create {}: {}", C::LABEL, error);
                shared.notices.push(Notice::error(format!(
                    "Failed to add {}: {error}",
                    C::LABEL.to_lowercase()
                )));
                Outcome::Failed(error)
            }
        };
        shared.settle(outcome)
    }

    /// Delete a child once the server confirms. The entry stays visible (and
    /// pending) until then.
    pub async fn delete(&self, id: &ChildId) -> Settlement<C> {
        let guard = {
            let mut shared = self.lock();
            if let Err(rejection) = shared.begin(id) {
                return shared.settle(Outcome::Rejected(rejection));
            }
            self.guard(id, false)
        };
        tracing::debug!("Deleting {} {}", C::LABEL, id);

        let result = within(
            self.request_timeout,
            self.remote.delete_child(&self.parent_id, id),
            MutationError::TimedOut,
        )
        .await;

        let mut shared = self.lock();
        guard.release(&mut shared);
        let outcome = match result {
            Ok(()) => {
                if !shared.store.remove(id) {
                    tracing::debug!("{} {} was already gone after delete", C::LABEL, id);
                }
                shared
                    .notices
                    .push(Notice::success(format!("{} deleted", C::LABEL)));
                Outcome::Applied
            }
            Err(error) => {
                tracing::warn!("Failed to delete {} {}: {}", C::LABEL, id, error);
                shared.notices.push(Notice::error(format!(
                    "Failed to delete {}: {error}",
                    C::LABEL.to_lowercase()
                )));
                Outcome::Failed(error)
            }
        };
        shared.settle(outcome)
    }

    /// Write the server's copy of `id` back into the store, if it is still there.
    fn reconcile(shared: &mut Shared<C>, id: &ChildId, confirmed: C) -> Outcome {
        if shared.store.replace(id, confirmed) {
            Outcome::Applied
        } else {
            tracing::debug!("{} {} left the store before confirmation", C::LABEL, id);
            Outcome::Skipped
        }
    }
}

impl<C: Completable, R: ChildRemote<C>> MutationCoordinator<C, R> {
    /// Flip the completion flag locally, then confirm with the server.
    ///
    /// The id is pending while the call is in flight, so a second toggle of
    /// the same id is refused rather than racing the first.
    pub async fn toggle_completion(&self, id: &ChildId) -> Settlement<C> {
        let (guard, original) = {
            let mut shared = self.lock();
            if let Err(rejection) = shared.begin(id) {
                return shared.settle(Outcome::Rejected(rejection));
            }
            let original = shared
                .store
                .get(id)
                .is_some_and(Completable::is_completed);
            shared.store.patch(id, &C::completion_patch(!original));
            (self.guard(id, false), original)
        };
        tracing::debug!("Toggling {} {} to {}", C::LABEL, id, !original);

        let result = within(
            self.request_timeout,
            self.remote
                .update_child(&self.parent_id, id, &C::completion_patch(!original)),
            MutationError::TimedOut,
        )
        .await;

        let mut shared = self.lock();
        guard.release(&mut shared);
        let outcome = match result {
            Ok(confirmed) => {
                let outcome = Self::reconcile(&mut shared, id, confirmed);
                if matches!(outcome, Outcome::Applied) {
                    shared
                        .notices
                        .push(Notice::success(format!("{} updated", C::LABEL)));
                }
                outcome
            }
            Err(error) => {
                shared.store.patch(id, &C::completion_patch(original));
                tracing::warn!(
                    "Failed to toggle {} {}, restored flag to {}: {}",
                    C::LABEL,
                    id,
                    original,
                    error
                );
                shared.notices.push(Notice::error(format!(
                    "Failed to update {}: {error}",
                    C::LABEL.to_lowercase()
                )));
                Outcome::Failed(error)
            }
        };
        shared.settle(outcome)
    }
}

impl<C: Editable, R: ChildRemote<C>> MutationCoordinator<C, R> {
    /// Change the text of a child once the server confirms.
    ///
    /// Blank text means the user cleared the entry, which deletes it.
    pub async fn update_text(&self, id: &ChildId, text: &str) -> Settlement<C> {
        let text = text.trim();
        if text.is_empty() {
            return self.delete(id).await;
        }

        let guard = {
            let mut shared = self.lock();
            if let Err(rejection) = shared.begin(id) {
                return shared.settle(Outcome::Rejected(rejection));
            }
            self.guard(id, false)
        };
        tracing::debug!("Updating text of {} {}", C::LABEL, id);

        let result = within(
            self.request_timeout,
            self.remote
                .update_child(&self.parent_id, id, &C::text_patch(text.to_string())),
            MutationError::TimedOut,
        )
        .await;

        let mut shared = self.lock();
        guard.release(&mut shared);
        let outcome = match result {
            Ok(confirmed) => {
                let outcome = Self::reconcile(&mut shared, id, confirmed);
                if matches!(outcome, Outcome::Applied) {
                    shared
                        .notices
                        .push(Notice::success(format!("{} updated", C::LABEL)));
                }
                outcome
            }
            Err(error) => {
                tracing::warn!("Failed to update {} {}: {}", C::LABEL, id, error);
                shared.notices.push(Notice::error(format!(
                    "Failed to update {}: {error}",
                    C::LABEL.to_lowercase()
                )));
                Outcome::Failed(error)
            }
        };
        shared.settle(outcome)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::ApiError;
    use crate::models::{Attachment, AttachmentUpload, TodoItem, TodoItemDraft};
    use crate::sync::testing::{FakeRemote, Op};
    use crate::sync::NoticeLevel;

    const TIMEOUT: Duration = Duration::from_secs(30);

    type Items = MutationCoordinator<TodoItem, FakeRemote<TodoItem>>;

    fn seeded(items: &[(&str, &str, bool)]) -> (Arc<FakeRemote<TodoItem>>, Items) {
        let remote = Arc::new(FakeRemote::with_todo_items(items));
        let coordinator =
            MutationCoordinator::new(ParentId::new("list"), Arc::clone(&remote), TIMEOUT);
        (remote, coordinator)
    }

    async fn loaded(items: &[(&str, &str, bool)]) -> (Arc<FakeRemote<TodoItem>>, Items) {
        let (remote, coordinator) = seeded(items);
        coordinator.load().await.unwrap();
        (remote, coordinator)
    }

    fn descriptions(children: &[TodoItem]) -> Vec<&str> {
        children.iter().map(|item| item.description.as_str()).collect()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn load_failure_leaves_store_unchanged() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        remote.fail_next(Op::List);

        let error = coordinator.load().await.unwrap_err();
        assert!(matches!(error, FetchError::Api(ApiError::Status { status: 500, .. })));
        assert_eq!(descriptions(&coordinator.children()), vec!["milk"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_shows_placeholder_while_in_flight() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let release = remote.hold_next(Op::Create);

        let create = coordinator.create(TodoItemDraft::new("eggs").unwrap());
        let observe = async {
            tokio::task::yield_now().await;
            let children = coordinator.children();
            assert_eq!(descriptions(&children), vec!["milk", "eggs"]);
            assert!(children[1].id.is_temporary());
            assert!(coordinator.is_pending(&children[1].id));
            release.send(()).unwrap();
        };
        let (settlement, ()) = tokio::join!(create, observe);

        assert!(settlement.is_applied());
        assert_eq!(descriptions(&settlement.children), vec!["milk", "eggs"]);
        assert!(!settlement.children[1].id.is_temporary());
        assert_eq!(coordinator.pending_count(), 0);
        assert_eq!(
            coordinator.take_notices(),
            vec![Notice::success("Item added")]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_success_replaces_instead_of_duplicating() {
        let (_remote, coordinator) = loaded(&[]).await;

        let settlement = coordinator.create(TodoItemDraft::new("eggs").unwrap()).await;

        assert_eq!(settlement.children.len(), 1);
        assert!(settlement.children.iter().all(|item| !item.id.is_temporary()));
        assert_eq!(coordinator.children(), settlement.children);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_failure_rolls_back_exactly() {
        let (remote, coordinator) = loaded(&[("1", "milk", false), ("2", "bread", true)]).await;
        let before = coordinator.children();
        remote.fail_next(Op::Create);

        let settlement = coordinator.create(TodoItemDraft::new("eggs").unwrap()).await;

        assert!(matches!(settlement.outcome, Outcome::Failed(_)));
        assert_eq!(settlement.children, before);
        assert_eq!(coordinator.children(), before);
        assert_eq!(coordinator.pending_count(), 0);
        let notices = coordinator.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.starts_with("Failed to add item"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_confirmation_after_reload_is_skipped_silently() {
        let (remote, coordinator) = loaded(&[]).await;
        let release = remote.hold_next(Op::Create);

        let create = coordinator.create(TodoItemDraft::new("eggs").unwrap());
        let reload = async {
            tokio::task::yield_now().await;
            coordinator.install(Vec::new());
            release.send(()).unwrap();
        };
        let (settlement, ()) = tokio::join!(create, reload);

        assert!(matches!(settlement.outcome, Outcome::Skipped));
        assert!(!settlement.should_notify());
        assert!(coordinator.children().is_empty());
        assert_eq!(coordinator.pending_count(), 0);
        assert!(coordinator.take_notices().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn toggle_failure_restores_original_flag() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let release = remote.hold_and_fail_next(Op::Update);
        let id = ChildId::new("1");

        let toggle = coordinator.toggle_completion(&id);
        let observe = async {
            tokio::task::yield_now().await;
            assert!(coordinator.children()[0].completed);
            release.send(()).unwrap();
        };
        let (settlement, ()) = tokio::join!(toggle, observe);

        assert!(matches!(settlement.outcome, Outcome::Failed(_)));
        assert!(!settlement.children[0].completed);
        assert!(!coordinator.is_pending(&id));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn toggle_success_takes_server_fields() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        remote.rename_on_server("1", "milk (2%)");

        let settlement = coordinator.toggle_completion(&ChildId::new("1")).await;

        assert!(settlement.is_applied());
        assert!(settlement.children[0].completed);
        assert_eq!(settlement.children[0].description, "milk (2%)");
        assert_eq!(remote.calls(Op::Update), 1);
        assert_eq!(
            coordinator.take_notices(),
            vec![Notice::success("Item updated")]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn abandoned_mutations_do_not_stay_pending() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let _held_toggle = remote.hold_next(Op::Update);
        let _held_create = remote.hold_next(Op::Create);
        let id = ChildId::new("1");

        tokio::select! {
            biased;
            _ = coordinator.toggle_completion(&id) => panic!("toggle should still be in flight"),
            () = tokio::task::yield_now() => {}
        }
        let draft = TodoItemDraft::new("eggs").unwrap();
        tokio::select! {
            biased;
            _ = coordinator.create(draft) => panic!("create should still be in flight"),
            () = tokio::task::yield_now() => {}
        }

        assert_eq!(coordinator.pending_count(), 0);
        assert_eq!(coordinator.children().len(), 1);
        assert!(coordinator.toggle_completion(&id).await.is_applied());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn double_toggle_while_in_flight_is_refused() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let release = remote.hold_next(Op::Update);
        let id = ChildId::new("1");

        let first = coordinator.toggle_completion(&id);
        let second = async {
            tokio::task::yield_now().await;
            let settlement = coordinator.toggle_completion(&id).await;
            release.send(()).unwrap();
            settlement
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_applied());
        assert!(matches!(second.outcome, Outcome::Rejected(Rejection::Pending)));
        assert!(coordinator.children()[0].completed);
        assert_eq!(remote.calls(Op::Update), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn pending_ids_refuse_toggle_and_delete_without_calls() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let release = remote.hold_next(Op::Create);

        let create = coordinator.create(TodoItemDraft::new("eggs").unwrap());
        let poke = async {
            tokio::task::yield_now().await;
            let temp_id = coordinator.children()[1].id.clone();
            let before = coordinator.children();

            let toggled = coordinator.toggle_completion(&temp_id).await;
            let deleted = coordinator.delete(&temp_id).await;
            assert!(matches!(toggled.outcome, Outcome::Rejected(Rejection::Pending)));
            assert!(matches!(deleted.outcome, Outcome::Rejected(Rejection::Pending)));
            assert_eq!(coordinator.children(), before);
            release.send(()).unwrap();
        };
        tokio::join!(create, poke);

        assert_eq!(remote.calls(Op::Update), 0);
        assert_eq!(remote.calls(Op::Delete), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unknown_ids_are_refused() {
        let (remote, coordinator) = loaded(&[]).await;

        let settlement = coordinator.delete(&ChildId::new("ghost")).await;

        assert!(matches!(settlement.outcome, Outcome::Rejected(Rejection::Missing)));
        assert_eq!(remote.calls(Op::Delete), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_waits_for_confirmation() {
        let (remote, coordinator) = loaded(&[("1", "milk", false), ("2", "bread", false)]).await;
        let release = remote.hold_next(Op::Delete);
        let id = ChildId::new("1");

        let delete = coordinator.delete(&id);
        let observe = async {
            tokio::task::yield_now().await;
            assert_eq!(coordinator.children().len(), 2);
            assert!(coordinator.is_pending(&id));
            release.send(()).unwrap();
        };
        let (settlement, ()) = tokio::join!(delete, observe);

        assert!(settlement.is_applied());
        assert_eq!(descriptions(&settlement.children), vec!["bread"]);
        assert_eq!(
            coordinator.take_notices(),
            vec![Notice::success("Item deleted")]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_failure_keeps_entity() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        remote.fail_next(Op::Delete);

        let settlement = coordinator.delete(&ChildId::new("1")).await;

        assert!(settlement.error().is_some());
        assert_eq!(descriptions(&settlement.children), vec!["milk"]);
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn blank_text_deletes_the_entity() {
        let (remote, coordinator) = loaded(&[("x", "milk", false), ("y", "eggs", false)]).await;

        let settlement = coordinator.update_text(&ChildId::new("x"), "   ").await;

        assert!(settlement.is_applied());
        assert!(coordinator.children().iter().all(|item| item.id.as_str() != "x"));
        assert_eq!(remote.calls(Op::Delete), 1);
        assert_eq!(remote.calls(Op::Update), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn text_edit_applies_only_after_confirmation() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let release = remote.hold_next(Op::Update);
        let id = ChildId::new("1");

        let update = coordinator.update_text(&id, "  oat milk ");
        let observe = async {
            tokio::task::yield_now().await;
            assert_eq!(coordinator.children()[0].description, "milk");
            release.send(()).unwrap();
        };
        let (settlement, ()) = tokio::join!(update, observe);

        assert!(settlement.is_applied());
        assert_eq!(settlement.children[0].description, "oat milk");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn text_edit_failure_leaves_store_unchanged() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        remote.fail_next(Op::Update);

        let settlement = coordinator.update_text(&ChildId::new("1"), "oat milk").await;

        assert!(settlement.error().is_some());
        assert_eq!(descriptions(&settlement.children), vec!["milk"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn slow_delete_does_not_clobber_fast_toggle() {
        let (remote, coordinator) = loaded(&[("a", "milk", false), ("b", "eggs", false)]).await;
        let release_delete = remote.hold_next(Op::Delete);
        let a = ChildId::new("a");
        let b = ChildId::new("b");

        let delete_a = coordinator.delete(&a);
        let toggle_b = async {
            tokio::task::yield_now().await;
            let settlement = coordinator.toggle_completion(&b).await;
            release_delete.send(()).unwrap();
            settlement
        };
        let (deleted, toggled) = tokio::join!(delete_a, toggle_b);

        assert!(toggled.is_applied());
        assert!(deleted.is_applied());
        let children = coordinator.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, b);
        assert!(children[0].completed);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fast_delete_does_not_clobber_slow_toggle() {
        let (remote, coordinator) = loaded(&[("a", "milk", false), ("b", "eggs", false)]).await;
        let release_toggle = remote.hold_next(Op::Update);
        let a = ChildId::new("a");
        let b = ChildId::new("b");

        let toggle_b = coordinator.toggle_completion(&b);
        let delete_a = async {
            tokio::task::yield_now().await;
            let settlement = coordinator.delete(&a).await;
            release_toggle.send(()).unwrap();
            settlement
        };
        let (toggled, deleted) = tokio::join!(toggle_b, delete_a);

        assert!(toggled.is_applied());
        assert!(deleted.is_applied());
        let children = coordinator.children();
        assert_eq!(children.len(), 1);
        assert!(children[0].completed);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn pending_set_drains_after_mixed_outcomes() {
        let (remote, coordinator) =
            loaded(&[("a", "milk", false), ("b", "eggs", false), ("c", "jam", false)]).await;
        remote.fail_next(Op::Create);
        remote.fail_next(Op::Delete);
        let hold_create = remote.hold_next(Op::Create);

        let b = ChildId::new("b");
        let c = ChildId::new("c");
        let (first, second, third, fourth, ()) = tokio::join!(
            coordinator.create(TodoItemDraft::new("bread").unwrap()),
            coordinator.create(TodoItemDraft::new("butter").unwrap()),
            coordinator.delete(&b),
            coordinator.delete(&c),
            async {
                tokio::task::yield_now().await;
                hold_create.send(()).unwrap();
            },
        );

        assert!(first.error().is_some());
        assert!(second.is_applied());
        assert!(third.error().is_some());
        assert!(fourth.is_applied());
        assert_eq!(coordinator.pending_count(), 0);
        assert_eq!(
            descriptions(&coordinator.children()),
            vec!["milk", "eggs", "butter"]
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn hung_requests_time_out_and_roll_back() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        let _never_released = remote.hold_next(Op::Update);
        let id = ChildId::new("1");

        let settlement = coordinator.toggle_completion(&id).await;

        assert!(matches!(
            settlement.error(),
            Some(MutationError::TimedOut(limit)) if *limit == TIMEOUT
        ));
        assert!(!settlement.children[0].completed);
        assert!(!coordinator.is_pending(&id));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unauthorized_failures_are_flagged() {
        let (remote, coordinator) = loaded(&[("1", "milk", false)]).await;
        remote.fail_next_with(Op::Delete, ApiError::Unauthorized);

        let settlement = coordinator.delete(&ChildId::new("1")).await;

        assert!(settlement.session_expired());
        assert_eq!(settlement.children.len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn attachments_upload_through_the_same_protocol() {
        let remote = Arc::new(FakeRemote::<Attachment>::new());
        let coordinator =
            MutationCoordinator::new(ParentId::new("note"), Arc::clone(&remote), TIMEOUT);
        let upload = AttachmentUpload::new("scan.pdf", "", vec![1, 2, 3]).unwrap();

        let created = coordinator.create(upload).await;
        assert!(created.is_applied());
        assert_eq!(created.children[0].file_name, "scan.pdf");
        assert_eq!(created.children[0].content_type, "application/pdf");

        let id = created.children[0].id.clone();
        let deleted = coordinator.delete(&id).await;
        assert!(deleted.is_applied());
        assert!(deleted.children.is_empty());
        assert_eq!(
            coordinator.take_notices(),
            vec![
                Notice::success("Attachment added"),
                Notice::success("Attachment deleted")
            ]
        );
    }
}
