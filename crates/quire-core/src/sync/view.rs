//! Controller for the children of one open parent (a todo list's items, a
//! note's attachments).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::api::ChildRemote;
use crate::error::{Error, Result};
use crate::models::{ChildId, ChildRecord, Completable, Editable, ParentId, ParentRecord};
use crate::state::LoadState;

use super::coordinator::MutationCoordinator;
use super::notifier::{FetchGuard, ParentNotifier};
use super::{Notice, Settlement};

struct ViewInner<P: ParentRecord, R> {
    coordinator: Option<MutationCoordinator<P::Child, R>>,
    /// Coordinators of parents left while calls were still in flight.
    in_flight: HashMap<ParentId, MutationCoordinator<P::Child, R>>,
    notifier: ParentNotifier<P>,
    guard: FetchGuard,
    load_state: LoadState,
    load_request: u64,
}

impl<P: ParentRecord, R: ChildRemote<P::Child>> ViewInner<P, R> {
    fn target(&self) -> Option<&ParentId> {
        self.coordinator.as_ref().map(MutationCoordinator::parent_id)
    }

    fn is_current(&self, coordinator: &MutationCoordinator<P::Child, R>) -> bool {
        self.coordinator
            .as_ref()
            .is_some_and(|current| current.same_as(coordinator))
    }

    /// Switch to `parent_id`, parking the current coordinator if it still has
    /// calls in flight and resuming a parked one for `parent_id`.
    fn retarget(&mut self, parent_id: &ParentId, remote: &Arc<R>, request_timeout: Duration) {
        if let Some(previous) = self.coordinator.take() {
            if previous.pending_count() > 0 {
                self.in_flight.insert(previous.parent_id().clone(), previous);
            }
        }
        self.in_flight
            .retain(|_, coordinator| coordinator.pending_count() > 0);
        let coordinator = self.in_flight.remove(parent_id).unwrap_or_else(|| {
            MutationCoordinator::new(parent_id.clone(), Arc::clone(remote), request_timeout)
        });
        self.coordinator = Some(coordinator);
    }
}

/// Child-list view state for one parent at a time.
///
/// Each mutation settles through a [`MutationCoordinator`] and the reconciled
/// list is then handed to the [`ParentNotifier`] once. Feeding that parent
/// back through [`ChildListView::receive_parent`] never refetches.
pub struct ChildListView<P: ParentRecord, R> {
    remote: Arc<R>,
    request_timeout: Duration,
    inner: Mutex<ViewInner<P, R>>,
}

impl<P, R> ChildListView<P, R>
where
    P: ParentRecord,
    R: ChildRemote<P::Child>,
{
    pub fn new(remote: Arc<R>, request_timeout: Duration, notifier: ParentNotifier<P>) -> Self {
        Self {
            remote,
            request_timeout,
            inner: Mutex::new(ViewInner {
                coordinator: None,
                in_flight: HashMap::new(),
                notifier,
                guard: FetchGuard::new(),
                load_state: LoadState::Idle,
                load_request: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner<P, R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn coordinator(&self) -> Result<MutationCoordinator<P::Child, R>> {
        self.lock().coordinator.clone().ok_or(Error::NoActiveParent)
    }

    /// Show `parent`, fetching its children unless they are already loaded.
    pub async fn open(&self, parent: P) -> Result<()> {
        let needs_fetch = {
            let mut inner = self.lock();
            let parent_id = parent.id().clone();
            if inner.target() != Some(&parent_id) {
                tracing::debug!("Child view now targets {} {}", P::COLLECTION, parent_id);
                inner.retarget(&parent_id, &self.remote, self.request_timeout);
                inner.guard.invalidate();
                inner.load_request += 1;
                inner.load_state = LoadState::Idle;
            }
            inner.notifier.set_parent(parent);
            inner.guard.needs_fetch(&parent_id)
        };

        if needs_fetch {
            self.load().await
        } else {
            Ok(())
        }
    }

    /// Accept a parent pushed down from the owning view.
    ///
    /// The same parent id only refreshes the snapshot used for deliveries; a
    /// different id retargets the view.
    pub async fn receive_parent(&self, parent: P) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.target() == Some(parent.id()) {
                inner.notifier.set_parent(parent);
                return Ok(());
            }
        }
        self.open(parent).await
    }

    /// Manual "try again": refetch even if the last fetch succeeded.
    pub async fn retry(&self) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.coordinator.is_none() {
                return Err(Error::NoActiveParent);
            }
            inner.guard.invalidate();
        }
        self.load().await
    }

    async fn load(&self) -> Result<()> {
        let (coordinator, request) = {
            let mut inner = self.lock();
            let coordinator = inner.coordinator.clone().ok_or(Error::NoActiveParent)?;
            inner.load_request += 1;
            inner.load_state = LoadState::Loading;
            (coordinator, inner.load_request)
        };

        let result = coordinator.fetch().await;

        let mut inner = self.lock();
        if inner.load_request != request {
            tracing::debug!(
                "Discarding stale child list for {}",
                coordinator.parent_id()
            );
            return Ok(());
        }
        match result {
            Ok(children) => {
                tracing::debug!(
                    "Loaded {} children for {}",
                    children.len(),
                    coordinator.parent_id()
                );
                coordinator.install(children);
                inner.guard.record(coordinator.parent_id().clone());
                inner.load_state = LoadState::Loaded;
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    "Failed to load children for {}: {}",
                    coordinator.parent_id(),
                    error
                );
                inner.load_state = LoadState::Failed(error.to_string());
                Err(error.into())
            }
        }
    }

    /// Forward a settled child list to the parent, once.
    ///
    /// Settlements from a coordinator the view has since moved away from are
    /// dropped.
    fn deliver(
        &self,
        coordinator: &MutationCoordinator<P::Child, R>,
        settlement: &Settlement<P::Child>,
    ) {
        if !settlement.should_notify() {
            return;
        }
        let mut inner = self.lock();
        if !inner.is_current(coordinator) {
            tracing::debug!(
                "Dropping settlement for {}; view moved on",
                coordinator.parent_id()
            );
            return;
        }
        inner.notifier.settle(settlement.children.clone());
    }

    pub async fn create(
        &self,
        draft: <P::Child as ChildRecord>::Draft,
    ) -> Result<Settlement<P::Child>> {
        let coordinator = self.coordinator()?;
        let settlement = coordinator.create(draft).await;
        self.deliver(&coordinator, &settlement);
        Ok(settlement)
    }

    pub async fn delete(&self, id: &ChildId) -> Result<Settlement<P::Child>> {
        let coordinator = self.coordinator()?;
        let settlement = coordinator.delete(id).await;
        self.deliver(&coordinator, &settlement);
        Ok(settlement)
    }

    pub fn children(&self) -> Vec<P::Child> {
        self.lock()
            .coordinator
            .as_ref()
            .map(MutationCoordinator::children)
            .unwrap_or_default()
    }

    pub fn is_pending(&self, id: &ChildId) -> bool {
        self.lock()
            .coordinator
            .as_ref()
            .is_some_and(|coordinator| coordinator.is_pending(id))
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state.clone()
    }

    pub fn parent(&self) -> Option<P> {
        self.lock().notifier.parent().cloned()
    }

    /// Drain toasts queued by mutations on the current parent.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.lock()
            .coordinator
            .as_ref()
            .map(MutationCoordinator::take_notices)
            .unwrap_or_default()
    }
}

impl<P, R> ChildListView<P, R>
where
    P: ParentRecord,
    P::Child: Completable,
    R: ChildRemote<P::Child>,
{
    pub async fn toggle_completion(&self, id: &ChildId) -> Result<Settlement<P::Child>> {
        let coordinator = self.coordinator()?;
        let settlement = coordinator.toggle_completion(id).await;
        self.deliver(&coordinator, &settlement);
        Ok(settlement)
    }
}

impl<P, R> ChildListView<P, R>
where
    P: ParentRecord,
    P::Child: Editable,
    R: ChildRemote<P::Child>,
{
    pub async fn update_text(&self, id: &ChildId, text: &str) -> Result<Settlement<P::Child>> {
        let coordinator = self.coordinator()?;
        let settlement = coordinator.update_text(id, text).await;
        self.deliver(&coordinator, &settlement);
        Ok(settlement)
    }
}
