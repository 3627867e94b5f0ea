//! Remote collaborator seams used by the sync engine.

use std::future::Future;

use crate::models::{ChildId, ChildRecord, ParentId, ParentRecord};

use super::ApiResult;

/// CRUD over the children of one parent, e.g. `/todos/{id}/items`.
pub trait ChildRemote<C: ChildRecord>: Send + Sync {
    fn list_children(&self, parent_id: &ParentId)
        -> impl Future<Output = ApiResult<Vec<C>>> + Send;

    fn create_child(
        &self,
        parent_id: &ParentId,
        draft: &C::Draft,
    ) -> impl Future<Output = ApiResult<C>> + Send;

    fn update_child(
        &self,
        parent_id: &ParentId,
        id: &ChildId,
        patch: &C::Patch,
    ) -> impl Future<Output = ApiResult<C>> + Send;

    fn delete_child(
        &self,
        parent_id: &ParentId,
        id: &ChildId,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

/// CRUD over a parent collection, e.g. `/todos`.
pub trait ParentRemote<P: ParentRecord>: Send + Sync {
    fn list_parents(&self) -> impl Future<Output = ApiResult<Vec<P>>> + Send;

    fn create_parent(&self, draft: &P::Draft) -> impl Future<Output = ApiResult<P>> + Send;

    fn update_parent(
        &self,
        id: &ParentId,
        draft: &P::Draft,
    ) -> impl Future<Output = ApiResult<P>> + Send;

    fn delete_parent(&self, id: &ParentId) -> impl Future<Output = ApiResult<()>> + Send;
}
