//! Read-only collection lookup used by the generation core.

use crate::error::Result;
use crate::index::CollectionIndex;
use crate::types::{CollectionId, CollectionRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of collection records (parent link plus member titles).
///
/// The exclusion set builder only ever reads through this trait, so a
/// database-backed store can replace the in-memory index without touching
/// the generation pipeline.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Fetch one collection, or `None` if it does not exist
    async fn get_collection(&self, id: CollectionId) -> Result<Option<CollectionRecord>>;
}

#[async_trait]
impl CollectionStore for CollectionIndex {
    async fn get_collection(&self, id: CollectionId) -> Result<Option<CollectionRecord>> {
        Ok(self.get(id).cloned())
    }
}

#[async_trait]
impl<S: CollectionStore + ?Sized> CollectionStore for Arc<S> {
    async fn get_collection(&self, id: CollectionId) -> Result<Option<CollectionRecord>> {
        (**self).get_collection(id).await
    }
}
