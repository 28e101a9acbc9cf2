//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations talk to the hosted backend or, in tests, to memory.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::change::ChangeEvent;
use crate::domain::{DomainResult, Entity, NewWish, Owned, WishItem, WishPatch};

/// Read access for any Entity type
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// List all entities in display order
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;
}

/// Writes restricted to the entity's owner.
///
/// Update and delete carry the owner filter; a row that exists but belongs
/// to someone else is reported as `NotFound`.
#[async_trait]
pub trait OwnedRepository<T: Owned>: Repository<T> {
    type Draft: Send + Sync;
    type Patch: Send + Sync;

    async fn create(&self, draft: &Self::Draft) -> DomainResult<T>;

    async fn update_owned(&self, id: T::Id, owner_id: &str, patch: &Self::Patch) -> DomainResult<T>;

    async fn delete_owned(&self, id: T::Id, owner_id: &str) -> DomainResult<()>;
}

/// Everything the synchronizer needs from the wish table
pub trait WishRepository:
    OwnedRepository<WishItem, Draft = NewWish, Patch = WishPatch> + 'static
{
}

impl<R> WishRepository for R where
    R: OwnedRepository<WishItem, Draft = NewWish, Patch = WishPatch> + 'static
{
}

pub type ChangeReceiver = mpsc::UnboundedReceiver<ChangeEvent>;

/// Push channel of row-level changes
#[async_trait]
pub trait ChangeFeed: Send + Sync + 'static {
    /// Subscribe to every change of the wish table. The subscription lives
    /// as long as the receiver; dropping it tears the channel down.
    async fn subscribe(&self) -> DomainResult<ChangeReceiver>;
}
