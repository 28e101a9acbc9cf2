//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has no I/O; serde and chrono only.

mod entity;
mod identity;
mod wish;

pub use entity::{DomainError, DomainResult, Entity, Owned};
pub use identity::{Identity, Session};
pub use wish::{newest_first, NewWish, WishId, WishItem, WishPatch};
