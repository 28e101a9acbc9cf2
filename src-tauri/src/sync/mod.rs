//! Sync Layer
//!
//! Local wish-list state and the synchronizer that keeps it converged with
//! the remote table.

mod list;
mod snapshot;
mod synchronizer;


pub use list::{ListEvent, PendingWrite, WishEntry, WishList};
pub use snapshot::{MutationOutcome, WishListSnapshot, WishRow};
pub use synchronizer::ListSynchronizer;
