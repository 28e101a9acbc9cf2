//! Repository Layer
//!
//! Data access abstractions and implementations.

mod auth;
mod change;
mod realtime;
mod supabase_repo;
mod traits;

#[cfg(test)]
pub mod memory;

#[cfg(test)]
mod tests;

pub use auth::{AuthClient, Authenticator, SignUpOutcome};
pub use change::ChangeEvent;
pub use realtime::RealtimeFeed;
pub use supabase_repo::SupabaseRepository;
pub use traits::{ChangeFeed, ChangeReceiver, OwnedRepository, Repository, WishRepository};
