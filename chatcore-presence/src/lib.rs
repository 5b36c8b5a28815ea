//! # chatcore-presence — session and ability caching
//!
//! Layers typed, TTL-aware session and permission caching on top of
//! [`chatcore_adapters::KvStore`] and [`chatcore_adapters::SqlStore`]. A
//! cache miss here never denies an operation on its own — [`AbilityCache`]
//! always falls back to the SQL store of record, which stays authoritative.

mod ability;
mod error;
mod session;

pub use ability::{Ability, AbilityCache};
pub use error::PresenceError;
pub use session::SessionCache;
