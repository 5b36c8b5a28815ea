//! # chatcore-adapters — external collaborator boundaries
//!
//! Narrow `async_trait` interfaces around the two stateful systems the
//! actor fabric depends on but never reaches past: the Postgres store of
//! record ([`SqlStore`]) and the Redis-protocol presence/ability cache
//! ([`KvStore`]). Both traits are object-safe and `Send + Sync` so
//! `chatcore-hub` and `chatcore-presence` can hold them as
//! `Arc<dyn SqlStore>` / `Arc<dyn KvStore>` without knowing the concrete
//! client.

mod error;
mod kv_store;
mod sql_store;
mod types;

pub use error::StoreError;
pub use kv_store::{KvHealth, KvStore, RedisKvStore, ABILITY_TTL, PRESENCE_CHANNEL, SESSION_TTL};
pub use sql_store::{PgSqlStore, SqlStore};
pub use types::ChannelSeed;

pub mod testing {
    pub use crate::kv_store::testing::InMemoryKvStore;
    pub use crate::sql_store::testing::InMemorySqlStore;
}
