use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::StoreError;
use crate::types::ChannelSeed;

/// The SQL store of record. A production implementation is backed by a
/// connection-pooled, thread-safe client; query bodies beyond the seven
/// operations below (validation, joins, auth) are out of scope here — this
/// trait is the narrow boundary the actor fabric reaches through, never a
/// concrete SQL driver.
#[async_trait]
pub trait SqlStore: Send + Sync {
    async fn user_servers(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
    async fn user_friends(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
    async fn user_roles(&self, user_id: &str, server_id: &str) -> Result<Vec<String>, StoreError>;
    async fn all_server_ids(&self) -> Result<Vec<String>, StoreError>;
    async fn server_channels(&self, server_id: &str) -> Result<Vec<ChannelSeed>, StoreError>;
    async fn message_author(&self, message_id: &str) -> Result<String, StoreError>;
    async fn server_abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, StoreError>;
}

/// A connection-pooled Postgres-backed [`SqlStore`].
pub struct PgSqlStore {
    pool: sqlx::PgPool,
}

impl PgSqlStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on
    /// any early return — never held open across an actor boundary.
    pub async fn with_tx<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut sqlx::PgConnection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl SqlStore for PgSqlStore {
    async fn user_servers(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT server_id FROM server_members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn user_friends(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT CASE WHEN user_a = $1 THEN user_b ELSE user_a END \
             FROM friendships WHERE user_a = $1 OR user_b = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn user_roles(&self, user_id: &str, server_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT role_id FROM role_members WHERE user_id = $1 AND server_id = $2",
        )
        .bind(user_id)
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn all_server_ids(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM servers")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn server_channels(&self, server_id: &str) -> Result<Vec<ChannelSeed>, StoreError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT id, category_id FROM channels WHERE server_id = $1",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        let mut seeds = Vec::with_capacity(rows.len());
        for (id, category_id) in rows {
            let users: Vec<(String,)> = sqlx::query_as(
                "SELECT user_id FROM channel_members WHERE channel_id = $1",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;
            let roles: Vec<(String,)> = sqlx::query_as(
                "SELECT role_id FROM channel_roles WHERE channel_id = $1",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;
            seeds.push(ChannelSeed {
                id,
                category_id,
                users: users.into_iter().map(|(u,)| u).collect(),
                roles: roles.into_iter().map(|(r,)| r).collect(),
            });
        }
        Ok(seeds)
    }

    async fn message_author(&self, message_id: &str) -> Result<String, StoreError> {
        let (author_id,): (String,) =
            sqlx::query_as("SELECT author_id FROM messages WHERE id = $1")
                .bind(message_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(author_id)
    }

    async fn server_abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT unnest(r.abilities) FROM roles r \
             JOIN role_members rm ON rm.role_id = r.id \
             WHERE rm.server_id = $1 AND rm.user_id = $2",
        )
        .bind(server_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(ability,)| ability).collect())
    }
}

/// In-memory fakes of this crate's traits, exported unconditionally (not
/// behind `cfg(test)`) so downstream crates can exercise their own tests
/// against the same trait boundary production code depends on.
pub mod testing {
    use super::*;
    use dashmap::DashMap;
    use parking_lot::Mutex;

    /// In-memory [`SqlStore`] test double: exercises the same trait boundary
    /// production code depends on, with no live database.
    #[derive(Default)]
    pub struct InMemorySqlStore {
        pub servers: DashMap<String, Vec<String>>,
        pub friends: DashMap<String, Vec<String>>,
        pub roles: DashMap<(String, String), Vec<String>>,
        pub channels: DashMap<String, Vec<ChannelSeed>>,
        pub message_authors: DashMap<String, String>,
        pub abilities: DashMap<(String, String), Vec<String>>,
        pub all_servers: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SqlStore for InMemorySqlStore {
        async fn user_servers(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
            Ok(self.servers.get(user_id).map(|v| v.clone()).unwrap_or_default())
        }

        async fn user_friends(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
            Ok(self.friends.get(user_id).map(|v| v.clone()).unwrap_or_default())
        }

        async fn user_roles(&self, user_id: &str, server_id: &str) -> Result<Vec<String>, StoreError> {
            Ok(self
                .roles
                .get(&(user_id.to_string(), server_id.to_string()))
                .map(|v| v.clone())
                .unwrap_or_default())
        }

        async fn all_server_ids(&self) -> Result<Vec<String>, StoreError> {
            Ok(self.all_servers.lock().clone())
        }

        async fn server_channels(&self, server_id: &str) -> Result<Vec<ChannelSeed>, StoreError> {
            Ok(self.channels.get(server_id).map(|v| v.clone()).unwrap_or_default())
        }

        async fn message_author(&self, message_id: &str) -> Result<String, StoreError> {
            self.message_authors
                .get(message_id)
                .map(|v| v.clone())
                .ok_or(StoreError::NotFound)
        }

        async fn server_abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, StoreError> {
            Ok(self
                .abilities
                .get(&(server_id.to_string(), user_id.to_string()))
                .map(|v| v.clone())
                .unwrap_or_default())
        }
    }

}
