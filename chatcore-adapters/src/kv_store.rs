use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub const SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const ABILITY_TTL: Duration = Duration::from_secs(10 * 60);
pub const PRESENCE_CHANNEL: &str = "user.presence";

/// Health snapshot surfaced by the gateway's `/healthz` so the node doesn't
/// need to know the underlying cache client's internals.
#[derive(Debug, Clone, Default)]
pub struct KvHealth {
    pub pool_size: u32,
    pub idle_connections: u32,
    pub active_connections: u32,
    pub last_error: Option<String>,
}

/// The shared presence & ability cache (a Redis-protocol store). Session
/// records and cached abilities are opaque serialized strings at this
/// boundary — `chatcore-presence` owns the (de)serialization and TTL
/// policy on top of these primitives.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn cache_user(&self, token: &str, user_json: &str) -> Result<(), StoreError>;
    async fn get_cached_user(&self, token: &str) -> Result<String, StoreError>;
    /// Re-serialize and store `user_json`, preserving the key's current TTL
    /// when one is set, otherwise resetting it to [`SESSION_TTL`].
    async fn refresh_cached_user(&self, token: &str, user_json: &str) -> Result<(), StoreError>;
    async fn remove_cached_user(&self, token: &str) -> Result<(), StoreError>;

    async fn cache_server_abilities(
        &self,
        server_id: &str,
        user_id: &str,
        abilities: &[String],
    ) -> Result<(), StoreError>;
    async fn get_server_abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, StoreError>;

    async fn publish(&self, subject: &str, payload: &str) -> Result<(), StoreError>;
    async fn health(&self) -> KvHealth;
}

fn session_key(token: &str) -> String {
    format!("user:{token}")
}

fn ability_key(server_id: &str, user_id: &str) -> String {
    format!("roles:{server_id}:{user_id}")
}

/// A `redis`-backed [`KvStore`] using a pooled, auto-reconnecting connection
/// manager.
pub struct RedisKvStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisKvStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(StoreError::from)?;
        let manager = client.get_connection_manager().await.map_err(StoreError::from)?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn cache_user(&self, token: &str, user_json: &str) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(session_key(token), user_json, SESSION_TTL.as_secs())
            .await?;
        Ok(())
    }

    async fn get_cached_user(&self, token: &str) -> Result<String, StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let value: String = conn.get(session_key(token)).await?;
        Ok(value)
    }

    async fn refresh_cached_user(&self, token: &str, user_json: &str) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let key = session_key(token);
        let ttl: i64 = conn.ttl(&key).await?;
        let ttl = if ttl < 0 { SESSION_TTL.as_secs() as i64 } else { ttl };
        conn.set_ex::<_, _, ()>(&key, user_json, ttl as u64).await?;
        Ok(())
    }

    async fn remove_cached_user(&self, token: &str) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(session_key(token)).await?;
        Ok(())
    }

    async fn cache_server_abilities(
        &self,
        server_id: &str,
        user_id: &str,
        abilities: &[String],
    ) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(
            ability_key(server_id, user_id),
            abilities.join(","),
            ABILITY_TTL.as_secs(),
        )
        .await?;
        Ok(())
    }

    async fn get_server_abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let joined: String = conn.get(ability_key(server_id, user_id)).await?;
        Ok(joined.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    async fn publish(&self, subject: &str, payload: &str) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.publish::<_, _, ()>(subject, payload).await?;
        Ok(())
    }

    async fn health(&self) -> KvHealth {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => KvHealth {
                pool_size: 1,
                idle_connections: 0,
                active_connections: 1,
                last_error: None,
            },
            Err(err) => KvHealth {
                last_error: Some(err.to_string()),
                ..KvHealth::default()
            },
        }
    }
}

/// In-memory fakes of this crate's traits, exported unconditionally (not
/// behind `cfg(test)`) so downstream crates can exercise their own tests
/// against the same trait boundary production code depends on.
pub mod testing {
    use super::*;
    use dashmap::DashMap;
    use tokio::time::Instant;

    struct Entry {
        value: String,
        expires_at: Instant,
    }

    /// In-memory [`KvStore`] test double with real TTL bookkeeping, backed by
    /// `tokio::time::Instant` rather than wall-clock time so a test can fast
    /// forward past a TTL deterministically with `tokio::time::pause`/
    /// `advance` instead of sleeping for real.
    #[derive(Default)]
    pub struct InMemoryKvStore {
        entries: DashMap<String, Entry>,
        published: DashMap<String, Vec<String>>,
    }

    impl InMemoryKvStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn get_live(&self, key: &str) -> Option<String> {
            match self.entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
                Some(_) => {
                    self.entries.remove(key);
                    None
                }
                None => None,
            }
        }

        pub fn published_to(&self, subject: &str) -> Vec<String> {
            self.published.get(subject).map(|v| v.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl KvStore for InMemoryKvStore {
        async fn cache_user(&self, token: &str, user_json: &str) -> Result<(), StoreError> {
            self.entries.insert(
                session_key(token),
                Entry {
                    value: user_json.to_string(),
                    expires_at: Instant::now() + SESSION_TTL,
                },
            );
            Ok(())
        }

        async fn get_cached_user(&self, token: &str) -> Result<String, StoreError> {
            self.get_live(&session_key(token)).ok_or(StoreError::NotFound)
        }

        async fn refresh_cached_user(&self, token: &str, user_json: &str) -> Result<(), StoreError> {
            let key = session_key(token);
            let ttl = self
                .entries
                .get(&key)
                .map(|e| e.expires_at.saturating_duration_since(Instant::now()))
                .filter(|remaining| !remaining.is_zero())
                .unwrap_or(SESSION_TTL);
            self.entries.insert(
                key,
                Entry {
                    value: user_json.to_string(),
                    expires_at: Instant::now() + ttl,
                },
            );
            Ok(())
        }

        async fn remove_cached_user(&self, token: &str) -> Result<(), StoreError> {
            self.entries.remove(&session_key(token));
            Ok(())
        }

        async fn cache_server_abilities(
            &self,
            server_id: &str,
            user_id: &str,
            abilities: &[String],
        ) -> Result<(), StoreError> {
            self.entries.insert(
                ability_key(server_id, user_id),
                Entry {
                    value: abilities.join(","),
                    expires_at: Instant::now() + ABILITY_TTL,
                },
            );
            Ok(())
        }

        async fn get_server_abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, StoreError> {
            let joined = self
                .get_live(&ability_key(server_id, user_id))
                .ok_or(StoreError::NotFound)?;
            Ok(joined.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
        }

        async fn publish(&self, subject: &str, payload: &str) -> Result<(), StoreError> {
            self.published.entry(subject.to_string()).or_default().push(payload.to_string());
            Ok(())
        }

        async fn health(&self) -> KvHealth {
            KvHealth {
                pool_size: 1,
                idle_connections: 1,
                active_connections: 0,
                last_error: None,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn cache_then_get_round_trips() {
            let store = InMemoryKvStore::new();
            store.cache_user("tok1", "{\"id\":\"u1\"}").await.unwrap();
            assert_eq!(store.get_cached_user("tok1").await.unwrap(), "{\"id\":\"u1\"}");
        }

        #[tokio::test]
        async fn get_missing_user_is_not_found() {
            let store = InMemoryKvStore::new();
            let err = store.get_cached_user("ghost").await.unwrap_err();
            assert!(matches!(err, StoreError::NotFound));
        }

        #[tokio::test]
        async fn refresh_preserves_existing_ttl() {
            let store = InMemoryKvStore::new();
            store.cache_user("tok1", "v1").await.unwrap();
            let before = store.entries.get(&session_key("tok1")).unwrap().expires_at;
            store.refresh_cached_user("tok1", "v2").await.unwrap();
            let after = store.entries.get(&session_key("tok1")).unwrap().expires_at;
            assert_eq!(store.get_cached_user("tok1").await.unwrap(), "v2");
            assert!(after <= before);
        }

        #[tokio::test]
        async fn refresh_resets_ttl_when_key_absent() {
            let store = InMemoryKvStore::new();
            store.refresh_cached_user("tok1", "v1").await.unwrap();
            assert_eq!(store.get_cached_user("tok1").await.unwrap(), "v1");
        }

        #[tokio::test]
        async fn remove_cached_user_clears_entry() {
            let store = InMemoryKvStore::new();
            store.cache_user("tok1", "v1").await.unwrap();
            store.remove_cached_user("tok1").await.unwrap();
            assert!(store.get_cached_user("tok1").await.is_err());
        }

        #[tokio::test]
        async fn abilities_round_trip_as_comma_joined_list() {
            let store = InMemoryKvStore::new();
            store
                .cache_server_abilities("srv1", "u1", &["ManageMessages".to_string(), "KickMembers".to_string()])
                .await
                .unwrap();
            let abilities = store.get_server_abilities("srv1", "u1").await.unwrap();
            assert_eq!(abilities, vec!["ManageMessages".to_string(), "KickMembers".to_string()]);
        }

        #[tokio::test]
        async fn publish_records_payload_under_subject() {
            let store = InMemoryKvStore::new();
            store.publish(PRESENCE_CHANNEL, "u1|online").await.unwrap();
            assert_eq!(store.published_to(PRESENCE_CHANNEL), vec!["u1|online".to_string()]);
        }

        #[tokio::test(start_paused = true)]
        async fn cached_user_expires_after_session_ttl() {
            let store = InMemoryKvStore::new();
            store.cache_user("tok1", "v1").await.unwrap();

            tokio::time::advance(SESSION_TTL - Duration::from_secs(1)).await;
            assert_eq!(store.get_cached_user("tok1").await.unwrap(), "v1");

            tokio::time::advance(Duration::from_secs(2)).await;
            assert!(matches!(store.get_cached_user("tok1").await, Err(StoreError::NotFound)));
        }

        #[tokio::test(start_paused = true)]
        async fn cached_abilities_expire_after_ability_ttl() {
            let store = InMemoryKvStore::new();
            store.cache_server_abilities("srv1", "u1", &["ManageMessages".to_string()]).await.unwrap();

            tokio::time::advance(ABILITY_TTL + Duration::from_secs(1)).await;
            assert!(matches!(store.get_server_abilities("srv1", "u1").await, Err(StoreError::NotFound)));
        }
    }
}
