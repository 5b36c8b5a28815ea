use std::sync::Arc;

use chatcore_adapters::{KvStore, PRESENCE_CHANNEL};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::PresenceError;

/// Typed wrapper around [`KvStore`]'s session primitives: serializes a
/// caller-chosen user record type to JSON for storage and back, and
/// publishes presence transitions to the `user.presence` fan-out channel.
pub struct SessionCache {
    kv: Arc<dyn KvStore>,
}

impl SessionCache {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Cache `user` under `token` with the full session TTL. Called on
    /// login / websocket upgrade.
    pub async fn cache_user<T: Serialize>(&self, token: &str, user: &T) -> Result<(), PresenceError> {
        let json = serde_json::to_string(user).map_err(|e| PresenceError::MalformedSession(e.to_string()))?;
        self.kv.cache_user(token, &json).await?;
        Ok(())
    }

    /// Look up the cached record for `token`. A miss surfaces as
    /// [`PresenceError::SessionNotFound`]; callers in the HTTP layer map
    /// this to a 401.
    pub async fn get_user<T: DeserializeOwned>(&self, token: &str) -> Result<T, PresenceError> {
        let json = self
            .kv
            .get_cached_user(token)
            .await
            .map_err(|_| PresenceError::SessionNotFound)?;
        serde_json::from_str(&json).map_err(|e| PresenceError::MalformedSession(e.to_string()))
    }

    /// Re-serialize and store `user`, preserving the existing TTL (reset to
    /// the full session TTL if the key was never set). Called after a
    /// profile mutation so the cached record doesn't go stale for the rest
    /// of the session's 30 days.
    pub async fn refresh_user<T: Serialize>(&self, token: &str, user: &T) -> Result<(), PresenceError> {
        let json = serde_json::to_string(user).map_err(|e| PresenceError::MalformedSession(e.to_string()))?;
        self.kv.refresh_cached_user(token, &json).await?;
        Ok(())
    }

    /// Remove the cached session. Called on logout and account deletion.
    pub async fn remove_user(&self, token: &str) -> Result<(), PresenceError> {
        self.kv.remove_cached_user(token).await?;
        Ok(())
    }

    /// Publish a presence transition for cross-node observers, formatted as
    /// `"<userID>|<status>"`.
    pub async fn publish_presence(&self, user_id: &str, status: &str) -> Result<(), PresenceError> {
        self.kv.publish(PRESENCE_CHANNEL, &format!("{user_id}|{status}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcore_adapters::testing::InMemoryKvStore;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestUser {
        id: String,
        display_name: String,
    }

    fn cache() -> (SessionCache, Arc<InMemoryKvStore>) {
        let kv = Arc::new(InMemoryKvStore::new());
        (SessionCache::new(kv.clone()), kv)
    }

    #[tokio::test]
    async fn cache_then_get_round_trips_typed_record() {
        let (cache, _kv) = cache();
        let user = TestUser {
            id: "u1".to_string(),
            display_name: "Alice".to_string(),
        };
        cache.cache_user("tok1", &user).await.unwrap();
        let fetched: TestUser = cache.get_user("tok1").await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn missing_session_surfaces_not_found() {
        let (cache, _kv) = cache();
        let err = cache.get_user::<TestUser>("ghost").await.unwrap_err();
        assert!(matches!(err, PresenceError::SessionNotFound));
    }

    #[tokio::test]
    async fn publish_presence_formats_user_and_status() {
        let (cache, kv) = cache();
        cache.publish_presence("u1", "online").await.unwrap();
        assert_eq!(kv.published_to(chatcore_adapters::PRESENCE_CHANNEL), vec!["u1|online".to_string()]);
    }

    #[tokio::test]
    async fn remove_user_clears_session() {
        let (cache, _kv) = cache();
        let user = TestUser {
            id: "u1".to_string(),
            display_name: "Alice".to_string(),
        };
        cache.cache_user("tok1", &user).await.unwrap();
        cache.remove_user("tok1").await.unwrap();
        assert!(cache.get_user::<TestUser>("tok1").await.is_err());
    }
}
