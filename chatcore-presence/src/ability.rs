use std::fmt;
use std::sync::Arc;

use chatcore_adapters::{KvStore, SqlStore};

use crate::error::PresenceError;

/// A single server-scoped permission. Two literal values, `OWNER` and
/// `ADMINISTRATOR`, grant every ability when present in a user's ability
/// list; every other value names one narrow capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ability(String);

impl Ability {
    pub const OWNER: &'static str = "OWNER";
    pub const ADMINISTRATOR: &'static str = "ADMINISTRATOR";
    pub const MANAGE_MESSAGES: &'static str = "ManageMessages";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_manage_messages(&self) -> bool {
        self.0 == Self::MANAGE_MESSAGES
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ability {
    fn from(value: &str) -> Self {
        Ability::new(value)
    }
}

/// Resolves the effective ability list for (server, user), checking the KV
/// cache first and falling back to the SQL store of record on a miss,
/// re-populating the cache with what it found.
///
/// Grounded on `permissions.go`'s `getAbilities`/`CheckPermission`: the
/// `ManageMessages`-on-own-message short circuit runs before any cache
/// lookup, exactly as in the source.
pub struct AbilityCache {
    kv: Arc<dyn KvStore>,
    sql: Arc<dyn SqlStore>,
}

impl AbilityCache {
    pub fn new(kv: Arc<dyn KvStore>, sql: Arc<dyn SqlStore>) -> Self {
        Self { kv, sql }
    }

    /// The union of the user's role abilities on `server_id`, cache-then-SQL.
    pub async fn abilities(&self, server_id: &str, user_id: &str) -> Result<Vec<String>, PresenceError> {
        if let Ok(cached) = self.kv.get_server_abilities(server_id, user_id).await {
            return Ok(cached);
        }

        let abilities = self.sql.server_abilities(server_id, user_id).await?;
        if let Err(err) = self.kv.cache_server_abilities(server_id, user_id, &abilities).await {
            tracing::warn!(server_id, user_id, error = %err, "failed to cache server abilities after SQL fallback");
        }
        Ok(abilities)
    }

    /// `true` iff `caller_id` may exercise `ability` on `server_id`.
    ///
    /// `subject` identifies the target of the check (e.g. the message
    /// author) and `message_author` is filled in by the caller when
    /// checking [`Ability::MANAGE_MESSAGES`] against a specific message —
    /// when both match `caller_id`, the check short-circuits to `true`
    /// without ever touching the ability cache.
    pub async fn check_permission(
        &self,
        server_id: &str,
        caller_id: &str,
        ability: &Ability,
        subject: Option<&str>,
        message_author: Option<&str>,
    ) -> Result<bool, PresenceError> {
        if ability.is_manage_messages() {
            if let (Some(author), Some(subject)) = (message_author, subject) {
                if author == caller_id && author == subject {
                    return Ok(true);
                }
            }
        }

        let abilities = self.abilities(server_id, caller_id).await?;
        Ok(abilities.iter().any(|a| {
            a == ability.as_str() || a == Ability::OWNER || a == Ability::ADMINISTRATOR
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcore_adapters::testing::{InMemoryKvStore, InMemorySqlStore};

    fn cache() -> (AbilityCache, Arc<InMemoryKvStore>, Arc<InMemorySqlStore>) {
        let kv = Arc::new(InMemoryKvStore::new());
        let sql = Arc::new(InMemorySqlStore::default());
        let ability_cache = AbilityCache::new(kv.clone(), sql.clone());
        (ability_cache, kv, sql)
    }

    #[tokio::test]
    async fn cache_miss_falls_back_to_sql_and_repopulates() {
        let (cache, kv, sql) = cache();
        sql.abilities.insert(
            ("srv1".to_string(), "u1".to_string()),
            vec!["KickMembers".to_string()],
        );

        let abilities = cache.abilities("srv1", "u1").await.unwrap();
        assert_eq!(abilities, vec!["KickMembers".to_string()]);
        assert_eq!(
            kv.get_server_abilities("srv1", "u1").await.unwrap(),
            vec!["KickMembers".to_string()]
        );
    }

    #[tokio::test]
    async fn owner_literal_grants_every_ability() {
        let (cache, _kv, sql) = cache();
        sql.abilities.insert(
            ("srv1".to_string(), "u1".to_string()),
            vec![Ability::OWNER.to_string()],
        );

        let granted = cache
            .check_permission("srv1", "u1", &Ability::new("KickMembers"), None, None)
            .await
            .unwrap();
        assert!(granted);
    }

    #[tokio::test]
    async fn missing_ability_is_denied() {
        let (cache, _kv, sql) = cache();
        sql.abilities
            .insert(("srv1".to_string(), "u1".to_string()), vec!["KickMembers".to_string()]);

        let granted = cache
            .check_permission("srv1", "u1", &Ability::new("BanMembers"), None, None)
            .await
            .unwrap();
        assert!(!granted);
    }

    #[tokio::test]
    async fn manage_messages_on_own_message_short_circuits_without_cache_lookup() {
        let (cache, _kv, _sql) = cache();
        let granted = cache
            .check_permission(
                "srv1",
                "u1",
                &Ability::new(Ability::MANAGE_MESSAGES),
                Some("u1"),
                Some("u1"),
            )
            .await
            .unwrap();
        assert!(granted);
    }

    #[tokio::test]
    async fn manage_messages_on_someone_elses_message_consults_abilities() {
        let (cache, _kv, sql) = cache();
        sql.abilities.insert(("srv1".to_string(), "u1".to_string()), vec![]);

        let granted = cache
            .check_permission(
                "srv1",
                "u1",
                &Ability::new(Ability::MANAGE_MESSAGES),
                Some("u2"),
                Some("u2"),
            )
            .await
            .unwrap();
        assert!(!granted);
    }
}
