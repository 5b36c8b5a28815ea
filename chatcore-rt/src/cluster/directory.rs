use async_trait::async_trait;
use dashmap::DashMap;

use crate::util::{ActorPath, NodeId};

/// Maps a logical, cluster-wide [`ActorPath`] to the [`NodeId`] currently
/// hosting it.
///
/// A real deployment would back this with a distributed KV store so every
/// node agrees on placement; this crate only ships the in-memory variant,
/// sufficient for the single-process multi-node simulation `ClusterNode`
/// builds on.
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    async fn register(&self, path: ActorPath, node: NodeId);
    async fn resolve(&self, path: &ActorPath) -> Option<NodeId>;
    async fn unregister(&self, path: &ActorPath);
}

#[derive(Default)]
pub struct InMemoryDirectory {
    entries: DashMap<ActorPath, NodeId>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClusterDirectory for InMemoryDirectory {
    async fn register(&self, path: ActorPath, node: NodeId) {
        self.entries.insert(path, node);
    }

    async fn resolve(&self, path: &ActorPath) -> Option<NodeId> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    async fn unregister(&self, path: &ActorPath) {
        self.entries.remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Region;

    fn path(id: &str) -> ActorPath {
        ActorPath::User {
            user_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn resolve_before_register_is_none() {
        let directory = InMemoryDirectory::new();
        assert!(directory.resolve(&path("u1")).await.is_none());
    }

    #[tokio::test]
    async fn register_then_resolve_round_trips() {
        let directory = InMemoryDirectory::new();
        directory.register(path("u1"), NodeId::new("node-a")).await;
        assert_eq!(directory.resolve(&path("u1")).await, Some(NodeId::new("node-a")));
    }

    #[tokio::test]
    async fn unregister_clears_placement() {
        let directory = InMemoryDirectory::new();
        directory.register(path("u1"), NodeId::new("node-a")).await;
        directory.unregister(&path("u1")).await;
        assert!(directory.resolve(&path("u1")).await.is_none());
    }

    #[tokio::test]
    async fn distinct_regions_resolve_independently() {
        let directory = InMemoryDirectory::new();
        let srv_na = ActorPath::Server {
            server_id: "srv1".to_string(),
            region: Region::new("na"),
        };
        let srv_eu = ActorPath::Server {
            server_id: "srv1".to_string(),
            region: Region::new("eu"),
        };
        directory.register(srv_na.clone(), NodeId::new("node-na")).await;
        directory.register(srv_eu.clone(), NodeId::new("node-eu")).await;
        assert_eq!(directory.resolve(&srv_na).await, Some(NodeId::new("node-na")));
        assert_eq!(directory.resolve(&srv_eu).await, Some(NodeId::new("node-eu")));
    }
}
