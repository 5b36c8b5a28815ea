use std::time::Duration;

use dashmap::DashMap;

use super::error::ClusterError;
use crate::actor::Actor;
use crate::system::ActorSystem;
use crate::util::{NodeId, Pid};

/// One node's view of a cluster of actor systems of a single kind.
///
/// This node always knows its own local [`ActorSystem`]; peers are other
/// nodes' actor systems held in the same process. That makes this an
/// honest in-process simulation of multi-node routing rather than a network
/// transport; a production deployment swaps the peer table for one backed
/// by a real wire transport without touching actor or hub code.
pub struct ClusterNode<A: Actor> {
    node_id: NodeId,
    local: ActorSystem<A>,
    peers: DashMap<NodeId, ActorSystem<A>>,
}

impl<A: Actor> ClusterNode<A> {
    pub fn new(node_id: NodeId, local: ActorSystem<A>) -> Self {
        Self {
            node_id,
            local,
            peers: DashMap::new(),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn local(&self) -> &ActorSystem<A> {
        &self.local
    }

    /// Link another node's actor system of the same kind into this one's
    /// routing table.
    pub fn add_peer(&self, node_id: NodeId, system: ActorSystem<A>) {
        self.peers.insert(node_id, system);
    }

    fn system_for(&self, target: &Pid) -> Result<ActorSystem<A>, ClusterError> {
        if target.node == self.node_id {
            Ok(self.local.clone())
        } else {
            self.peers
                .get(&target.node)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| ClusterError::UnknownNode(target.node.clone()))
        }
    }

    /// Deliver `payload` to `target`, routing through this node's local
    /// system or the peer hosting `target.node`.
    pub async fn send(&self, target: &Pid, payload: A::Message) -> Result<(), ClusterError> {
        let system = self.system_for(target)?;
        system.send(target, payload).await.map_err(ClusterError::from)
    }

    /// As [`ClusterNode::send`], but awaits a reply.
    pub async fn request(
        &self,
        target: &Pid,
        payload: A::Message,
        timeout: Duration,
    ) -> Result<A::Message, ClusterError> {
        let system = self.system_for(target)?;
        system
            .request(target, payload, timeout)
            .await
            .map_err(ClusterError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorContext, ErrorAction};
    use crate::broker::InMemoryMessageBroker;
    use crate::message::Message;
    use crate::system::SystemConfig;
    use crate::util::ActorPath;
    use async_trait::async_trait;

    #[derive(Debug, Clone, PartialEq)]
    enum Echo {
        Ping,
        Pong,
    }

    impl Message for Echo {
        const MESSAGE_TYPE: &'static str = "echo";
    }

    #[derive(Debug, thiserror::Error)]
    #[error("echo error")]
    struct EchoError;

    struct EchoActor;

    #[async_trait]
    impl Actor for EchoActor {
        type Message = Echo;
        type Broker = InMemoryMessageBroker<Echo>;
        type Error = EchoError;

        async fn handle_message(
            &mut self,
            msg: Self::Message,
            ctx: &mut ActorContext<Self::Message, Self::Broker>,
        ) -> Result<(), Self::Error> {
            if matches!(msg, Echo::Ping) {
                ctx.reply(Echo::Pong);
            }
            Ok(())
        }

        fn on_error(&mut self, _error: &Self::Error) -> ErrorAction {
            ErrorAction::Resume
        }
    }

    fn system(node: &str, broker: InMemoryMessageBroker<Echo>) -> ActorSystem<EchoActor> {
        ActorSystem::new(NodeId::new(node), SystemConfig::default(), broker)
    }

    #[tokio::test]
    async fn routes_locally_when_target_is_this_node() {
        let broker = InMemoryMessageBroker::new();
        let local = system("node-a", broker);
        let pid = local
            .spawn(
                ActorPath::User {
                    user_id: "u1".to_string(),
                },
                None,
                EchoActor,
            )
            .unwrap();
        let node = ClusterNode::new(NodeId::new("node-a"), local);

        let reply = node
            .request(&pid, Echo::Ping, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply, Echo::Pong);
    }

    #[tokio::test]
    async fn routes_to_peer_when_target_is_another_node() {
        let broker_a = InMemoryMessageBroker::new();
        let local = system("node-a", broker_a);
        let node = ClusterNode::new(NodeId::new("node-a"), local);

        let broker_b = InMemoryMessageBroker::new();
        let remote = system("node-b", broker_b);
        let pid = remote
            .spawn(
                ActorPath::User {
                    user_id: "u2".to_string(),
                },
                None,
                EchoActor,
            )
            .unwrap();
        node.add_peer(NodeId::new("node-b"), remote);

        let reply = node
            .request(&pid, Echo::Ping, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply, Echo::Pong);
    }

    #[tokio::test]
    async fn unknown_peer_node_errors() {
        let broker = InMemoryMessageBroker::new();
        let local = system("node-a", broker);
        let node = ClusterNode::new(NodeId::new("node-a"), local);

        let ghost = Pid::new(
            NodeId::new("node-z"),
            ActorPath::User {
                user_id: "ghost".to_string(),
            },
        );
        let err = node.send(&ghost, Echo::Ping).await.unwrap_err();
        assert_eq!(err, ClusterError::UnknownNode(NodeId::new("node-z")));
    }
}
