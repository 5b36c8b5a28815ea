use std::collections::HashMap;

use async_trait::async_trait;
use chatcore_rt::{Actor, ActorContext, ErrorAction, InMemoryMessageBroker, Region};
use chatcore_wire::{
    AccountDeletion, Category, Channel, ChangeStatus, ServerAction, Status, WSMessage,
};

use crate::hub_handle::{ChannelSpawnSpec, HubHandle};

/// Which of the three near-identical "remove one member, broadcast first"
/// operations a [`ServerMessage::Moderation`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationKind {
    Ban,
    Kick,
    Leave,
}

/// The closed set of messages a `ServerActor` receives.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    ChangeStatus(ChangeStatus),
    StartChannel(Channel),
    KillChannel(Channel),
    KillCategory { category: Category, channel_ids: Vec<String> },
    /// Synchronous request for the current online member set, sent only via
    /// `ActorContext::request` by a child channel actor's parent lookup.
    GetServerUsers,
    GetServerUsersReply(Vec<String>),
    Moderation { kind: ModerationKind, action: ServerAction },
    AccountDeletion(AccountDeletion),
    /// Role/category/profile/channel-metadata mutations: broadcast verbatim
    /// to every current member, no local state change.
    BroadcastOnly(WSMessage),
}

impl chatcore_rt::Message for ServerMessage {
    const MESSAGE_TYPE: &'static str = "server";
}

/// Tracks the region-local online set for one server replica and hosts its
/// channel children. One instance exists per `(serverID, region)`.
pub struct ServerActor<H: HubHandle> {
    self_server_id: String,
    region: Region,
    hub: H,
    members: HashMap<String, Status>,
}

impl<H: HubHandle> ServerActor<H> {
    pub fn new(self_server_id: String, region: Region, hub: H) -> Self {
        Self {
            self_server_id,
            region,
            hub,
            members: HashMap::new(),
        }
    }

    fn is_global(&self) -> bool {
        self.self_server_id == "global"
    }

    async fn broadcast(&self, envelope: &WSMessage, skip: Option<&str>) {
        for user_id in self.members.keys() {
            if Some(user_id.as_str()) == skip {
                continue;
            }
            if let Some(pid) = self.hub.get_user(user_id).await {
                self.hub.broadcast_message_to_user(&pid, envelope.clone()).await;
            }
        }
    }
}

#[async_trait]
impl<H: HubHandle> Actor for ServerActor<H> {
    type Message = ServerMessage;
    type Broker = InMemoryMessageBroker<ServerMessage>;
    type Error = std::convert::Infallible;

    async fn pre_start(
        &mut self,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        tracing::info!(server_id = %self.self_server_id, region = %self.region, pid = %ctx.pid(), "server actor started");
        Ok(())
    }

    async fn post_stop(
        &mut self,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        tracing::info!(server_id = %self.self_server_id, region = %self.region, pid = %ctx.pid(), "server actor stopped");
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: Self::Message,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        match msg {
            ServerMessage::ChangeStatus(status) => {
                self.broadcast(&WSMessage::UserChangeStatus(status.clone()), Some(&status.user))
                    .await;
                if status.status == Status::Offline {
                    self.members.remove(&status.user);
                } else {
                    self.members.insert(status.user.clone(), status.status);
                }
            }
            ServerMessage::StartChannel(channel) => {
                let spec = ChannelSpawnSpec {
                    channel_id: channel.id.clone(),
                    server_id: channel.server_id.clone(),
                    region: self.region.clone(),
                    members: channel.users.clone(),
                };
                if self.hub.spawn_channel_child(ctx.pid(), spec).await.is_none() {
                    tracing::warn!(server_id = %self.self_server_id, channel_id = %channel.id, "refused to spawn channel: parent not active");
                }
                if !self.is_global() {
                    self.broadcast(&WSMessage::StartChannel(channel), None).await;
                }
            }
            ServerMessage::KillChannel(channel) => {
                let child = chatcore_rt::Pid::new(
                    ctx.pid().node.clone(),
                    chatcore_rt::ActorPath::Channel {
                        server_id: self.self_server_id.clone(),
                        channel_id: channel.id.clone(),
                        region: self.region.clone(),
                    },
                );
                self.hub.poison_channel(&child).await;
                self.broadcast(&WSMessage::KillChannel(channel), None).await;
            }
            ServerMessage::KillCategory { category, channel_ids } => {
                for channel_id in channel_ids {
                    let child = chatcore_rt::Pid::new(
                        ctx.pid().node.clone(),
                        chatcore_rt::ActorPath::Channel {
                            server_id: self.self_server_id.clone(),
                            channel_id,
                            region: self.region.clone(),
                        },
                    );
                    self.hub.poison_channel(&child).await;
                }
                self.broadcast(&WSMessage::KillCategory(category), None).await;
            }
            ServerMessage::GetServerUsers => {
                let users: Vec<String> = self.members.keys().cloned().collect();
                ctx.reply(ServerMessage::GetServerUsersReply(users));
            }
            ServerMessage::GetServerUsersReply(_) => {
                tracing::warn!(server_id = %self.self_server_id, "received a GetServerUsers reply on the request path, ignoring");
            }
            ServerMessage::Moderation { kind, action } => {
                let envelope = match kind {
                    ModerationKind::Ban => WSMessage::BanUser(action.clone()),
                    ModerationKind::Kick => WSMessage::KickUser(action.clone()),
                    ModerationKind::Leave => WSMessage::LeaveServer(action.clone()),
                };
                self.broadcast(&envelope, None).await;
                self.members.remove(&action.user_id);
            }
            ServerMessage::AccountDeletion(deletion) => {
                self.members.remove(&deletion.user_id);
                for channel_pid in self.hub.get_server_channels(ctx.pid()).await {
                    self.hub.notify_channel_account_deletion(&channel_pid, deletion.clone()).await;
                }
            }
            ServerMessage::BroadcastOnly(envelope) => {
                self.broadcast(&envelope, None).await;
            }
        }
        Ok(())
    }

    fn on_error(&mut self, _error: &Self::Error) -> ErrorAction {
        ErrorAction::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GetServerUsersError;
    use chatcore_rt::util::{ActorPath, NodeId};
    use chatcore_rt::Pid;
    use chatcore_wire::ChangeStatusKind;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct FakeHub {
        users: Arc<Mutex<std::collections::HashMap<String, Pid>>>,
        broadcasts: Arc<Mutex<Vec<(String, WSMessage)>>>,
        spawned: Arc<Mutex<Vec<ChannelSpawnSpec>>>,
    }

    #[async_trait]
    impl HubHandle for FakeHub {
        async fn get_user(&self, user_id: &str) -> Option<Pid> {
            self.users.lock().unwrap().get(user_id).cloned()
        }

        async fn get_all_server_instances(&self, _server_id: &str) -> Vec<Pid> {
            Vec::new()
        }

        async fn broadcast_message_to_user(&self, user_pid: &Pid, msg: WSMessage) {
            self.broadcasts.lock().unwrap().push((user_pid.to_string(), msg));
        }

        async fn send_user_status_message(&self, _sender: Pid, _status: ChangeStatus) {}

        async fn spawn_channel_child(&self, _parent: &Pid, spec: ChannelSpawnSpec) -> Option<Pid> {
            self.spawned.lock().unwrap().push(spec);
            Some(pid("channel-stub"))
        }

        async fn poison_channel(&self, _channel_pid: &Pid) {}

        async fn get_server_channels(&self, _parent: &Pid) -> Vec<Pid> {
            Vec::new()
        }

        async fn notify_channel_account_deletion(&self, _channel_pid: &Pid, _deletion: AccountDeletion) {}

        async fn get_server_users(&self, _parent: &Pid, _timeout: Duration) -> Result<Vec<String>, GetServerUsersError> {
            Ok(Vec::new())
        }

        async fn poison_user(&self, _user_pid: &Pid) {}
    }

    fn pid(user_id: &str) -> Pid {
        Pid::new(
            NodeId::new("node-1"),
            ActorPath::Server {
                server_id: user_id.to_string(),
                region: Region::new("na"),
            },
        )
    }

    fn ctx_for() -> ActorContext<ServerMessage, InMemoryMessageBroker<ServerMessage>> {
        ActorContext::new(pid("srv1"), None, InMemoryMessageBroker::new())
    }

    #[tokio::test]
    async fn connect_adds_member_and_excludes_self_from_broadcast() {
        let hub = FakeHub::default();
        hub.users.lock().unwrap().insert("u2".to_string(), pid("u2"));
        let mut actor = ServerActor::new("srv1".to_string(), Region::new("na"), hub.clone());
        actor.members.insert("u2".to_string(), Status::Online);
        let mut ctx = ctx_for();

        let status = ChangeStatus {
            kind: ChangeStatusKind::Connect,
            user: "u1".to_string(),
            server_id: Some("srv1".to_string()),
            status: Status::Online,
            roles: Vec::new(),
        };
        actor.handle_message(ServerMessage::ChangeStatus(status), &mut ctx).await.unwrap();

        assert_eq!(actor.members.get("u1"), Some(&Status::Online));
        let broadcasts = hub.broadcasts.lock().unwrap();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].0, pid("u2").to_string());
    }

    #[tokio::test]
    async fn disconnect_removes_member() {
        let hub = FakeHub::default();
        let mut actor = ServerActor::new("srv1".to_string(), Region::new("na"), hub);
        actor.members.insert("u1".to_string(), Status::Online);
        let mut ctx = ctx_for();

        let status = ChangeStatus {
            kind: ChangeStatusKind::Disconnect,
            user: "u1".to_string(),
            server_id: Some("srv1".to_string()),
            status: Status::Offline,
            roles: Vec::new(),
        };
        actor.handle_message(ServerMessage::ChangeStatus(status), &mut ctx).await.unwrap();

        assert!(!actor.members.contains_key("u1"));
    }

    #[tokio::test]
    async fn start_channel_spawns_child_and_broadcasts_unless_global() {
        let hub = FakeHub::default();
        let mut actor = ServerActor::new("global".to_string(), Region::new("na"), hub.clone());
        let mut ctx = ctx_for();

        let channel = Channel {
            id: "c1".to_string(),
            server_id: "global".to_string(),
            category_id: None,
            users: vec!["a".to_string(), "b".to_string()],
            roles: Vec::new(),
        };
        actor.handle_message(ServerMessage::StartChannel(channel), &mut ctx).await.unwrap();

        assert_eq!(hub.spawned.lock().unwrap().len(), 1);
        assert!(hub.broadcasts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_server_users_replies_with_member_keys() {
        let hub = FakeHub::default();
        let mut actor = ServerActor::new("srv1".to_string(), Region::new("na"), hub);
        actor.members.insert("u1".to_string(), Status::Online);
        let mut ctx = ctx_for();

        actor.handle_message(ServerMessage::GetServerUsers, &mut ctx).await.unwrap();
    }

    #[tokio::test]
    async fn moderation_broadcasts_then_removes_subject() {
        let hub = FakeHub::default();
        hub.users.lock().unwrap().insert("u1".to_string(), pid("u1"));
        let mut actor = ServerActor::new("srv1".to_string(), Region::new("na"), hub.clone());
        actor.members.insert("u1".to_string(), Status::Online);
        let mut ctx = ctx_for();

        let action = ServerAction {
            server_id: "srv1".to_string(),
            user_id: "u1".to_string(),
            reason: Some("spam".to_string()),
            duration_seconds: None,
        };
        actor
            .handle_message(ServerMessage::Moderation { kind: ModerationKind::Ban, action }, &mut ctx)
            .await
            .unwrap();

        assert!(!actor.members.contains_key("u1"));
        assert_eq!(hub.broadcasts.lock().unwrap().len(), 1);
    }
}
