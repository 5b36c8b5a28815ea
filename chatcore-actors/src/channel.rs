use std::time::Duration;

use async_trait::async_trait;
use chatcore_rt::{Actor, ActorContext, ErrorAction, InMemoryMessageBroker, Pid};
use chatcore_wire::{AccountDeletion, WSMessage};

use crate::hub_handle::HubHandle;

/// Timeout for a channel's `GetServerUsers` request to its parent server
/// actor.
const GET_SERVER_USERS_TIMEOUT: Duration = Duration::from_secs(10);

/// The closed set of messages a `ChannelActor` receives.
#[derive(Debug, Clone)]
pub enum ChannelMessage {
    /// A chat event already wrapped as the outbound envelope; forwarded
    /// verbatim to the resolved audience.
    Chat(WSMessage),
    /// A soft signal: the SQL layer already cascaded the deletion, so a
    /// channel actor does no durable work here.
    AccountDeletion(AccountDeletion),
}

impl chatcore_rt::Message for ChannelMessage {
    const MESSAGE_TYPE: &'static str = "channel";
}

/// Maintains the effective audience for one channel and forwards chat
/// events to the User actors of that audience.
///
/// `members` is the static access list for private channels and DMs; an
/// empty list means "inherit the parent server's online set".
pub struct ChannelActor<H: HubHandle> {
    self_channel_id: String,
    members: Vec<String>,
    parent: Pid,
    hub: H,
}

impl<H: HubHandle> ChannelActor<H> {
    pub fn new(self_channel_id: String, members: Vec<String>, parent: Pid, hub: H) -> Self {
        Self {
            self_channel_id,
            members,
            parent,
            hub,
        }
    }

    async fn audience(&self) -> Vec<String> {
        if !self.members.is_empty() {
            return self.members.clone();
        }

        match self.hub.get_server_users(&self.parent, GET_SERVER_USERS_TIMEOUT).await {
            Ok(users) => users,
            Err(err) => {
                tracing::warn!(channel_id = %self.self_channel_id, error = %err, "failed to resolve public channel audience from parent");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<H: HubHandle> Actor for ChannelActor<H> {
    type Message = ChannelMessage;
    type Broker = InMemoryMessageBroker<ChannelMessage>;
    type Error = std::convert::Infallible;

    async fn pre_start(
        &mut self,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        tracing::info!(channel_id = %self.self_channel_id, pid = %ctx.pid(), "channel actor started");
        Ok(())
    }

    async fn post_stop(
        &mut self,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        tracing::info!(channel_id = %self.self_channel_id, pid = %ctx.pid(), "channel actor stopped");
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: Self::Message,
        _ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        match msg {
            ChannelMessage::Chat(envelope) => {
                for user_id in self.audience().await {
                    if let Some(pid) = self.hub.get_user(&user_id).await {
                        self.hub.broadcast_message_to_user(&pid, envelope.clone()).await;
                    }
                }
            }
            ChannelMessage::AccountDeletion(deletion) => {
                tracing::debug!(channel_id = %self.self_channel_id, user_id = %deletion.user_id, "account deletion signal received, no durable work");
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
    use crate::hub_handle::ChannelSpawnSpec;
    use chatcore_rt::util::{ActorPath, NodeId};
    use chatcore_wire::{Author, ChangeStatus, NewChatMessage};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeHub {
        users: Arc<Mutex<std::collections::HashMap<String, Pid>>>,
        delivered: Arc<Mutex<Vec<(String, WSMessage)>>>,
        server_users: Arc<Mutex<Vec<String>>>,
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
            self.delivered.lock().unwrap().push((user_pid.to_string(), msg));
        }

        async fn send_user_status_message(&self, _sender: Pid, _status: ChangeStatus) {}

        async fn spawn_channel_child(&self, _parent: &Pid, _spec: ChannelSpawnSpec) -> Option<Pid> {
            None
        }

        async fn poison_channel(&self, _channel_pid: &Pid) {}

        async fn get_server_channels(&self, _parent: &Pid) -> Vec<Pid> {
            Vec::new()
        }

        async fn notify_channel_account_deletion(&self, _channel_pid: &Pid, _deletion: AccountDeletion) {}

        async fn get_server_users(&self, _parent: &Pid, _timeout: Duration) -> Result<Vec<String>, GetServerUsersError> {
            Ok(self.server_users.lock().unwrap().clone())
        }

        async fn poison_user(&self, _user_pid: &Pid) {}
    }

    fn user_pid(user_id: &str) -> Pid {
        Pid::new(
            NodeId::new("node-1"),
            ActorPath::User {
                user_id: user_id.to_string(),
            },
        )
    }

    fn parent_pid() -> Pid {
        Pid::new(
            NodeId::new("node-1"),
            ActorPath::Server {
                server_id: "srv1".to_string(),
                region: chatcore_rt::Region::new("na"),
            },
        )
    }

    fn chat_envelope() -> WSMessage {
        WSMessage::NewChatMessage(NewChatMessage {
            id: "m1".to_string(),
            author: Author {
                id: "u1".to_string(),
                display_name: "Alice".to_string(),
                avatar: None,
            },
            server_id: "srv1".to_string(),
            channel_id: "c1".to_string(),
            content: b"hi".to_vec(),
            everyone: false,
            mentions_users: Vec::new(),
            mentions_roles: Vec::new(),
            mentions_channels: Vec::new(),
            attachments: Vec::new(),
            created_at: chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap(),
            updated_at: chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap(),
        })
    }

    fn ctx_for() -> ActorContext<ChannelMessage, InMemoryMessageBroker<ChannelMessage>> {
        let pid = Pid::new(
            NodeId::new("node-1"),
            ActorPath::Channel {
                server_id: "srv1".to_string(),
                channel_id: "c1".to_string(),
                region: chatcore_rt::Region::new("na"),
            },
        );
        ActorContext::new(pid, Some(parent_pid()), InMemoryMessageBroker::new())
    }

    #[tokio::test]
    async fn private_channel_delivers_only_to_explicit_members() {
        let hub = FakeHub::default();
        hub.users.lock().unwrap().insert("a".to_string(), user_pid("a"));
        hub.users.lock().unwrap().insert("b".to_string(), user_pid("b"));
        hub.server_users.lock().unwrap().push("c".to_string());

        let mut actor = ChannelActor::new(
            "c1".to_string(),
            vec!["a".to_string(), "b".to_string()],
            parent_pid(),
            hub.clone(),
        );
        let mut ctx = ctx_for();

        actor.handle_message(ChannelMessage::Chat(chat_envelope()), &mut ctx).await.unwrap();

        let delivered = hub.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
    }

    #[tokio::test]
    async fn public_channel_resolves_audience_from_parent_server() {
        let hub = FakeHub::default();
        hub.users.lock().unwrap().insert("c".to_string(), user_pid("c"));
        hub.server_users.lock().unwrap().push("c".to_string());

        let mut actor = ChannelActor::new("c1".to_string(), Vec::new(), parent_pid(), hub.clone());
        let mut ctx = ctx_for();

        actor.handle_message(ChannelMessage::Chat(chat_envelope()), &mut ctx).await.unwrap();

        let delivered = hub.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, user_pid("c").to_string());
    }

    #[tokio::test]
    async fn account_deletion_is_a_no_op() {
        let hub = FakeHub::default();
        let mut actor = ChannelActor::new("c1".to_string(), Vec::new(), parent_pid(), hub);
        let mut ctx = ctx_for();

        actor
            .handle_message(
                ChannelMessage::AccountDeletion(AccountDeletion {
                    user_id: "u1".to_string(),
                    server_id: Some("srv1".to_string()),
                }),
                &mut ctx,
            )
            .await
            .unwrap();
    }
}
