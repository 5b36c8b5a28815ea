use std::sync::Arc;

use async_trait::async_trait;
use chatcore_adapters::SqlStore;
use chatcore_rt::{Actor, ActorContext, ErrorAction, InMemoryMessageBroker, Pid};
use chatcore_wire::{AccountDeletion, ChangeStatus, ChangeStatusKind, Status, WSMessage};

use crate::hub_handle::HubHandle;
use crate::sink::OutboundSink;

/// The closed set of messages a `UserActor` receives. Every cross-actor
/// intent directed at a user's session arrives as one of these, never as an
/// opaque dynamically-typed value.
#[derive(Debug, Clone)]
pub enum UserMessage {
    /// An envelope to serialize and write straight to the bound websocket.
    Wire(WSMessage),
    /// A friend's presence ping, sent user-to-user when that friend's
    /// session starts.
    FriendPing(ChangeStatus),
    /// Forwarded by the hub when any user in `user_id`'s graph is deleted.
    AccountDeletion(AccountDeletion),
    /// Synchronous request for the friend cache, used by
    /// `chatcore-hub::get_active_friends`.
    GetFriends,
    GetFriendsReply(Vec<String>),
}

impl chatcore_rt::Message for UserMessage {
    const MESSAGE_TYPE: &'static str = "user";
}

/// Owns exactly one bound websocket. Announces presence to every server the
/// user belongs to on start, tears it down on stop, and forwards every
/// outbound envelope it is handed to that socket.
pub struct UserActor<H: HubHandle> {
    self_user_id: String,
    hub: H,
    sql: Arc<dyn SqlStore>,
    ws: Arc<dyn OutboundSink>,
    friends: Vec<String>,
}

impl<H: HubHandle> UserActor<H> {
    pub fn new(self_user_id: String, hub: H, sql: Arc<dyn SqlStore>, ws: Arc<dyn OutboundSink>) -> Self {
        Self {
            self_user_id,
            hub,
            sql,
            ws,
            friends: Vec::new(),
        }
    }

    fn presence(&self, server_id: Option<String>, status: Status, roles: Vec<String>) -> ChangeStatus {
        ChangeStatus {
            kind: match status {
                Status::Online => ChangeStatusKind::Connect,
                _ => ChangeStatusKind::Disconnect,
            },
            user: self.self_user_id.clone(),
            server_id,
            status,
            roles,
        }
    }

    async fn write_frame(&self, msg: &WSMessage) {
        match chatcore_wire::encode(msg) {
            Ok(frame) => {
                if let Err(err) = self.ws.send(frame).await {
                    tracing::warn!(user_id = %self.self_user_id, error = %err, "failed to write frame to bound socket");
                }
            }
            Err(err) => {
                tracing::error!(user_id = %self.self_user_id, error = %err, "failed to encode outbound envelope");
            }
        }
    }

    async fn announce(&self, ctx: &ActorContext<UserMessage, InMemoryMessageBroker<UserMessage>>, status: Status) {
        let server_ids = match self.sql.user_servers(&self.self_user_id).await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(user_id = %self.self_user_id, error = %err, "failed to load user servers");
                Vec::new()
            }
        };

        for server_id in server_ids {
            let roles = self
                .sql
                .user_roles(&self.self_user_id, &server_id)
                .await
                .unwrap_or_default();
            let change = self.presence(Some(server_id), status, roles);
            self.hub.send_user_status_message(ctx.pid().clone(), change).await;
        }

        let kind = match status {
            Status::Online => ChangeStatusKind::Ping,
            _ => ChangeStatusKind::Disconnect,
        };
        for friend_id in &self.friends {
            let Some(friend_pid) = self.hub.get_user(friend_id).await else {
                continue;
            };
            let change = ChangeStatus {
                kind,
                user: self.self_user_id.clone(),
                server_id: None,
                status,
                roles: Vec::new(),
            };
            if kind == ChangeStatusKind::Ping {
                let _ = ctx.send(&friend_pid, UserMessage::FriendPing(change)).await;
            } else {
                let _ = ctx
                    .send(&friend_pid, UserMessage::Wire(WSMessage::UserChangeStatus(change)))
                    .await;
            }
        }
    }
}

#[async_trait]
impl<H: HubHandle> Actor for UserActor<H> {
    type Message = UserMessage;
    type Broker = InMemoryMessageBroker<UserMessage>;
    type Error = std::convert::Infallible;

    async fn pre_start(
        &mut self,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        self.friends = self.sql.user_friends(&self.self_user_id).await.unwrap_or_default();
        tracing::info!(user_id = %self.self_user_id, pid = %ctx.pid(), "user actor started");
        self.announce(ctx, Status::Online).await;
        Ok(())
    }

    async fn post_stop(
        &mut self,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        self.announce(ctx, Status::Offline).await;
        tracing::info!(user_id = %self.self_user_id, pid = %ctx.pid(), "user actor stopped");
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: Self::Message,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        match msg {
            UserMessage::Wire(envelope) => {
                self.write_frame(&envelope).await;
            }
            UserMessage::FriendPing(status) => {
                let from = status.user.clone();
                if !self.friends.iter().any(|f| f == &from) {
                    self.friends.push(from.clone());
                }
                self.write_frame(&WSMessage::UserChangeStatus(status)).await;

                let reply = self.presence(None, Status::Online, Vec::new());
                if let Some(friend_pid) = self.hub.get_user(&from).await {
                    let _ = ctx
                        .send(&friend_pid, UserMessage::Wire(WSMessage::UserChangeStatus(reply)))
                        .await;
                }
            }
            UserMessage::AccountDeletion(deletion) => {
                if deletion.user_id == self.self_user_id {
                    let envelope = WSMessage::AccountDeletion(deletion.clone());
                    for friend_id in self.friends.clone() {
                        if let Some(friend_pid) = self.hub.get_user(&friend_id).await {
                            let _ = ctx.send(&friend_pid, UserMessage::Wire(envelope.clone())).await;
                        }
                    }
                    self.hub.poison_user(ctx.pid()).await;
                } else {
                    self.friends.retain(|f| f != &deletion.user_id);
                    self.write_frame(&WSMessage::AccountDeletion(deletion)).await;
                }
            }
            UserMessage::GetFriends => {
                ctx.reply(UserMessage::GetFriendsReply(self.friends.clone()));
            }
            UserMessage::GetFriendsReply(_) => {
                tracing::warn!(user_id = %self.self_user_id, "received a GetFriendsReply outside of a request/reply cycle");
            }
        }
        Ok(())
    }

    fn on_error(&mut self, _error: &Self::Error) -> ErrorAction {
        ErrorAction::Stop
    }
}
