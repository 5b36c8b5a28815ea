use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use chatcore_actors::{
    ChannelActor, ChannelMessage, ChannelSpawnSpec, HubHandle, ModerationKind, OutboundSink,
    ServerActor, ServerMessage, UserActor, UserMessage,
};
use chatcore_adapters::SqlStore;
use chatcore_rt::{
    ActorPath, ActorSystem, ClusterNode, InMemoryMessageBroker, NodeId, Pid, Region, RegionTable,
    SystemConfig,
};
use chatcore_wire::{AccountDeletion, Category, Channel, ChangeStatus, Friendship, Role, RoleMember, ServerAction, WSMessage};

use crate::error::HubError;

/// Deadline for every fan-out `request` the hub itself issues:
/// `GetServerUsers` (channel audience resolution via `HubHandle`, owned by
/// `chatcore-actors`) and `GetActiveUsers`/`GetActiveFriends` (this crate's
/// own public API).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long, and how often, `CreateUser`'s idempotent-replace waits for the
/// prior session's actor to finish unregistering before spawning the new
/// one. `poison` only *signals* a stop; this polls until the registry
/// actually reflects it, bounded so a wedged actor can't hang the caller
/// forever.
const REPLACE_POLL_ATTEMPTS: u32 = 200;
const REPLACE_POLL_INTERVAL: Duration = Duration::from_millis(5);

type UserSystem = ActorSystem<UserActor<Hub>>;
type ServerSystem = ActorSystem<ServerActor<Hub>>;
type ChannelSystem = ActorSystem<ChannelActor<Hub>>;

struct HubInner {
    regions: Vec<Region>,
    region_table: RegionTable,
    sql: Arc<dyn SqlStore>,
    users: ClusterNode<UserActor<Hub>>,
    servers: DashMap<Region, ClusterNode<ServerActor<Hub>>>,
    channels: DashMap<Region, ClusterNode<ChannelActor<Hub>>>,
    /// Cross-kind parent→children index: a server actor's channel children
    /// live in a different `ActorSystem` than the server itself, so
    /// `chatcore_rt::supervisor::SupervisorTree` (same-kind only) can't
    /// track this relationship — the hub does instead.
    channel_children: DashMap<Pid, Vec<Pid>>,
}

/// The fan-out service facade: the one component that
/// owns the cluster handle, hides the actor topology from HTTP handlers,
/// and implements [`HubHandle`] for the actor bodies it hosts.
///
/// Cheaply `Clone`: every clone shares the same `Arc<HubInner>`, exactly the
/// capability every spawned `UserActor<Hub>`/`ServerActor<Hub>`/
/// `ChannelActor<Hub>` is handed.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// `local_node` hosts the user-session actor system (where this
    /// process's gateway connections live); `regions` and `region_table`
    /// describe the server/channel replica topology — one `ClusterNode` per
    /// region, addressed by whatever node the region table assigns it to
    /// (falling back to a node named after the region itself when the
    /// table has no explicit assignment, so a single-process deployment
    /// works with an empty table).
    pub fn new(
        local_node: NodeId,
        regions: Vec<Region>,
        region_table: RegionTable,
        sql: Arc<dyn SqlStore>,
        config: SystemConfig,
    ) -> Self {
        let users = ClusterNode::new(
            local_node.clone(),
            UserSystem::new(local_node, config.clone(), InMemoryMessageBroker::new()),
        );

        let servers = DashMap::new();
        let channels = DashMap::new();
        for region in &regions {
            let node_id = region_table
                .node_for(region)
                .cloned()
                .unwrap_or_else(|| NodeId::new(region.as_str()));
            servers.insert(
                region.clone(),
                ClusterNode::new(
                    node_id.clone(),
                    ServerSystem::new(node_id.clone(), config.clone(), InMemoryMessageBroker::new()),
                ),
            );
            channels.insert(
                region.clone(),
                ClusterNode::new(
                    node_id.clone(),
                    ChannelSystem::new(node_id, config.clone(), InMemoryMessageBroker::new()),
                ),
            );
        }

        Self {
            inner: Arc::new(HubInner {
                regions,
                region_table,
                sql,
                users,
                servers,
                channels,
            }),
        }
    }

    /// Link another process's actor systems into this hub's cluster, one
    /// call per kind, so `ClusterNode::send`/`request` can route to a real
    /// peer node instead of only ever finding targets locally.
    pub fn add_user_peer(&self, node_id: NodeId, system: UserSystem) {
        self.inner.users.add_peer(node_id, system);
    }

    pub fn add_server_peer(&self, region: &Region, node_id: NodeId, system: ServerSystem) {
        if let Some(cluster) = self.inner.servers.get(region) {
            cluster.add_peer(node_id, system);
        }
    }

    pub fn add_channel_peer(&self, region: &Region, node_id: NodeId, system: ChannelSystem) {
        if let Some(cluster) = self.inner.channels.get(region) {
            cluster.add_peer(node_id, system);
        }
    }

    /// The static region → node assignment this hub was configured with
    /// (e.g. for a `/healthz` topology dump).
    pub fn region_table(&self) -> &RegionTable {
        &self.inner.region_table
    }

    fn user_pid(&self, user_id: &str) -> Pid {
        Pid::new(
            self.inner.users.node_id().clone(),
            ActorPath::User { user_id: user_id.to_string() },
        )
    }

    fn server_pid(&self, server_id: &str, region: &Region) -> Option<Pid> {
        let cluster = self.inner.servers.get(region)?;
        Some(Pid::new(
            cluster.node_id().clone(),
            ActorPath::Server { server_id: server_id.to_string(), region: region.clone() },
        ))
    }

    fn channel_pid(&self, server_id: &str, channel_id: &str, region: &Region) -> Option<Pid> {
        let cluster = self.inner.channels.get(region)?;
        Some(Pid::new(
            cluster.node_id().clone(),
            ActorPath::Channel {
                server_id: server_id.to_string(),
                channel_id: channel_id.to_string(),
                region: region.clone(),
            },
        ))
    }

    // ---- directory -----------------------------------------------------

    /// Spawn a user actor bound to `ws`; a prior live session for the same
    /// `user_id` is poisoned first (Open Question 1: **replace**).
    pub async fn create_user(
        &self,
        user_id: String,
        ws: Arc<dyn OutboundSink>,
    ) -> Result<Pid, HubError> {
        let pid = self.user_pid(&user_id);
        let system = self.inner.users.local();

        if system.get_active(&pid) {
            let _ = system.poison(&pid).await;
            for _ in 0..REPLACE_POLL_ATTEMPTS {
                if !system.get_active(&pid) {
                    break;
                }
                tokio::time::sleep(REPLACE_POLL_INTERVAL).await;
            }
        }

        let actor = UserActor::new(user_id, self.clone(), self.inner.sql.clone(), ws);
        let spawned = system.spawn(pid.path.clone(), None, actor)?;
        Ok(spawned)
    }

    pub async fn get_user(&self, user_id: &str) -> Option<Pid> {
        HubHandle::get_user(self, user_id).await
    }

    /// Activate a server replica in `region`; idempotent — returns the
    /// already-live PID if one exists.
    pub async fn start_server_in_region(&self, server_id: &str, region: &Region) -> Result<Pid, HubError> {
        let cluster = self
            .inner
            .servers
            .get(region)
            .ok_or_else(|| HubError::NotFound(format!("unknown region {region}")))?;
        let pid = self
            .server_pid(server_id, region)
            .ok_or_else(|| HubError::NotFound(format!("unknown region {region}")))?;

        if cluster.local().get_active(&pid) {
            return Ok(pid);
        }

        let actor = ServerActor::new(server_id.to_string(), region.clone(), self.clone());
        let spawned = cluster.local().spawn(pid.path.clone(), None, actor)?;
        Ok(spawned)
    }

    pub async fn get_all_server_instances(&self, server_id: &str) -> Vec<Pid> {
        HubHandle::get_all_server_instances(self, server_id).await
    }

    pub async fn get_all_channel_instances(&self, server_id: &str, channel_id: &str) -> Vec<Pid> {
        let mut pids = Vec::new();
        for region in &self.inner.regions {
            let Some(cluster) = self.inner.channels.get(region) else { continue };
            let Some(pid) = self.channel_pid(server_id, channel_id, region) else { continue };
            if cluster.local().get_active(&pid) {
                pids.push(pid);
            }
        }
        pids
    }

    // ---- chat fan-out ----------------------------------------------------

    async fn broadcast_to_channel(&self, server_id: &str, channel_id: &str, envelope: WSMessage) {
        for pid in self.get_all_channel_instances(server_id, channel_id).await {
            let Some(region) = pid.path.region() else { continue };
            let Some(cluster) = self.inner.channels.get(region) else { continue };
            if let Err(err) = cluster.send(&pid, ChannelMessage::Chat(envelope.clone())).await {
                tracing::warn!(channel = %pid, error = %err, "failed to deliver chat event to channel instance");
            }
        }
    }

    pub async fn send_chat_message(&self, server_id: &str, channel_id: &str, envelope: WSMessage) {
        self.broadcast_to_channel(server_id, channel_id, envelope).await;
    }

    pub async fn edit_message(&self, server_id: &str, channel_id: &str, envelope: WSMessage) {
        self.broadcast_to_channel(server_id, channel_id, envelope).await;
    }

    pub async fn delete_message(&self, server_id: &str, channel_id: &str, envelope: WSMessage) {
        self.broadcast_to_channel(server_id, channel_id, envelope).await;
    }

    pub async fn send_user_status_message(&self, sender: Pid, status: ChangeStatus) {
        HubHandle::send_user_status_message(self, sender, status).await;
    }

    pub async fn broadcast_message_to_user(&self, user_pid: &Pid, envelope: WSMessage) {
        HubHandle::broadcast_message_to_user(self, user_pid, envelope).await;
    }

    // ---- server/channel lifecycle & metadata broadcasts -----------------

    async fn send_to_every_server_instance(&self, server_id: &str, msg: ServerMessage) {
        for pid in self.get_all_server_instances(server_id).await {
            let Some(region) = pid.path.region() else { continue };
            if let Some(cluster) = self.inner.servers.get(region) {
                if let Err(err) = cluster.send(&pid, msg.clone()).await {
                    tracing::warn!(server = %pid, error = %err, "failed to deliver to server instance");
                }
            }
        }
    }

    pub async fn start_category(&self, server_id: &str, category: Category) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::StartCategory(category)))
            .await;
    }

    pub async fn start_channel(&self, server_id: &str, channel: Channel) {
        self.send_to_every_server_instance(server_id, ServerMessage::StartChannel(channel)).await;
    }

    pub async fn kill_channel(&self, server_id: &str, channel: Channel) {
        self.send_to_every_server_instance(server_id, ServerMessage::KillChannel(channel)).await;
    }

    pub async fn kill_category(&self, server_id: &str, category: Category, channel_ids: Vec<String>) {
        self.send_to_every_server_instance(server_id, ServerMessage::KillCategory { category, channel_ids })
            .await;
    }

    pub async fn create_or_edit_role(&self, server_id: &str, role: Role) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::CreateOrEditRole(role)))
            .await;
    }

    pub async fn remove_role(&self, server_id: &str, role: Role) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::RemoveRole(role)))
            .await;
    }

    pub async fn move_role(&self, server_id: &str, role: Role) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::MoveRole(role)))
            .await;
    }

    pub async fn add_role_member(&self, server_id: &str, member: RoleMember) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::AddRoleMember(member)))
            .await;
    }

    pub async fn remove_role_member(&self, server_id: &str, member: RoleMember) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::RemoveRoleMember(member)))
            .await;
    }

    pub async fn avatar_server_change(&self, server_id: &str, change: chatcore_wire::AvatarServerChange) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::AvatarServerChange(change)))
            .await;
    }

    pub async fn profile_server_change(&self, server_id: &str, change: chatcore_wire::ProfileServerChange) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::ProfileServerChange(change)))
            .await;
    }

    pub async fn edit_channel(&self, server_id: &str, change: chatcore_wire::EditChannel) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::EditChannel(change)))
            .await;
    }

    pub async fn edit_category(&self, server_id: &str, category: Category) {
        self.send_to_every_server_instance(server_id, ServerMessage::BroadcastOnly(WSMessage::EditCategory(category)))
            .await;
    }

    // ---- moderation ------------------------------------------------------

    pub async fn ban_user(&self, action: ServerAction) {
        self.send_to_every_server_instance(
            &action.server_id.clone(),
            ServerMessage::Moderation { kind: ModerationKind::Ban, action },
        )
        .await;
    }

    pub async fn kick_user(&self, action: ServerAction) {
        self.send_to_every_server_instance(
            &action.server_id.clone(),
            ServerMessage::Moderation { kind: ModerationKind::Kick, action },
        )
        .await;
    }

    pub async fn leave_server(&self, action: ServerAction) {
        self.send_to_every_server_instance(
            &action.server_id.clone(),
            ServerMessage::Moderation { kind: ModerationKind::Leave, action },
        )
        .await;
    }

    /// Broadcasts `KillServer` to every current member's user actor, then
    /// cascades the stop to every channel child before poisoning the server
    /// replica itself — channel children live in a different `ActorSystem`
    /// than their parent server, so `chatcore_rt::supervisor::SupervisorTree`
    /// (same-kind only) can't cascade this on its own; the hub mediates it.
    pub async fn kill_server(&self, action: ServerAction) {
        let instances = self.get_all_server_instances(&action.server_id).await;
        for server_pid in &instances {
            let Some(region) = server_pid.path.region() else { continue };
            let users = match self.get_server_users(server_pid, REQUEST_TIMEOUT).await {
                Ok(users) => users,
                Err(err) => {
                    tracing::warn!(server = %server_pid, error = %err, "could not resolve members before kill_server");
                    Vec::new()
                }
            };
            for user_id in users {
                if let Some(user_pid) = self.get_user(&user_id).await {
                    self.broadcast_message_to_user(&user_pid, WSMessage::KillServer(action.clone())).await;
                }
            }
            for channel_pid in self.get_server_channels(server_pid).await {
                self.poison_channel(&channel_pid).await;
            }
            if let Some(cluster) = self.inner.servers.get(region) {
                if let Err(err) = cluster.local().poison(server_pid).await {
                    tracing::warn!(server = %server_pid, error = %err, "failed to poison server replica");
                }
            }
        }
    }

    // ---- friendship --------------------------------------------------------

    pub async fn send_friend_request(&self, friendship: Friendship) {
        let envelope = WSMessage::FriendRequest(friendship.clone());
        for user_id in [&friendship.from, &friendship.to] {
            if let Some(pid) = self.get_user(user_id).await {
                self.broadcast_message_to_user(&pid, envelope.clone()).await;
            }
        }
    }

    /// Additionally spawns a `global/channel/<id>` with both users as its
    /// member list.
    pub async fn accept_friend_request(&self, friendship: Friendship, channel_id: String) {
        let envelope = WSMessage::AcceptFriendRequest(friendship.clone());
        for user_id in [&friendship.from, &friendship.to] {
            if let Some(pid) = self.get_user(user_id).await {
                self.broadcast_message_to_user(&pid, envelope.clone()).await;
            }
        }

        let channel = Channel {
            id: channel_id,
            server_id: "global".to_string(),
            category_id: None,
            users: vec![friendship.from, friendship.to],
            roles: Vec::new(),
        };
        self.start_channel("global", channel).await;
    }

    pub async fn remove_friend(&self, friendship: Friendship) {
        let envelope = WSMessage::RemoveFriend(friendship.clone());
        for user_id in [&friendship.from, &friendship.to] {
            if let Some(pid) = self.get_user(user_id).await {
                self.broadcast_message_to_user(&pid, envelope.clone()).await;
            }
        }
    }

    // ---- account deletion --------------------------------------------------

    pub async fn notify_account_deletion(&self, user_id: &str, server_ids: &[String]) {
        for server_id in server_ids {
            self.send_to_every_server_instance(
                server_id,
                ServerMessage::AccountDeletion(AccountDeletion {
                    user_id: user_id.to_string(),
                    server_id: Some(server_id.clone()),
                }),
            )
            .await;
        }

        if let Some(pid) = self.get_user(user_id).await {
            let _ = self
                .inner
                .users
                .send(&pid, UserMessage::AccountDeletion(AccountDeletion { user_id: user_id.to_string(), server_id: None }))
                .await;
        }
    }

    // ---- read APIs ----------------------------------------------------------

    pub async fn get_active_users(&self, server_id: &str) -> Vec<String> {
        let instances = self.get_all_server_instances(server_id).await;
        let replies = futures::future::join_all(instances.into_iter().map(|pid| async move {
            let Some(region) = pid.path.region() else { return Vec::new() };
            let Some(cluster) = self.inner.servers.get(region) else { return Vec::new() };
            match cluster.request(&pid, ServerMessage::GetServerUsers, REQUEST_TIMEOUT).await {
                Ok(ServerMessage::GetServerUsersReply(replied)) => replied,
                Ok(_) => Vec::new(),
                Err(err) => {
                    tracing::warn!(server = %pid, error = %err, "get_active_users: replica did not reply in time");
                    Vec::new()
                }
            }
        }))
        .await;

        let mut users: Vec<String> = replies.into_iter().flatten().collect();
        users.sort();
        users.dedup();
        users
    }

    pub async fn get_active_friends(&self, user_id: &str) -> Vec<String> {
        let Some(pid) = self.get_user(user_id).await else {
            return Vec::new();
        };
        match self.inner.users.request(&pid, UserMessage::GetFriends, REQUEST_TIMEOUT).await {
            Ok(UserMessage::GetFriendsReply(friends)) => friends,
            Ok(_) => Vec::new(),
            Err(err) => {
                tracing::warn!(user = %pid, error = %err, "get_active_friends: user actor did not reply in time");
                Vec::new()
            }
        }
    }

    /// On node start: activate every known server in this node's own
    /// region and seed its channels.
    pub async fn bootstrap(&self, local_region: &Region) -> Result<(), HubError> {
        let server_ids = self
            .inner
            .sql
            .all_server_ids()
            .await
            .map_err(|err| HubError::Upstream(err.to_string()))?;

        for server_id in server_ids {
            self.start_server_in_region(&server_id, local_region).await?;

            let seeds = self
                .inner
                .sql
                .server_channels(&server_id)
                .await
                .map_err(|err| HubError::Upstream(err.to_string()))?;
            for seed in seeds {
                let channel = Channel {
                    id: seed.id,
                    server_id: server_id.clone(),
                    category_id: seed.category_id,
                    users: seed.users,
                    roles: seed.roles,
                };
                self.start_channel(&server_id, channel).await;
            }
        }
        Ok(())
    }

    /// Graceful stop of a single actor by PID, dispatched to whichever
    /// kind's actor system owns it. Used by the gateway on disconnect.
    pub async fn kill_actor(&self, pid: &Pid) {
        match &pid.path {
            ActorPath::User { .. } => {
                self.poison_user(pid).await;
            }
            ActorPath::Server { region, .. } => {
                if let Some(cluster) = self.inner.servers.get(region) {
                    if let Err(err) = cluster.local().poison(pid).await {
                        tracing::warn!(actor = %pid, error = %err, "kill_actor: server replica not active");
                    }
                }
            }
            ActorPath::Channel { .. } => {
                self.poison_channel(pid).await;
            }
        }
    }
}

#[async_trait]
impl HubHandle for Hub {
    async fn get_user(&self, user_id: &str) -> Option<Pid> {
        let pid = self.user_pid(user_id);
        self.inner.users.local().get_active(&pid).then_some(pid)
    }

    async fn get_all_server_instances(&self, server_id: &str) -> Vec<Pid> {
        let mut pids = Vec::new();
        for region in &self.inner.regions {
            let Some(cluster) = self.inner.servers.get(region) else { continue };
            let Some(pid) = self.server_pid(server_id, region) else { continue };
            if cluster.local().get_active(&pid) {
                pids.push(pid);
            }
        }
        pids
    }

    async fn broadcast_message_to_user(&self, user_pid: &Pid, msg: WSMessage) {
        if let Err(err) = self.inner.users.send(user_pid, UserMessage::Wire(msg)).await {
            tracing::warn!(user = %user_pid, error = %err, "failed to deliver envelope to user actor");
        }
    }

    async fn send_user_status_message(&self, sender: Pid, status: ChangeStatus) {
        let Some(server_id) = status.server_id.clone() else {
            tracing::warn!(sender = %sender, "send_user_status_message called without a server_id");
            return;
        };
        self.send_to_every_server_instance(&server_id, ServerMessage::ChangeStatus(status)).await;
    }

    async fn spawn_channel_child(&self, parent: &Pid, spec: ChannelSpawnSpec) -> Option<Pid> {
        let server_cluster = self.inner.servers.get(parent.path.region()?)?;
        if !server_cluster.local().get_active(parent) {
            return None;
        }

        let channel_cluster = self.inner.channels.get(&spec.region)?;
        let path = ActorPath::Channel {
            server_id: spec.server_id.clone(),
            channel_id: spec.channel_id.clone(),
            region: spec.region.clone(),
        };
        let actor = ChannelActor::new(spec.channel_id, spec.members, parent.clone(), self.clone());
        let pid = channel_cluster.local().spawn(path, None, actor).ok()?;

        self.inner.channel_children.entry(parent.clone()).or_default().push(pid.clone());
        Some(pid)
    }

    async fn poison_channel(&self, channel_pid: &Pid) {
        let Some(region) = channel_pid.path.region() else { return };
        if let Some(cluster) = self.inner.channels.get(region) {
            if let Err(err) = cluster.local().poison(channel_pid).await {
                tracing::warn!(channel = %channel_pid, error = %err, "poison_channel: not active");
            }
        }
        for mut children in self.inner.channel_children.iter_mut() {
            children.retain(|pid| pid != channel_pid);
        }
    }

    async fn get_server_channels(&self, parent: &Pid) -> Vec<Pid> {
        self.inner
            .channel_children
            .get(parent)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    async fn notify_channel_account_deletion(&self, channel_pid: &Pid, deletion: AccountDeletion) {
        let Some(region) = channel_pid.path.region() else { return };
        if let Some(cluster) = self.inner.channels.get(region) {
            if let Err(err) = cluster.send(channel_pid, ChannelMessage::AccountDeletion(deletion)).await {
                tracing::warn!(channel = %channel_pid, error = %err, "failed to forward account deletion to channel");
            }
        }
    }

    async fn get_server_users(&self, parent: &Pid, timeout: Duration) -> Result<Vec<String>, chatcore_actors::GetServerUsersError> {
        let Some(region) = parent.path.region() else {
            return Err(chatcore_actors::GetServerUsersError::Dead);
        };
        let Some(cluster) = self.inner.servers.get(region) else {
            return Err(chatcore_actors::GetServerUsersError::Dead);
        };
        match cluster.request(parent, ServerMessage::GetServerUsers, timeout).await {
            Ok(ServerMessage::GetServerUsersReply(users)) => Ok(users),
            Ok(_) => Err(chatcore_actors::GetServerUsersError::Dead),
            Err(chatcore_rt::ClusterError::Broker(chatcore_rt::BrokerError::Timeout)) => {
                Err(chatcore_actors::GetServerUsersError::Timeout)
            }
            Err(_) => Err(chatcore_actors::GetServerUsersError::Dead),
        }
    }

    async fn poison_user(&self, user_pid: &Pid) {
        if let Err(err) = self.inner.users.local().poison(user_pid).await {
            tracing::warn!(user = %user_pid, error = %err, "poison_user: not active");
        }
    }
}
