use std::time::Duration;

use async_trait::async_trait;
use chatcore_rt::{Pid, Region};
use chatcore_wire::{ChangeStatus, WSMessage};

use crate::error::GetServerUsersError;

/// The initial state a newly-spawned channel actor is seeded with. Mirrors
/// the `StartChannel{channel}` payload a server actor sends when it spawns
/// a child.
#[derive(Debug, Clone)]
pub struct ChannelSpawnSpec {
    pub channel_id: String,
    pub server_id: String,
    pub region: Region,
    pub members: Vec<String>,
}

/// The narrow capability set User/Server/Channel actor bodies borrow from
/// the fan-out hub: directory lookups and cross-kind sends.
///
/// This breaks what would otherwise be a cyclic dependency: the hub needs
/// this crate to implement its `Actor` bodies, and this crate needs a way
/// to call back into the hub's directory. Depending only on this trait
/// (never on `chatcore-hub` itself) keeps the dependency graph acyclic:
/// `chatcore-actors` -> `chatcore-rt` / `chatcore-wire`, and
/// `chatcore-hub` -> `chatcore-actors` + `impl HubHandle`.
#[async_trait]
pub trait HubHandle: Send + Sync + Clone + 'static {
    /// Directory lookup for a user's single live session, if any.
    async fn get_user(&self, user_id: &str) -> Option<Pid>;

    /// Every region's live server replica for `server_id`, skipping regions
    /// with no active instance.
    async fn get_all_server_instances(&self, server_id: &str) -> Vec<Pid>;

    /// Best-effort direct delivery to one user's bound websocket. A missing
    /// target is silently absorbed — fan-out is best-effort by design.
    async fn broadcast_message_to_user(&self, user_pid: &Pid, msg: WSMessage);

    /// Send a presence transition, attributed to `sender`, to every live
    /// replica of `status.server_id` (via [`HubHandle::get_all_server_instances`]
    /// done by the caller or internally — implementations may do either).
    async fn send_user_status_message(&self, sender: Pid, status: ChangeStatus);

    /// Spawn a channel actor as a child of `parent`, seeded with `spec`.
    /// Returns `None` if `parent` is no longer active — a channel is never
    /// spawned orphaned.
    async fn spawn_channel_child(&self, parent: &Pid, spec: ChannelSpawnSpec) -> Option<Pid>;

    /// Poison (graceful stop) a named channel child, e.g. on `KillChannel`.
    async fn poison_channel(&self, channel_pid: &Pid);

    /// Every live channel child currently spawned under `parent`, per the
    /// supervisor tree the hub owns. Used when a server actor forwards an
    /// account deletion to its children.
    async fn get_server_channels(&self, parent: &Pid) -> Vec<Pid>;

    /// Forward an account-deletion signal to one channel actor. Channel
    /// actors treat this as a soft, no-durable-work notification.
    async fn notify_channel_account_deletion(&self, channel_pid: &Pid, deletion: chatcore_wire::AccountDeletion);

    /// Synchronous request to a channel's parent server actor for its
    /// current online member set. The one cross-kind `request` an actor
    /// body performs directly.
    async fn get_server_users(&self, parent: &Pid, timeout: Duration) -> Result<Vec<String>, GetServerUsersError>;

    /// Graceful stop of a user actor, e.g. on websocket close.
    async fn poison_user(&self, user_pid: &Pid);
}
