// Layer 1: Standard library
use std::fmt;

// Layer 2: Third-party
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// A user's live presence state on a given server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Online,
    Away,
    Dnd,
    Offline,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Online => "online",
            Status::Away => "away",
            Status::Dnd => "dnd",
            Status::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// The kind of presence transition a `ChangeStatus` envelope reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatusKind {
    Connect,
    Disconnect,
    Join,
    Ping,
}

/// Minimal author identity embedded in a chat message so clients can render
/// it without a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub id: String,
    pub author: Author,
    pub server_id: String,
    pub channel_id: String,
    pub content: Vec<u8>,
    pub everyone: bool,
    pub mentions_users: Vec<String>,
    pub mentions_roles: Vec<String>,
    pub mentions_channels: Vec<String>,
    pub attachments: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditChatMessage {
    pub id: String,
    pub channel_id: String,
    pub content: Vec<u8>,
    pub mentions_users: Vec<String>,
    pub mentions_roles: Vec<String>,
    pub mentions_channels: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteChatMessage {
    pub id: String,
    pub server_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub kind: ChangeStatusKind,
    pub user: String,
    pub server_id: Option<String>,
    pub status: Status,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub server_id: String,
    pub category_id: Option<String>,
    pub users: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub server_id: String,
    pub name: String,
    pub position: i32,
    pub users: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub server_id: String,
    pub position: i32,
    pub name: String,
    pub color: u32,
    pub abilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMember {
    pub role_id: String,
    pub server_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDeletion {
    pub user_id: String,
    pub server_id: Option<String>,
}

/// Shared shape for `BanUser` / `KickUser` / `LeaveServer` / `KillServer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAction {
    pub server_id: String,
    pub user_id: String,
    pub reason: Option<String>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarServerChange {
    pub server_id: String,
    pub user_id: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileServerChange {
    pub server_id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditChannel {
    pub id: String,
    pub server_id: String,
    pub name: Option<String>,
    pub category_id: Option<String>,
}

/// Number of [`WSMessage`] variants, in declaration order — the range of
/// tags `codec::decode` accepts before a frame's leading discriminant is
/// rejected as [`crate::WireError::UnknownTag`].
pub(crate) const WIRE_TAG_COUNT: u32 = 25;

/// The tagged union carried by every outbound websocket frame.
///
/// Every variant here is enumerated completely: clients must be able to
/// decode all of them. An envelope is always the outer wrapper — there is no
/// constructor that writes a bare payload to the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WSMessage {
    NewChatMessage(NewChatMessage),
    EditChatMessage(EditChatMessage),
    DeleteChatMessage(DeleteChatMessage),
    UserChangeStatus(ChangeStatus),
    StartChannel(Channel),
    KillChannel(Channel),
    StartCategory(Category),
    KillCategory(Category),
    EditCategory(Category),
    CreateOrEditRole(Role),
    RemoveRole(Role),
    MoveRole(Role),
    AddRoleMember(RoleMember),
    RemoveRoleMember(RoleMember),
    FriendRequest(Friendship),
    AcceptFriendRequest(Friendship),
    RemoveFriend(Friendship),
    AccountDeletion(AccountDeletion),
    BanUser(ServerAction),
    KickUser(ServerAction),
    LeaveServer(ServerAction),
    KillServer(ServerAction),
    AvatarServerChange(AvatarServerChange),
    ProfileServerChange(ProfileServerChange),
    EditChannel(EditChannel),
}

impl WSMessage {
    /// A short, stable name for the active variant, useful for log fields.
    pub fn variant_name(&self) -> &'static str {
        match self {
            WSMessage::NewChatMessage(_) => "new_chat_message",
            WSMessage::EditChatMessage(_) => "edit_chat_message",
            WSMessage::DeleteChatMessage(_) => "delete_chat_message",
            WSMessage::UserChangeStatus(_) => "user_change_status",
            WSMessage::StartChannel(_) => "start_channel",
            WSMessage::KillChannel(_) => "kill_channel",
            WSMessage::StartCategory(_) => "start_category",
            WSMessage::KillCategory(_) => "kill_category",
            WSMessage::EditCategory(_) => "edit_category",
            WSMessage::CreateOrEditRole(_) => "create_or_edit_role",
            WSMessage::RemoveRole(_) => "remove_role",
            WSMessage::MoveRole(_) => "move_role",
            WSMessage::AddRoleMember(_) => "add_role_member",
            WSMessage::RemoveRoleMember(_) => "remove_role_member",
            WSMessage::FriendRequest(_) => "friend_request",
            WSMessage::AcceptFriendRequest(_) => "accept_friend_request",
            WSMessage::RemoveFriend(_) => "remove_friend",
            WSMessage::AccountDeletion(_) => "account_deletion",
            WSMessage::BanUser(_) => "ban_user",
            WSMessage::KickUser(_) => "kick_user",
            WSMessage::LeaveServer(_) => "leave_server",
            WSMessage::KillServer(_) => "kill_server",
            WSMessage::AvatarServerChange(_) => "avatar_server_change",
            WSMessage::ProfileServerChange(_) => "profile_server_change",
            WSMessage::EditChannel(_) => "edit_channel",
        }
    }
}
