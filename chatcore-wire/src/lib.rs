//! Binary wire envelope codec for chatcore's outbound client protocol.
//!
//! Every outbound frame is a [`WSMessage`] — a closed tagged union enumerated
//! completely so clients can decode every variant they might receive. Frames
//! are encoded whole; the codec never emits a partial envelope.

mod codec;
mod error;
mod message;

pub use codec::{decode, encode};
pub use error::WireError;
pub use message::{
    AccountDeletion, Author, AvatarServerChange, Category, ChangeStatus, ChangeStatusKind,
    Channel, DeleteChatMessage, EditChannel, EditChatMessage, Friendship, NewChatMessage,
    ProfileServerChange, Role, RoleMember, ServerAction, Status, WSMessage,
};
