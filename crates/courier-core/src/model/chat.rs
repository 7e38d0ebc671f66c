//! Chats, memberships and join requests.

use serde::{Deserialize, Serialize};

use super::user::User;

/// Type of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// One-to-one chat with a user.
    Private,
    /// Basic group.
    Group,
    /// Supergroup.
    Supergroup,
    /// Channel.
    Channel,
    /// Any type this library does not know yet.
    #[serde(other)]
    Unknown,
}

/// A chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique identifier.
    pub id: i64,
    /// Chat type.
    #[serde(rename = "type")]
    pub kind: ChatType,
    /// Title, for groups, supergroups and channels.
    #[serde(default)]
    pub title: Option<String>,
    /// Username, for private chats, supergroups and channels.
    #[serde(default)]
    pub username: Option<String>,
    /// First name of the other party in a private chat.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name of the other party in a private chat.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Whether the supergroup has topics enabled.
    #[serde(default)]
    pub is_forum: Option<bool>,
}

impl Chat {
    /// Whether this is a one-to-one chat.
    pub fn is_private(&self) -> bool {
        self.kind == ChatType::Private
    }
}

/// Status of a chat member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMemberStatus {
    /// Chat owner.
    Creator,
    /// Administrator.
    Administrator,
    /// Regular member.
    Member,
    /// Member under restrictions.
    Restricted,
    /// Left the chat.
    Left,
    /// Banned.
    Kicked,
    /// Any status this library does not know yet.
    #[serde(other)]
    Unknown,
}

/// Information about one member of a chat.
///
/// Only the fields common to every member status are decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMember {
    /// Membership status.
    pub status: ChatMemberStatus,
    /// The member.
    pub user: User,
    /// When restrictions or a ban end (Unix time).
    #[serde(default)]
    pub until_date: Option<i64>,
}

/// An invite link for a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInviteLink {
    /// The link itself.
    pub invite_link: String,
    /// Creator of the link.
    pub creator: User,
    /// Whether joining requires admin approval.
    #[serde(default)]
    pub creates_join_request: bool,
    /// Whether the link is the primary one.
    #[serde(default)]
    pub is_primary: bool,
    /// Whether the link was revoked.
    #[serde(default)]
    pub is_revoked: bool,
    /// Link name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A change of a chat member's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    /// Chat the user belongs to.
    pub chat: Chat,
    /// Performer of the action.
    pub from: User,
    /// When the change happened (Unix time).
    pub date: i64,
    /// Previous membership.
    pub old_chat_member: ChatMember,
    /// New membership.
    pub new_chat_member: ChatMember,
    /// Invite link used to join, if any.
    #[serde(default)]
    pub invite_link: Option<ChatInviteLink>,
}

/// A request to join a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatJoinRequest {
    /// Chat the request was sent to.
    pub chat: Chat,
    /// User who sent the request.
    pub from: User,
    /// Private chat with the requester, usable for a limited time.
    pub user_chat_id: i64,
    /// When the request was sent (Unix time).
    pub date: i64,
    /// Requester's bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// Invite link used, if any.
    #[serde(default)]
    pub invite_link: Option<ChatInviteLink>,
}
