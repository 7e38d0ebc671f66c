//! Polls and poll answers.

use serde::{Deserialize, Serialize};

use super::chat::Chat;
use super::user::User;

/// One answer option of a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option text.
    pub text: String,
    /// Number of users that voted for it.
    pub voter_count: i64,
}

/// A poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    /// Unique identifier.
    pub id: String,
    /// Question.
    pub question: String,
    /// Answer options.
    pub options: Vec<PollOption>,
    /// Total number of users that voted.
    pub total_voter_count: i64,
    /// Whether the poll is closed.
    pub is_closed: bool,
    /// Whether the poll is anonymous.
    pub is_anonymous: bool,
    /// `"regular"` or `"quiz"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether multiple answers are allowed.
    pub allows_multiple_answers: bool,
}

/// A user's answer in a non-anonymous poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollAnswer {
    /// Poll identifier.
    pub poll_id: String,
    /// Chat that voted, for anonymous votes by a chat.
    #[serde(default)]
    pub voter_chat: Option<Chat>,
    /// User that voted.
    #[serde(default)]
    pub user: Option<User>,
    /// 0-based indices of the chosen options; empty if the vote was retracted.
    pub option_ids: Vec<i64>,
}

impl PollAnswer {
    /// Whether the voter retracted their vote.
    pub fn is_retracted(&self) -> bool {
        self.option_ids.is_empty()
    }
}
