//! Users and bots.

use serde::{Deserialize, Serialize};

/// A Telegram user or bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// Whether this user is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// First name.
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Username, without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
    /// IETF language tag of the user's client.
    #[serde(default)]
    pub language_code: Option<String>,
}

impl User {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// `@username` if the user has one, else the full name.
    pub fn mention(&self) -> String {
        self.username
            .as_ref()
            .map(|name| format!("@{name}"))
            .unwrap_or_else(|| self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_absent() {
        let user: User = serde_json::from_value(json!({ "id": 9, "first_name": "Ada" })).unwrap();
        assert!(!user.is_bot);
        assert_eq!(user.username, None);
        assert_eq!(user.mention(), "Ada");
    }

    #[test]
    fn test_full_name_and_mention() {
        let user: User = serde_json::from_value(json!({
            "id": 9,
            "is_bot": false,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "username": "ada"
        }))
        .unwrap();
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert_eq!(user.mention(), "@ada");
    }
}
