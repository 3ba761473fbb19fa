use serde::{Deserialize, Serialize};
use teloxide::types::UserId;

use crate::logic::update::User;

/// Map of user id -> invocation counter.
pub const COUNTERS: &str = "COUNTERS";
/// Map of user id -> [`UserRecord`].
pub const USERS: &str = "USERS";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub display_name: String,
    pub username: Option<String>,
}

impl UserRecord {
    /// `@`-less username, or the display name for users without one.
    pub fn handle(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.display_name)
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        UserRecord {
            id: user.id,
            display_name: user.display_name(),
            username: user.username.clone(),
        }
    }
}

/// Store key for anything kept per user.
pub fn user_key(id: UserId) -> String {
    id.0.to_string()
}
