use std::collections::HashMap;

use marquee_core::model::User;

/// Credential lookup capability.
pub trait CredentialLookup: Send + Sync {
    /// `None` when the user is unknown.
    fn lookup(&self, username: &str) -> Option<User>;
}

/// Fixed user registry loaded from config.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    users: HashMap<String, User>,
}

impl StaticCredentials {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }
}

impl CredentialLookup for StaticCredentials {
    fn lookup(&self, username: &str) -> Option<User> {
        self.users.get(username).cloned()
    }
}
