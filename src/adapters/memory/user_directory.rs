//! In-memory user directory for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{UserDirectory, UserProfile};

/// In-memory user directory for testing.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a user with the given email.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_user(&self, user_id: UserId, email: impl Into<String>) {
        let profile = UserProfile {
            user_id: user_id.clone(),
            email: email.into(),
            display_name: None,
        };
        self.users
            .write()
            .expect("InMemoryUserDirectory: users write lock poisoned")
            .insert(user_id, profile);
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, DomainError> {
        let users = self
            .users
            .read()
            .expect("InMemoryUserDirectory: users lock poisoned");
        Ok(users.get(user_id).cloned())
    }
}
