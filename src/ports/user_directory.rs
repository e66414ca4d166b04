//! User directory port.
//!
//! Registration validates that the user exists before touching any event
//! state; the directory is wherever the platform keeps its accounts.

use crate::domain::foundation::{DomainError, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for user account lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user profile by ID.
    ///
    /// Returns `None` if the user does not exist.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, DomainError>;
}

/// Minimal user profile needed by the registration flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub user_id: UserId,

    /// Email address for notifications.
    pub email: String,

    /// Display name (optional).
    pub display_name: Option<String>,
}
