//! Log-only notification dispatcher.
//!
//! Emits each notification as a structured log line instead of delivering
//! it. Used in tests and in deployments that have no mail/push channel
//! wired up yet.

use async_trait::async_trait;
use tracing::info;

use crate::domain::foundation::DomainError;
use crate::ports::{Notification, NotificationDispatcher};

/// Notification dispatcher that logs instead of delivering.
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), DomainError> {
        info!(
            user_id = %notification.user_id,
            event_id = %notification.event_id,
            kind = ?notification.kind,
            "notification dispatched"
        );
        Ok(())
    }
}
