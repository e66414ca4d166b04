//! Notification dispatcher implementations.

mod tracing_notifier;

pub use tracing_notifier::TracingNotifier;
