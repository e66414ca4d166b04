//! Ports - interfaces between the application core and the outside world.
//!
//! Command handlers depend only on these traits; adapters provide the
//! concrete implementations.

mod event_publisher;
mod event_repository;
mod notifier;
mod payment_gateway;
mod user_directory;

pub use event_publisher::EventPublisher;
pub use event_repository::EventRepository;
pub use notifier::{Notification, NotificationDispatcher, NotificationKind};
pub use payment_gateway::{
    CallbackEvent, CallbackKind, CreateIntentRequest, GatewayError, GatewayErrorCode, IntentStatus,
    PaymentGateway, PaymentIntent, RefundReceipt,
};
pub use user_directory::{UserDirectory, UserProfile};
