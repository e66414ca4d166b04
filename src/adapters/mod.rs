//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `gateway` - Payment gateway integrations (HTTP, mock)
//! - `memory` - In-memory persistence and messaging for tests
//! - `notify` - Notification dispatchers

pub mod gateway;
pub mod memory;
pub mod notify;
