//! Payment gateway implementations.
//!
//! - `HttpPaymentGateway` - production adapter against the gateway's HTTP API
//! - `MockPaymentGateway` - scriptable in-process gateway for tests
//! - `CallbackVerifier` - HMAC signature verification for inbound callbacks

mod callback;
mod http_gateway;
mod mock_gateway;

pub use callback::{CallbackVerifier, SignatureHeader, SignatureParseError};
pub use http_gateway::{GatewayConfig, HttpPaymentGateway};
pub use mock_gateway::MockPaymentGateway;
