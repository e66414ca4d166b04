//! Payment gateway port for external payment processing.
//!
//! Defines the contract for one-off ticket payments against an external
//! gateway. Implementations handle intent creation, status lookup, refunds,
//! and callback verification.
//!
//! # Design
//!
//! - **Gateway agnostic**: interface works with any payment provider
//! - **One-off payments**: intents, not subscriptions
//! - **Idempotent**: operations can be safely retried with idempotency keys

use crate::domain::event::RegistrationError;
use crate::domain::foundation::{EventId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for payment gateway integrations.
///
/// Implementations must ensure idempotency for all operations: creating an
/// intent twice with the same idempotency key returns the same intent.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a payment intent with the gateway.
    ///
    /// Returns the gateway reference and a client secret the buyer uses to
    /// complete the payment.
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Fetch the current state of an intent by gateway reference.
    ///
    /// Confirmation never trusts a callback alone; this is the
    /// authoritative status check.
    async fn fetch_intent(&self, reference: &str) -> Result<PaymentIntent, GatewayError>;

    /// Refund a succeeded payment in full.
    async fn refund(&self, reference: &str) -> Result<RefundReceipt, GatewayError>;

    /// Verify a callback signature and parse the event.
    ///
    /// Returns the parsed event if valid, error if the signature is invalid
    /// or the timestamp falls outside the replay window.
    async fn verify_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CallbackEvent, GatewayError>;
}

/// Request to create a payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    /// Event the ticket is for (stored as metadata).
    pub event_id: EventId,

    /// Paying user (stored as metadata).
    pub user_id: UserId,

    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,
}

/// Payment intent as reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Gateway's intent reference.
    pub reference: String,

    /// Client secret for completing the payment.
    pub client_secret: String,

    /// Current intent status at the gateway.
    pub status: IntentStatus,

    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// ISO 4217 currency code.
    pub currency: String,
}

/// Intent status from the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Awaiting payment method / confirmation by the buyer.
    RequiresPayment,

    /// Payment is being processed.
    Processing,

    /// Payment completed successfully.
    Succeeded,

    /// Payment failed.
    Failed,

    /// Intent was cancelled before completion.
    Canceled,

    /// Unknown status from provider.
    Unknown(String),
}

impl IntentStatus {
    /// Whether the payment is complete and the seat may be granted.
    pub fn is_success(&self) -> bool {
        matches!(self, IntentStatus::Succeeded)
    }

    /// Short name for logs and error messages.
    pub fn display_name(&self) -> &str {
        match self {
            IntentStatus::RequiresPayment => "requires_payment",
            IntentStatus::Processing => "processing",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Failed => "failed",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Unknown(s) => s,
        }
    }
}

/// Receipt for a completed refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Gateway reference of the refunded intent.
    pub reference: String,

    /// Gateway's refund ID.
    pub refund_id: String,

    /// Refunded amount in minor currency units.
    pub amount_minor: i64,
}

/// Verified callback event from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEvent {
    /// Event ID from the gateway (for deduplication).
    pub id: String,

    /// What happened.
    pub kind: CallbackKind,

    /// Gateway reference of the intent concerned.
    pub reference: String,

    /// When the callback was signed (Unix timestamp).
    pub created_at: i64,
}

/// Types of gateway callbacks we handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    /// Payment completed successfully.
    PaymentSucceeded,

    /// Payment failed or expired.
    PaymentFailed,

    /// Refund completed.
    RefundCompleted,

    /// Unknown callback type.
    Unknown(String),
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    /// Create a payment declined error.
    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::PaymentDeclined, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            GatewayErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }

    /// Create an invalid callback error.
    pub fn invalid_callback(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidCallback, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for RegistrationError {
    fn from(err: GatewayError) -> Self {
        RegistrationError::gateway_failed(err.to_string(), err.retryable)
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Payment was declined.
    PaymentDeclined,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Invalid callback signature or stale timestamp.
    InvalidCallback,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::PaymentDeclined => "payment_declined",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::InvalidCallback => "invalid_callback",
            GatewayErrorCode::ProviderError => "provider_error",
            GatewayErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
