//! Registration-specific error types.
//!
//! Errors related to registration, waitlist, payment reconciliation, and
//! check-in operations.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | EventNotFound / UserNotFound / IntentNotFound | 404 |
//! | AlreadyRegistered / AlreadyWaitlisted / NotWaitlisted | 409 |
//! | EventFull / EventNotFull / NotRegistered | 409 |
//! | EventClosed | 410 |
//! | PaymentNotRequired / MalformedPayload / ValidationFailed | 400 |
//! | PaymentNotSucceeded / NoCompletedPayment | 402 |
//! | TokenMismatch | 401 |
//! | AlreadyUsed | 409 |
//! | ConfirmedButFull | 500 (alert) |
//! | GatewayFailed / Infrastructure | 502 / 500 |

use crate::domain::foundation::{DomainError, ErrorCode, EventId, Timestamp, UserId, ValidationError};

/// Registration lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Event was not found.
    EventNotFound(EventId),

    /// User does not exist in the user directory.
    UserNotFound(UserId),

    /// Event no longer accepts this operation (completed or cancelled).
    EventClosed {
        event_id: EventId,
        status: String,
    },

    /// User already holds an active registration for this event.
    AlreadyRegistered(UserId),

    /// Event is at capacity.
    EventFull {
        /// Whether the caller may join the waitlist instead.
        waitlist_open: bool,
    },

    /// No active registration exists for this user.
    NotRegistered(UserId),

    /// User is already on the waitlist.
    AlreadyWaitlisted(UserId),

    /// User is not on the waitlist.
    NotWaitlisted(UserId),

    /// Waitlist joins are only accepted while the event is full.
    EventNotFull {
        admitted: u32,
        capacity: u32,
    },

    /// Payment operations are not valid for a free event.
    PaymentNotRequired(EventId),

    /// No payment intent matches the given reference.
    IntentNotFound(String),

    /// The gateway does not report the payment as succeeded.
    PaymentNotSucceeded {
        reference: String,
        status: String,
    },

    /// Refund requires a completed payment.
    NoCompletedPayment(UserId),

    /// Payment succeeded but the event was full at confirmation time.
    /// The intent has been flagged for refund.
    ConfirmedButFull {
        reference: String,
    },

    /// Check-in payload could not be parsed.
    MalformedPayload(String),

    /// Presented token does not match the latest issued token.
    TokenMismatch,

    /// Token was already consumed; carries the original consumption time.
    AlreadyUsed {
        used_at: Timestamp,
    },

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Payment gateway call failed.
    GatewayFailed {
        reason: String,
        retryable: bool,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl RegistrationError {
    // Constructor functions for cleaner error creation

    pub fn event_not_found(id: EventId) -> Self {
        RegistrationError::EventNotFound(id)
    }

    pub fn user_not_found(user_id: UserId) -> Self {
        RegistrationError::UserNotFound(user_id)
    }

    pub fn event_closed(event_id: EventId, status: impl Into<String>) -> Self {
        RegistrationError::EventClosed {
            event_id,
            status: status.into(),
        }
    }

    pub fn already_registered(user_id: UserId) -> Self {
        RegistrationError::AlreadyRegistered(user_id)
    }

    pub fn event_full(waitlist_open: bool) -> Self {
        RegistrationError::EventFull { waitlist_open }
    }

    pub fn not_registered(user_id: UserId) -> Self {
        RegistrationError::NotRegistered(user_id)
    }

    pub fn already_waitlisted(user_id: UserId) -> Self {
        RegistrationError::AlreadyWaitlisted(user_id)
    }

    pub fn not_waitlisted(user_id: UserId) -> Self {
        RegistrationError::NotWaitlisted(user_id)
    }

    pub fn event_not_full(admitted: u32, capacity: u32) -> Self {
        RegistrationError::EventNotFull { admitted, capacity }
    }

    pub fn payment_not_required(event_id: EventId) -> Self {
        RegistrationError::PaymentNotRequired(event_id)
    }

    pub fn intent_not_found(reference: impl Into<String>) -> Self {
        RegistrationError::IntentNotFound(reference.into())
    }

    pub fn payment_not_succeeded(reference: impl Into<String>, status: impl Into<String>) -> Self {
        RegistrationError::PaymentNotSucceeded {
            reference: reference.into(),
            status: status.into(),
        }
    }

    pub fn no_completed_payment(user_id: UserId) -> Self {
        RegistrationError::NoCompletedPayment(user_id)
    }

    pub fn confirmed_but_full(reference: impl Into<String>) -> Self {
        RegistrationError::ConfirmedButFull {
            reference: reference.into(),
        }
    }

    pub fn malformed_payload(reason: impl Into<String>) -> Self {
        RegistrationError::MalformedPayload(reason.into())
    }

    pub fn already_used(used_at: Timestamp) -> Self {
        RegistrationError::AlreadyUsed { used_at }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RegistrationError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway_failed(reason: impl Into<String>, retryable: bool) -> Self {
        RegistrationError::GatewayFailed {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        RegistrationError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistrationError::EventNotFound(_) => ErrorCode::EventNotFound,
            RegistrationError::UserNotFound(_) => ErrorCode::UserNotFound,
            RegistrationError::EventClosed { .. } => ErrorCode::EventClosed,
            RegistrationError::AlreadyRegistered(_) => ErrorCode::AlreadyRegistered,
            RegistrationError::EventFull { .. } => ErrorCode::EventFull,
            RegistrationError::NotRegistered(_) => ErrorCode::NotRegistered,
            RegistrationError::AlreadyWaitlisted(_) => ErrorCode::AlreadyWaitlisted,
            RegistrationError::NotWaitlisted(_) => ErrorCode::NotWaitlisted,
            RegistrationError::EventNotFull { .. } => ErrorCode::EventNotFull,
            RegistrationError::PaymentNotRequired(_) => ErrorCode::PaymentNotRequired,
            RegistrationError::IntentNotFound(_) => ErrorCode::IntentNotFound,
            RegistrationError::PaymentNotSucceeded { .. } => ErrorCode::PaymentNotSucceeded,
            RegistrationError::NoCompletedPayment(_) => ErrorCode::NoCompletedPayment,
            RegistrationError::ConfirmedButFull { .. } => ErrorCode::ConfirmedButFull,
            RegistrationError::MalformedPayload(_) => ErrorCode::MalformedPayload,
            RegistrationError::TokenMismatch => ErrorCode::TokenMismatch,
            RegistrationError::AlreadyUsed { .. } => ErrorCode::TokenAlreadyUsed,
            RegistrationError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            RegistrationError::GatewayFailed { .. } => ErrorCode::GatewayError,
            RegistrationError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            RegistrationError::EventNotFound(id) => format!("Event not found: {}", id),
            RegistrationError::UserNotFound(user_id) => format!("User not found: {}", user_id),
            RegistrationError::EventClosed { event_id, status } => {
                format!("Event {} is {} and no longer accepts this operation", event_id, status)
            }
            RegistrationError::AlreadyRegistered(user_id) => {
                format!("User {} is already registered for this event", user_id)
            }
            RegistrationError::EventFull { waitlist_open } => {
                if *waitlist_open {
                    "Event is full - you can join the waitlist".to_string()
                } else {
                    "Event is full".to_string()
                }
            }
            RegistrationError::NotRegistered(user_id) => {
                format!("User {} is not registered for this event", user_id)
            }
            RegistrationError::AlreadyWaitlisted(user_id) => {
                format!("User {} is already on the waitlist", user_id)
            }
            RegistrationError::NotWaitlisted(user_id) => {
                format!("User {} is not on the waitlist", user_id)
            }
            RegistrationError::EventNotFull { admitted, capacity } => {
                format!(
                    "Event has free capacity ({}/{}) - register directly instead of waitlisting",
                    admitted, capacity
                )
            }
            RegistrationError::PaymentNotRequired(event_id) => {
                format!("Event {} is free - no payment is required", event_id)
            }
            RegistrationError::IntentNotFound(reference) => {
                format!("No payment intent found for reference {}", reference)
            }
            RegistrationError::PaymentNotSucceeded { reference, status } => {
                format!("Payment {} has not succeeded (gateway status: {})", reference, status)
            }
            RegistrationError::NoCompletedPayment(user_id) => {
                format!("User {} has no completed payment to refund", user_id)
            }
            RegistrationError::ConfirmedButFull { reference } => {
                format!(
                    "Payment {} succeeded but the event is full - flagged for refund",
                    reference
                )
            }
            RegistrationError::MalformedPayload(reason) => {
                format!("Check-in payload is malformed: {}", reason)
            }
            RegistrationError::TokenMismatch => {
                "Check-in token does not match the latest issued token".to_string()
            }
            RegistrationError::AlreadyUsed { used_at } => {
                format!("Check-in token was already used at {}", used_at)
            }
            RegistrationError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            RegistrationError::GatewayFailed { reason, .. } => {
                format!("Payment gateway call failed: {}", reason)
            }
            RegistrationError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistrationError::Infrastructure(_) => true,
            RegistrationError::GatewayFailed { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Returns true for invariant violations that warrant operator attention.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            RegistrationError::ConfirmedButFull { .. } | RegistrationError::AlreadyUsed { .. }
        )
    }
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for RegistrationError {}

impl From<ValidationError> for RegistrationError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field } => field.clone(),
            ValidationError::OutOfRange { field, .. } => field.clone(),
            ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        RegistrationError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for RegistrationError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => RegistrationError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::GatewayError => RegistrationError::GatewayFailed {
                reason: err.message,
                retryable: true,
            },
            _ => RegistrationError::Infrastructure(err.to_string()),
        }
    }
}

impl From<RegistrationError> for DomainError {
    fn from(err: RegistrationError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
