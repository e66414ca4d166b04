//! Attendee record entity - one registered user on one event.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::PaymentStatus;

/// A user's registration on an event.
///
/// Created by the registration flow (free path) or the payment reconciler
/// (paid path, at confirmation). Never mutated outside the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    /// Registered user.
    pub user_id: UserId,

    /// When the registration was recorded.
    pub registered_at: Timestamp,

    /// Payment state of this registration.
    pub payment_status: PaymentStatus,

    /// Opaque payment reference from the gateway (paid events only).
    pub payment_reference: Option<String>,

    /// Whether the attendee has checked in.
    pub checked_in: bool,

    /// When the attendee checked in (if they have).
    pub checked_in_at: Option<Timestamp>,
}

impl AttendeeRecord {
    /// Creates a record for a free registration.
    pub fn free(user_id: UserId, registered_at: Timestamp) -> Self {
        Self {
            user_id,
            registered_at,
            payment_status: PaymentStatus::NotApplicable,
            payment_reference: None,
            checked_in: false,
            checked_in_at: None,
        }
    }

    /// Creates a record for a confirmed paid registration.
    pub fn paid(user_id: UserId, payment_reference: String, registered_at: Timestamp) -> Self {
        Self {
            user_id,
            registered_at,
            payment_status: PaymentStatus::Completed,
            payment_reference: Some(payment_reference),
            checked_in: false,
            checked_in_at: None,
        }
    }

    /// Whether this record occupies a capacity slot and blocks re-registration.
    pub fn is_active(&self) -> bool {
        self.payment_status.counts_toward_capacity()
    }

    /// Marks the payment completed. Idempotent: re-marking a completed
    /// record is a no-op so duplicate gateway confirmations are safe.
    pub fn mark_payment_completed(&mut self, reference: &str) {
        if self.payment_status == PaymentStatus::Completed {
            return;
        }
        self.payment_status = PaymentStatus::Completed;
        self.payment_reference = Some(reference.to_string());
    }

    /// Marks the payment refunded. The record stays for audit but stops
    /// counting toward capacity.
    pub fn mark_refunded(&mut self) {
        self.payment_status = PaymentStatus::Refunded;
    }

    /// Records a successful check-in.
    pub fn record_check_in(&mut self, at: Timestamp) {
        self.checked_in = true;
        self.checked_in_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn free_record_is_active_and_unpaid() {
        let record = AttendeeRecord::free(user("u1"), Timestamp::now());
        assert!(record.is_active());
        assert_eq!(record.payment_status, PaymentStatus::NotApplicable);
        assert!(record.payment_reference.is_none());
        assert!(!record.checked_in);
    }

    #[test]
    fn paid_record_carries_reference() {
        let record = AttendeeRecord::paid(user("u1"), "pi_123".to_string(), Timestamp::now());
        assert!(record.is_active());
        assert_eq!(record.payment_status, PaymentStatus::Completed);
        assert_eq!(record.payment_reference.as_deref(), Some("pi_123"));
    }

    #[test]
    fn mark_payment_completed_is_idempotent() {
        let mut record = AttendeeRecord::paid(user("u1"), "pi_123".to_string(), Timestamp::now());
        record.mark_payment_completed("pi_456");
        // First completion wins; duplicate confirmations do not rewrite the reference.
        assert_eq!(record.payment_reference.as_deref(), Some("pi_123"));
        assert_eq!(record.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn refunded_record_frees_the_slot() {
        let mut record = AttendeeRecord::paid(user("u1"), "pi_123".to_string(), Timestamp::now());
        record.mark_refunded();
        assert!(!record.is_active());
        assert_eq!(record.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn record_check_in_sets_flag_and_time() {
        let mut record = AttendeeRecord::free(user("u1"), Timestamp::now());
        let at = Timestamp::now();
        record.record_check_in(at);
        assert!(record.checked_in);
        assert_eq!(record.checked_in_at, Some(at));
    }
}
