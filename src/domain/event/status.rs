//! Lifecycle status enums for the Event aggregate and attendee payments.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a bookable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Event has not started yet; registrations are open.
    Upcoming,

    /// Event is in progress; check-in is active, late registration allowed.
    Ongoing,

    /// Event has finished.
    Completed,

    /// Event was cancelled by the organizer.
    Cancelled,
}

impl EventStatus {
    /// Whether registrations and waitlist joins are accepted in this status.
    pub fn accepts_registrations(&self) -> bool {
        matches!(self, EventStatus::Upcoming | EventStatus::Ongoing)
    }

    /// Whether attendees may check in during this status.
    pub fn accepts_check_in(&self) -> bool {
        matches!(self, EventStatus::Upcoming | EventStatus::Ongoing)
    }

    /// Human-readable name for display and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment status of an attendee record.
///
/// Drives whether the record counts toward event capacity: a record is
/// *active* while NotApplicable, Pending, or Completed. Failed and
/// Refunded records remain for audit but occupy no slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Free event - no payment involved.
    NotApplicable,

    /// Payment intent created, awaiting gateway confirmation.
    Pending,

    /// Payment confirmed by the gateway.
    Completed,

    /// Payment failed or expired at the gateway.
    Failed,

    /// Payment was refunded after completion.
    Refunded,
}

impl PaymentStatus {
    /// Whether a record in this status counts toward capacity.
    pub fn counts_toward_capacity(&self) -> bool {
        matches!(
            self,
            PaymentStatus::NotApplicable | PaymentStatus::Pending | PaymentStatus::Completed
        )
    }

    /// Human-readable name for display and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentStatus::NotApplicable => "not_applicable",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}
