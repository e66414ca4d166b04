//! Event aggregate root.
//!
//! The aggregate owns every capacity decision: attendee records, the FIFO
//! waitlist, payment intent mirrors, and check-in tokens all live inside it
//! so that one compare-and-swap commit covers the whole state change.
//!
//! # Capacity Invariant
//!
//! `admitted_count() <= capacity` at all times. Admission and release are the
//! only two operations that move the count, and both go through this type.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::domain::foundation::{EventId, Timestamp, UserId, ValidationError};

use super::{
    generate_token_value, AttendeeRecord, CheckInToken, EventStatus, PaymentIntentRecord,
    RegistrationError, WaitlistEntry,
};

/// Outcome of an admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// The user now occupies a slot.
    Admitted,

    /// No free slot was available.
    Full,

    /// The user already holds an active registration.
    AlreadyAdmitted,
}

/// Outcome of a slot release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// An active registration was removed and its slot freed.
    Released,

    /// The user held no active registration.
    NotRegistered,
}

/// A bookable event and its full registration state.
///
/// `version` implements optimistic locking: the repository only persists an
/// aggregate whose version matches the stored one, and bumps it on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,

    /// Human-readable title.
    pub title: String,

    /// Maximum number of active attendees.
    pub capacity: u32,

    /// Whether registration requires payment.
    pub is_paid: bool,

    /// Ticket price in minor currency units (paid events only).
    pub price_minor: i64,

    /// ISO 4217 currency code (paid events only).
    pub currency: String,

    /// Lifecycle status.
    pub status: EventStatus,

    /// All attendee records, active and historical.
    pub attendees: Vec<AttendeeRecord>,

    /// FIFO waitlist, vector order is queue order.
    pub waitlist: Vec<WaitlistEntry>,

    /// Payment intent mirrors, newest last.
    pub intents: Vec<PaymentIntentRecord>,

    /// Check-in tokens, issued and consumed.
    pub tokens: Vec<CheckInToken>,

    /// Optimistic locking version.
    pub version: u64,

    /// When the event was created.
    pub created_at: Timestamp,

    /// When the event was last modified.
    pub updated_at: Timestamp,
}

impl Event {
    /// Creates a free event.
    pub fn free(
        id: EventId,
        title: impl Into<String>,
        capacity: u32,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        Self::validate_core(&title, capacity)?;

        Ok(Self {
            id,
            title,
            capacity,
            is_paid: false,
            price_minor: 0,
            currency: String::new(),
            status: EventStatus::Upcoming,
            attendees: Vec::new(),
            waitlist: Vec::new(),
            intents: Vec::new(),
            tokens: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a paid event.
    pub fn paid(
        id: EventId,
        title: impl Into<String>,
        capacity: u32,
        price_minor: i64,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let currency = currency.into();
        Self::validate_core(&title, capacity)?;

        if price_minor <= 0 {
            return Err(ValidationError::out_of_range(
                "price_minor",
                1,
                i64::MAX,
                price_minor,
            ));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "three-letter ISO 4217 code",
            ));
        }

        Ok(Self {
            id,
            title,
            capacity,
            is_paid: true,
            price_minor,
            currency: currency.to_lowercase(),
            status: EventStatus::Upcoming,
            attendees: Vec::new(),
            waitlist: Vec::new(),
            intents: Vec::new(),
            tokens: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn validate_core(title: &str, capacity: u32) -> Result<(), ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if capacity == 0 {
            return Err(ValidationError::out_of_range(
                "capacity",
                1,
                u32::MAX as i64,
                0,
            ));
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════
    // Capacity ledger
    // ════════════════════════════════════════════════════════════════════

    /// Number of active attendees (slots in use).
    pub fn admitted_count(&self) -> u32 {
        self.attendees.iter().filter(|a| a.is_active()).count() as u32
    }

    /// Whether every slot is taken.
    pub fn is_full(&self) -> bool {
        self.admitted_count() >= self.capacity
    }

    /// Returns the user's active attendee record, if any.
    pub fn active_attendee(&self, user_id: &UserId) -> Option<&AttendeeRecord> {
        self.attendees
            .iter()
            .find(|a| a.is_active() && &a.user_id == user_id)
    }

    /// Mutable variant of [`Event::active_attendee`].
    pub fn active_attendee_mut(&mut self, user_id: &UserId) -> Option<&mut AttendeeRecord> {
        self.attendees
            .iter_mut()
            .find(|a| a.is_active() && &a.user_id == user_id)
    }

    /// Attempts to seat a registration.
    ///
    /// On success the user is also removed from the waitlist, so an accepted
    /// promotion offer and a direct registration converge on the same state.
    pub fn admit(&mut self, record: AttendeeRecord, now: Timestamp) -> AdmitOutcome {
        if self.active_attendee(&record.user_id).is_some() {
            return AdmitOutcome::AlreadyAdmitted;
        }
        if self.is_full() {
            return AdmitOutcome::Full;
        }

        let user_id = record.user_id.clone();
        self.attendees.push(record);
        self.waitlist.retain(|e| e.user_id != user_id);
        self.touch(now);
        AdmitOutcome::Admitted
    }

    /// Removes an active registration, freeing its slot.
    ///
    /// Refunds do not go through here: they keep the record for audit via
    /// [`AttendeeRecord::mark_refunded`].
    pub fn release(&mut self, user_id: &UserId, now: Timestamp) -> ReleaseOutcome {
        let before = self.attendees.len();
        self.attendees
            .retain(|a| !(a.is_active() && &a.user_id == user_id));

        if self.attendees.len() == before {
            return ReleaseOutcome::NotRegistered;
        }
        self.touch(now);
        ReleaseOutcome::Released
    }

    // ════════════════════════════════════════════════════════════════════
    // Waitlist
    // ════════════════════════════════════════════════════════════════════

    /// Adds a user to the back of the waitlist.
    ///
    /// Returns the 1-based queue position. Joining is only allowed while
    /// the event is full, so a freed slot always goes through promotion.
    pub fn join_waitlist(
        &mut self,
        user_id: UserId,
        now: Timestamp,
    ) -> Result<u32, RegistrationError> {
        if self.active_attendee(&user_id).is_some() {
            return Err(RegistrationError::already_registered(user_id));
        }
        if !self.is_full() {
            return Err(RegistrationError::event_not_full(
                self.admitted_count(),
                self.capacity,
            ));
        }
        if self.waitlist.iter().any(|e| e.user_id == user_id) {
            return Err(RegistrationError::already_waitlisted(user_id));
        }

        self.waitlist.push(WaitlistEntry::new(user_id, now));
        self.touch(now);
        Ok(self.waitlist.len() as u32)
    }

    /// Removes a user from the waitlist. Returns false if they were not on it.
    pub fn leave_waitlist(&mut self, user_id: &UserId, now: Timestamp) -> bool {
        let before = self.waitlist.len();
        self.waitlist.retain(|e| &e.user_id != user_id);
        if self.waitlist.len() == before {
            return false;
        }
        self.touch(now);
        true
    }

    /// Returns the user's 1-based waitlist position.
    pub fn waitlist_position(&self, user_id: &UserId) -> Option<u32> {
        self.waitlist
            .iter()
            .position(|e| &e.user_id == user_id)
            .map(|i| i as u32 + 1)
    }

    /// Extends promotion offers for up to `freed` slots.
    ///
    /// Expired offers are first requeued to the back of the queue, then
    /// offers go to the frontmost entries that hold none. Returns the users
    /// who received a new offer, in queue order.
    pub fn extend_offers(
        &mut self,
        freed: u32,
        now: Timestamp,
        offer_window_hours: i64,
    ) -> Vec<UserId> {
        // Requeue lapsed offers so the next entries get their turn.
        let expired: Vec<WaitlistEntry> = {
            let mut expired = Vec::new();
            let mut kept = Vec::with_capacity(self.waitlist.len());
            for entry in self.waitlist.drain(..) {
                if entry.has_expired_offer(now, offer_window_hours) {
                    expired.push(entry);
                } else {
                    kept.push(entry);
                }
            }
            self.waitlist = kept;
            expired
        };
        for mut entry in expired {
            entry.offered_at = None;
            self.waitlist.push(entry);
        }

        let mut offered = Vec::new();
        for entry in self.waitlist.iter_mut() {
            if offered.len() as u32 >= freed {
                break;
            }
            if entry.has_live_offer(now, offer_window_hours) {
                continue;
            }
            entry.offered_at = Some(now);
            offered.push(entry.user_id.clone());
        }

        if !offered.is_empty() {
            self.touch(now);
        }
        offered
    }

    // ════════════════════════════════════════════════════════════════════
    // Payment intents
    // ════════════════════════════════════════════════════════════════════

    /// Returns the user's open (created or succeeded) intent, if any.
    pub fn open_intent(&self, user_id: &UserId) -> Option<&PaymentIntentRecord> {
        self.intents
            .iter()
            .find(|i| &i.user_id == user_id && i.state.is_open())
    }

    /// Looks up an intent by gateway reference.
    pub fn intent_by_reference(&self, reference: &str) -> Option<&PaymentIntentRecord> {
        self.intents.iter().find(|i| i.reference == reference)
    }

    /// Mutable variant of [`Event::intent_by_reference`].
    pub fn intent_by_reference_mut(&mut self, reference: &str) -> Option<&mut PaymentIntentRecord> {
        self.intents.iter_mut().find(|i| i.reference == reference)
    }

    /// Records a freshly-created intent. Superseded (failed or refunded)
    /// intents stay in the list for audit.
    pub fn record_intent(&mut self, intent: PaymentIntentRecord, now: Timestamp) {
        self.intents.push(intent);
        self.touch(now);
    }

    // ════════════════════════════════════════════════════════════════════
    // Check-in tokens
    // ════════════════════════════════════════════════════════════════════

    /// Issues a fresh check-in token for an active attendee.
    ///
    /// Any unused token the user already holds is replaced, so at most one
    /// token per user is ever valid.
    pub fn issue_token(
        &mut self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<CheckInToken, RegistrationError> {
        if self.active_attendee(user_id).is_none() {
            return Err(RegistrationError::not_registered(user_id.clone()));
        }

        self.tokens
            .retain(|t| !(&t.user_id == user_id && !t.is_used));

        let token = CheckInToken::new(user_id.clone(), generate_token_value(), now);
        self.tokens.push(token.clone());
        self.touch(now);
        Ok(token)
    }

    /// Returns the user's most recently issued token.
    pub fn latest_token(&self, user_id: &UserId) -> Option<&CheckInToken> {
        self.tokens.iter().rev().find(|t| &t.user_id == user_id)
    }

    /// Validates and consumes a check-in token.
    ///
    /// Token comparison is constant-time. Consumption happens in the same
    /// aggregate mutation as the attendee's check-in flag, so one commit
    /// covers both.
    pub fn check_in(
        &mut self,
        user_id: &UserId,
        presented_value: &str,
        now: Timestamp,
    ) -> Result<Timestamp, RegistrationError> {
        if self.active_attendee(user_id).is_none() {
            return Err(RegistrationError::not_registered(user_id.clone()));
        }

        let token = self
            .tokens
            .iter_mut()
            .rev()
            .find(|t| &t.user_id == user_id)
            .ok_or(RegistrationError::TokenMismatch)?;

        if !constant_time_str_eq(&token.value, presented_value) {
            return Err(RegistrationError::TokenMismatch);
        }
        if token.is_used {
            let used_at = token.used_at.unwrap_or(token.issued_at);
            return Err(RegistrationError::already_used(used_at));
        }

        token.consume(now);
        if let Some(attendee) = self.active_attendee_mut(user_id) {
            attendee.record_check_in(now);
        }
        self.touch(now);
        Ok(now)
    }

    /// Updates the modification timestamp.
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

/// Constant-time string equality over the byte representation.
fn constant_time_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
