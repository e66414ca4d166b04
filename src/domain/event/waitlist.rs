//! Waitlist entry entity - FIFO queue position for a full event.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// One user waiting for a freed slot on a full event.
///
/// Ordering is strict FIFO by `joined_at`; the aggregate keeps entries in
/// join order so vector order is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Waiting user.
    pub user_id: UserId,

    /// When the user joined the waitlist.
    pub joined_at: Timestamp,

    /// When a promotion offer was last extended to this entry, if any.
    ///
    /// Offers expire after a configurable window; an expired offer is
    /// requeued to the back of the queue on the next promotion pass.
    pub offered_at: Option<Timestamp>,
}

impl WaitlistEntry {
    /// Creates a new entry with no outstanding offer.
    pub fn new(user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            user_id,
            joined_at,
            offered_at: None,
        }
    }

    /// Whether this entry holds an offer that is still within its window.
    pub fn has_live_offer(&self, now: Timestamp, offer_window_hours: i64) -> bool {
        match self.offered_at {
            Some(offered_at) => now.is_before(&offered_at.add_hours(offer_window_hours)),
            None => false,
        }
    }

    /// Whether this entry holds an offer whose window has elapsed.
    pub fn has_expired_offer(&self, now: Timestamp, offer_window_hours: i64) -> bool {
        match self.offered_at {
            Some(offered_at) => !now.is_before(&offered_at.add_hours(offer_window_hours)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn new_entry_has_no_offer() {
        let entry = WaitlistEntry::new(user("u1"), Timestamp::now());
        assert!(entry.offered_at.is_none());
        assert!(!entry.has_live_offer(Timestamp::now(), 24));
        assert!(!entry.has_expired_offer(Timestamp::now(), 24));
    }

    #[test]
    fn offer_within_window_is_live() {
        let now = Timestamp::now();
        let mut entry = WaitlistEntry::new(user("u1"), now);
        entry.offered_at = Some(now);

        assert!(entry.has_live_offer(now.add_hours(23), 24));
        assert!(!entry.has_expired_offer(now.add_hours(23), 24));
    }

    #[test]
    fn offer_past_window_is_expired() {
        let now = Timestamp::now();
        let mut entry = WaitlistEntry::new(user("u1"), now);
        entry.offered_at = Some(now);

        assert!(!entry.has_live_offer(now.add_hours(25), 24));
        assert!(entry.has_expired_offer(now.add_hours(25), 24));
    }
}
