//! Command handlers.
//!
//! Each handler follows the same shape: a command struct, a result type,
//! and a handler holding `Arc<dyn Port>` dependencies. Handlers that
//! mutate an aggregate run a bounded load-mutate-commit loop: on a
//! `VersionConflict` from the repository they reload and retry. External
//! calls (gateway, notifications) always happen outside that loop.

pub mod checkin;
pub mod event;
pub mod payment;
pub mod registration;
pub mod waitlist;

/// Upper bound on optimistic-lock retries before giving up.
pub(crate) const MAX_UPDATE_ATTEMPTS: u32 = 5;
