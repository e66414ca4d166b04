//! Gatherly - Event Capacity and Registration Lifecycle Engine
//!
//! This crate implements the booking core for capacity-bounded events:
//! registration, waitlisting with FIFO promotion offers, paid-ticket
//! reconciliation against an external gateway, and single-use check-in
//! tokens.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
