//! Reminder derivation and notification lifecycle.
//!
//! # Responsibility
//! - Derive notification candidates from task/habit state (`rules`).
//! - Keep the session's notification list deduplicated (`center`).
//!
//! # Invariants
//! - Rule evaluation is pure; only `NotificationCenter` holds state.

pub mod center;
pub mod rules;
