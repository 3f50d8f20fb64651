//! Client-side data model.
//!
//! # Responsibility
//! - Mirror backend payloads (tasks, habits, calendar events, chat,
//!   analytics, health).
//! - Define the notification record derived from them.
//!
//! # Invariants
//! - Backend entities are read-only here; only requests mutate them.
//! - All timestamps are normalized to UTC.

pub mod chat;
pub mod event;
pub mod habit;
pub mod notification;
pub mod task;
pub mod timestamp;
