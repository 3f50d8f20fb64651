//! Session notification list with dedup and dismissal tracking.
//!
//! # Responsibility
//! - Merge freshly generated candidates into the session list.
//! - Track dismissals so dismissed conditions are not resurrected.
//!
//! # Invariants
//! - One entry per notification id, in first-seen order.
//! - Live entries are never replaced by a merge (timestamp and state stay).
//! - Dismissed ids are excluded from re-creation until `clear_all`.
//! - Nothing here is persisted; a new session starts empty.

use crate::model::notification::Notification;
use indexmap::IndexMap;
use log::debug;

/// Authoritative in-memory notification list for one client session.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    entries: IndexMap<String, Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges candidates and returns the entries that were newly appended.
    ///
    /// Candidates whose id is already tracked (live or dismissed) are
    /// dropped.
    pub fn merge(&mut self, candidates: Vec<Notification>) -> Vec<Notification> {
        let mut appended = Vec::new();
        let mut skipped = 0usize;

        for candidate in candidates {
            if self.entries.contains_key(candidate.id.as_str()) {
                skipped += 1;
                continue;
            }
            appended.push(candidate.clone());
            self.entries.insert(candidate.id.clone(), candidate);
        }

        debug!(
            "event=notifications_merge module=reminder status=ok appended={} skipped={} tracked={}",
            appended.len(),
            skipped,
            self.entries.len()
        );
        appended
    }

    /// Dismisses one notification.
    ///
    /// Returns `false` when the id is unknown or already dismissed.
    pub fn dismiss(&mut self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if entry.is_live() => {
                entry.dismiss();
                debug!("event=notification_dismiss module=reminder status=ok");
                true
            }
            _ => false,
        }
    }

    /// Dismisses every live notification; returns how many changed.
    pub fn dismiss_all(&mut self) -> usize {
        let mut changed = 0;
        for entry in self.entries.values_mut().filter(|entry| entry.is_live()) {
            entry.dismiss();
            changed += 1;
        }
        changed
    }

    /// Drops every entry, including dismissal bookkeeping.
    pub fn clear_all(&mut self) {
        debug!(
            "event=notifications_clear module=reminder status=ok dropped={}",
            self.entries.len()
        );
        self.entries.clear();
    }

    /// Live (non-dismissed) notifications in first-seen order.
    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.entries.values().filter(|entry| entry.is_live())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.entries.get(id)
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.dismissed)
    }

    /// Number of tracked ids, live and dismissed.
    pub fn tracked_len(&self) -> usize {
        self.entries.len()
    }
}
