//! Reminder refresh pipeline.
//!
//! # Responsibility
//! - Read tasks and habits through the dashboard cache.
//! - Run the rule engine, merge into the session center, dispatch new
//!   entries.
//!
//! # Invariants
//! - A failed read leaves the center untouched and delivers nothing.
//! - Only entries appended by this refresh are dispatched.

use crate::api::{ApiResult, DashboardApi};
use crate::delivery::dispatcher::{DeliveryReport, NotificationDispatcher};
use crate::model::habit::HabitFilter;
use crate::model::notification::Notification;
use crate::model::task::TaskFilter;
use crate::reminder::center::NotificationCenter;
use crate::reminder::rules::generate_notifications;
use crate::service::dashboard_service::DashboardService;
use crate::settings::NotificationSettings;
use chrono::{DateTime, TimeZone, Utc};
use log::{info, warn};
use std::sync::Arc;

/// Result of one refresh pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshOutcome {
    /// Entries first seen in this pass, in engine order.
    pub added: Vec<Notification>,
    pub delivery: DeliveryReport,
    /// Live entries after the merge.
    pub active: usize,
}

pub struct ReminderService<A: DashboardApi> {
    dashboard: Arc<DashboardService<A>>,
    center: NotificationCenter,
    dispatcher: NotificationDispatcher,
    task_filter: TaskFilter,
    habit_filter: HabitFilter,
}

impl<A: DashboardApi> ReminderService<A> {
    pub fn new(dashboard: Arc<DashboardService<A>>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            dashboard,
            center: NotificationCenter::new(),
            dispatcher,
            task_filter: TaskFilter::default(),
            habit_filter: HabitFilter::default(),
        }
    }

    pub fn dashboard(&self) -> &DashboardService<A> {
        &self.dashboard
    }

    pub fn dispatcher_mut(&mut self) -> &mut NotificationDispatcher {
        &mut self.dispatcher
    }

    /// Runs one refresh pass at `now`.
    ///
    /// The time zone of `now` decides calendar days for the rules.
    pub fn refresh<Tz: TimeZone>(
        &mut self,
        settings: &NotificationSettings,
        now: &DateTime<Tz>,
    ) -> ApiResult<RefreshOutcome> {
        let tasks = self.dashboard.tasks(&self.task_filter).map_err(|err| {
            warn!(
                "event=reminder_refresh module=service status=error source=tasks error_code={}",
                err.code()
            );
            err
        })?;
        let habits = self.dashboard.habits(&self.habit_filter).map_err(|err| {
            warn!(
                "event=reminder_refresh module=service status=error source=habits error_code={}",
                err.code()
            );
            err
        })?;

        let candidates = generate_notifications(&tasks, &habits, settings, now);
        let candidate_count = candidates.len();
        let added = self.center.merge(candidates);
        let delivery = self
            .dispatcher
            .dispatch(&added, settings, now.with_timezone(&Utc));

        info!(
            "event=reminder_refresh module=service status=ok tasks={} habits={} candidates={} added={} toasts={} desktop={}",
            tasks.len(),
            habits.len(),
            candidate_count,
            added.len(),
            delivery.toasts,
            delivery.desktop
        );

        Ok(RefreshOutcome {
            added,
            delivery,
            active: self.center.active_count(),
        })
    }

    pub fn dismiss(&mut self, id: &str) -> bool {
        self.center.dismiss(id)
    }

    pub fn dismiss_all(&mut self) -> usize {
        self.center.dismiss_all()
    }

    pub fn clear_all(&mut self) {
        self.center.clear_all();
    }

    pub fn active(&self) -> Vec<Notification> {
        self.center.active().cloned().collect()
    }

    pub fn center(&self) -> &NotificationCenter {
        &self.center
    }
}
