//! Reminder rule engine.
//!
//! # Responsibility
//! - Map (tasks, habits, settings, now) to an ordered candidate list.
//!
//! # Invariants
//! - Deterministic and side-effect free; safe to call on every refresh.
//! - At most one task rule fires per task, checked in the order overdue,
//!   due today, due tomorrow, due within the lead time.
//! - Calendar-day comparisons use the time zone carried by `now`.
//! - Notification ids depend only on category + source entity id.

use crate::model::habit::{Habit, HabitFrequency};
use crate::model::notification::{Notification, NotificationKind, NotificationPriority};
use crate::model::task::Task;
use crate::settings::NotificationSettings;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Streak lengths (in completions) that raise an achievement.
pub const ACHIEVEMENT_MILESTONES: &[u32] = &[7, 30, 100, 365];

const SECONDS_PER_HOUR: i64 = 3600;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Produces notification candidates for the current state.
///
/// Output order: task notifications in task order, then habit reminders,
/// then achievements. Returns an empty list when `settings.enabled` is off.
pub fn generate_notifications<Tz: TimeZone>(
    tasks: &[Task],
    habits: &[Habit],
    settings: &NotificationSettings,
    now: &DateTime<Tz>,
) -> Vec<Notification> {
    if !settings.enabled {
        return Vec::new();
    }

    let clock = RuleClock::new(now);
    let mut candidates = Vec::new();

    if settings.due_date_reminders {
        candidates.extend(
            tasks
                .iter()
                .filter_map(|task| task_notification(task, settings, &clock)),
        );
    }

    if settings.habit_reminders {
        candidates.extend(
            habits
                .iter()
                .filter(|habit| needs_daily_reminder(habit, &clock))
                .map(|habit| habit_reminder(habit, &clock)),
        );
    }

    if settings.achievement_alerts {
        candidates.extend(
            habits.iter().filter_map(|habit| achievement(habit, &clock)),
        );
    }

    candidates
}

/// `now` resolved once into the values every rule needs.
struct RuleClock<Tz: TimeZone> {
    now_utc: DateTime<Utc>,
    zone: Tz,
    today: NaiveDate,
}

impl<Tz: TimeZone> RuleClock<Tz> {
    fn new(now: &DateTime<Tz>) -> Self {
        Self {
            now_utc: now.with_timezone(&Utc),
            zone: now.timezone(),
            today: now.date_naive(),
        }
    }

    fn local_day(&self, instant: &DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }

    fn is_today(&self, instant: &DateTime<Utc>) -> bool {
        self.local_day(instant) == self.today
    }

    fn is_tomorrow(&self, instant: &DateTime<Utc>) -> bool {
        self.today.succ_opt() == Some(self.local_day(instant))
    }
}

fn task_notification<Tz: TimeZone>(
    task: &Task,
    settings: &NotificationSettings,
    clock: &RuleClock<Tz>,
) -> Option<Notification> {
    if !task.is_actionable() {
        return None;
    }
    let due = task.due_date?;
    let title = single_line(&task.title);

    let candidate = if due < clock.now_utc && !clock.is_today(&due) {
        if !settings.overdue_alerts {
            return None;
        }
        let due_local = due.with_timezone(&clock.zone).naive_local();
        Notification::new(
            format!("overdue-{}", task.id),
            NotificationKind::Overdue,
            "Overdue Task",
            format!("\"{title}\" was due on {}", due_local.format("%b %-d")),
            NotificationPriority::High,
            clock.now_utc,
        )
    } else if clock.is_today(&due) {
        Notification::new(
            format!("due-today-{}", task.id),
            NotificationKind::DueSoon,
            "Due Today",
            format!("\"{title}\" is due today"),
            NotificationPriority::Medium,
            clock.now_utc,
        )
    } else if clock.is_tomorrow(&due) {
        Notification::new(
            format!("due-tomorrow-{}", task.id),
            NotificationKind::DueSoon,
            "Due Tomorrow",
            format!("\"{title}\" is due tomorrow"),
            NotificationPriority::Low,
            clock.now_utc,
        )
    } else {
        let hours = hours_until(clock.now_utc, due)?;
        if hours > i64::from(settings.reminder_hours) {
            return None;
        }
        Notification::new(
            format!("due-soon-{}", task.id),
            NotificationKind::DueSoon,
            "Due Soon",
            format!("\"{title}\" is due in {}", pluralize_hours(hours)),
            NotificationPriority::Medium,
            clock.now_utc,
        )
    };

    Some(candidate.with_task(task.id))
}

fn needs_daily_reminder<Tz: TimeZone>(habit: &Habit, clock: &RuleClock<Tz>) -> bool {
    habit.is_active
        && habit.frequency == HabitFrequency::Daily
        && !habit
            .last_completed
            .is_some_and(|completed| clock.is_today(&completed))
}

fn habit_reminder<Tz: TimeZone>(habit: &Habit, clock: &RuleClock<Tz>) -> Notification {
    Notification::new(
        format!("habit-{}", habit.id),
        NotificationKind::HabitReminder,
        "Habit Reminder",
        format!(
            "Don't forget to complete \"{}\" today",
            single_line(&habit.name)
        ),
        NotificationPriority::Low,
        clock.now_utc,
    )
    .with_habit(habit.id)
}

fn achievement<Tz: TimeZone>(habit: &Habit, clock: &RuleClock<Tz>) -> Option<Notification> {
    let completed_today = habit
        .last_completed
        .is_some_and(|completed| clock.is_today(&completed));
    if !habit.is_active || !completed_today || !ACHIEVEMENT_MILESTONES.contains(&habit.current_streak)
    {
        return None;
    }

    Some(
        Notification::new(
            format!("achievement-{}-{}", habit.id, habit.current_streak),
            NotificationKind::Achievement,
            "Streak Milestone",
            format!(
                "\"{}\" reached a {}-day streak",
                single_line(&habit.name),
                habit.current_streak
            ),
            NotificationPriority::Low,
            clock.now_utc,
        )
        .with_habit(habit.id),
    )
}

/// Whole hours until `due`, rounded up; `None` when `due` is not ahead.
fn hours_until(now: DateTime<Utc>, due: DateTime<Utc>) -> Option<i64> {
    let seconds = (due - now).num_seconds();
    if seconds <= 0 {
        return None;
    }
    Some((seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR)
}

fn pluralize_hours(hours: i64) -> String {
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{hours} hours")
    }
}

fn single_line(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{hours_until, pluralize_hours, single_line};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn hours_until_rounds_up_and_rejects_past() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(hours_until(now, now + Duration::minutes(61)), Some(2));
        assert_eq!(hours_until(now, now + Duration::hours(3)), Some(3));
        assert_eq!(hours_until(now, now + Duration::seconds(1)), Some(1));
        assert_eq!(hours_until(now, now), None);
        assert_eq!(hours_until(now, now - Duration::hours(1)), None);
    }

    #[test]
    fn pluralizes_hour_counts() {
        assert_eq!(pluralize_hours(1), "1 hour");
        assert_eq!(pluralize_hours(5), "5 hours");
    }

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(single_line("  ship\n release\t notes "), "ship release notes");
    }
}
