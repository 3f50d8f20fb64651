use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use echo_core::model::habit::{Habit, HabitFrequency};
use echo_core::model::task::{Task, TaskStatus};
use echo_core::{
    generate_notifications, NotificationCenter, NotificationKind, NotificationPriority,
    NotificationSettings,
};
use uuid::Uuid;

fn zone() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

/// 2024-03-15 10:00 at UTC+2.
fn now() -> DateTime<FixedOffset> {
    zone().with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
}

fn task_due(title: &str, offset: Duration) -> Task {
    let mut task = Task::new(Uuid::new_v4(), title);
    task.due_date = Some((now() + offset).with_timezone(&Utc));
    task
}

fn daily_habit(name: &str, last_completed: Option<DateTime<Utc>>) -> Habit {
    let mut habit = Habit::new(Uuid::new_v4(), name, HabitFrequency::Daily);
    habit.last_completed = last_completed;
    habit
}

fn defaults() -> NotificationSettings {
    NotificationSettings::default()
}

#[test]
fn task_due_yesterday_emits_one_overdue_notification() {
    let task = task_due("File taxes", -Duration::days(1));

    let out = generate_notifications(&[task.clone()], &[], &defaults(), &now());

    assert_eq!(out.len(), 1);
    let n = &out[0];
    assert_eq!(n.id, format!("overdue-{}", task.id));
    assert_eq!(n.kind, NotificationKind::Overdue);
    assert_eq!(n.priority, NotificationPriority::High);
    assert_eq!(n.title, "Overdue Task");
    assert_eq!(n.message, "\"File taxes\" was due on Mar 14");
    assert_eq!(n.task_id, Some(task.id));
    assert_eq!(n.created_at, now().with_timezone(&Utc));
}

#[test]
fn task_due_later_today_is_due_today_only() {
    let task = task_due("Standup notes", Duration::hours(3));

    let out = generate_notifications(&[task.clone()], &[], &defaults(), &now());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, format!("due-today-{}", task.id));
    assert_eq!(out[0].kind, NotificationKind::DueSoon);
    assert_eq!(out[0].priority, NotificationPriority::Medium);
    assert_eq!(out[0].title, "Due Today");
}

#[test]
fn task_that_passed_earlier_today_is_not_overdue() {
    let task = task_due("Morning review", -Duration::hours(2));

    let out = generate_notifications(&[task.clone()], &[], &defaults(), &now());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, format!("due-today-{}", task.id));
}

#[test]
fn task_due_tomorrow_is_low_priority() {
    let task = task_due("Book flights", Duration::hours(20));

    let out = generate_notifications(&[task.clone()], &[], &defaults(), &now());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, format!("due-tomorrow-{}", task.id));
    assert_eq!(out[0].priority, NotificationPriority::Low);
    assert_eq!(out[0].title, "Due Tomorrow");
    assert_eq!(out[0].message, "\"Book flights\" is due tomorrow");
}

#[test]
fn distant_and_undated_tasks_are_ignored() {
    let distant = task_due("Quarterly plan", Duration::days(3));
    let undated = Task::new(Uuid::new_v4(), "Someday");

    let out = generate_notifications(&[distant, undated], &[], &defaults(), &now());
    assert!(out.is_empty());
}

#[test]
fn completed_and_cancelled_tasks_are_ignored() {
    let mut done = task_due("Done", -Duration::days(2));
    done.status = TaskStatus::Completed;
    let mut dropped = task_due("Dropped", Duration::hours(1));
    dropped.status = TaskStatus::Cancelled;
    let mut active = task_due("Active", Duration::hours(1));
    active.status = TaskStatus::InProgress;

    let out = generate_notifications(&[done, dropped, active.clone()], &[], &defaults(), &now());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].task_id, Some(active.id));
}

#[test]
fn overdue_alerts_gate_only_the_overdue_rule() {
    let late = task_due("Late", -Duration::days(1));
    let today = task_due("Today", Duration::hours(1));
    let settings = NotificationSettings {
        overdue_alerts: false,
        ..defaults()
    };

    let out = generate_notifications(&[late, today.clone()], &[], &settings, &now());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, format!("due-today-{}", today.id));
}

#[test]
fn due_date_reminders_off_skips_all_task_rules() {
    let settings = NotificationSettings {
        due_date_reminders: false,
        ..defaults()
    };
    let tasks = [
        task_due("Late", -Duration::days(1)),
        task_due("Today", Duration::hours(1)),
    ];

    assert!(generate_notifications(&tasks, &[], &settings, &now()).is_empty());
}

#[test]
fn calendar_day_follows_the_time_zone_of_now() {
    // 23:30 UTC is already the next day at UTC+2.
    let mut task = Task::new(Uuid::new_v4(), "Late call");
    task.due_date = Some(Utc.with_ymd_and_hms(2024, 3, 15, 23, 30, 0).unwrap());
    let tasks = [task.clone()];

    let local = generate_notifications(&tasks, &[], &defaults(), &now());
    assert_eq!(local[0].id, format!("due-tomorrow-{}", task.id));

    let utc = generate_notifications(&tasks, &[], &defaults(), &now().with_timezone(&Utc));
    assert_eq!(utc[0].id, format!("due-today-{}", task.id));
}

#[test]
fn daily_habit_not_done_today_gets_a_reminder() {
    let yesterday = (now() - Duration::days(1)).with_timezone(&Utc);
    let pending = daily_habit("Stretch", Some(yesterday));
    let never = daily_habit("Read", None);
    let done = daily_habit("Walk", Some((now() - Duration::hours(1)).with_timezone(&Utc)));

    let out = generate_notifications(&[], &[pending.clone(), never.clone(), done], &defaults(), &now());

    let ids: Vec<_> = out.iter().map(|n| n.id.clone()).collect();
    assert_eq!(
        ids,
        vec![format!("habit-{}", pending.id), format!("habit-{}", never.id)]
    );
    assert!(out.iter().all(|n| n.kind == NotificationKind::HabitReminder));
    assert!(out.iter().all(|n| n.priority == NotificationPriority::Low));
    assert_eq!(out[0].message, "Don't forget to complete \"Stretch\" today");
}

#[test]
fn weekly_inactive_and_disabled_habits_are_skipped() {
    let weekly = Habit::new(Uuid::new_v4(), "Review", HabitFrequency::Weekly);
    let mut paused = daily_habit("Paused", None);
    paused.is_active = false;

    assert!(generate_notifications(&[], &[weekly, paused], &defaults(), &now()).is_empty());

    let settings = NotificationSettings {
        habit_reminders: false,
        ..defaults()
    };
    let habit = daily_habit("Stretch", None);
    assert!(generate_notifications(&[], &[habit], &settings, &now()).is_empty());
}

#[test]
fn streak_milestone_completed_today_raises_achievement() {
    let mut habit = daily_habit("Meditate", Some(now().with_timezone(&Utc)));
    habit.current_streak = 7;

    let out = generate_notifications(&[], &[habit.clone()], &defaults(), &now());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, format!("achievement-{}-7", habit.id));
    assert_eq!(out[0].kind, NotificationKind::Achievement);

    habit.current_streak = 8;
    assert!(generate_notifications(&[], &[habit.clone()], &defaults(), &now()).is_empty());

    habit.current_streak = 30;
    let settings = NotificationSettings {
        achievement_alerts: false,
        ..defaults()
    };
    assert!(generate_notifications(&[], &[habit], &settings, &now()).is_empty());
}

#[test]
fn output_orders_tasks_then_habits_then_achievements() {
    let task = task_due("Task", Duration::hours(1));
    let reminder = daily_habit("Pending", None);
    let mut streak = daily_habit("Streak", Some(now().with_timezone(&Utc)));
    streak.current_streak = 100;

    let out = generate_notifications(&[task], &[streak, reminder], &defaults(), &now());

    let kinds: Vec<_> = out.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::DueSoon,
            NotificationKind::HabitReminder,
            NotificationKind::Achievement
        ]
    );
}

#[test]
fn disabled_settings_yield_no_candidates() {
    let settings = NotificationSettings {
        enabled: false,
        ..defaults()
    };
    let tasks = [task_due("Late", -Duration::days(1)), task_due("Soon", Duration::hours(1))];
    let habits = [daily_habit("Stretch", None)];

    assert!(generate_notifications(&tasks, &habits, &settings, &now()).is_empty());
}

#[test]
fn multi_line_titles_are_flattened_in_messages() {
    let task = task_due("  Ship\n  release\tnotes ", Duration::hours(1));

    let out = generate_notifications(&[task], &[], &defaults(), &now());
    assert_eq!(out[0].message, "\"Ship release notes\" is due today");
}

#[test]
fn repeated_recomputation_never_grows_the_active_list() {
    let tasks = [task_due("Late", -Duration::days(1))];
    let habits = [daily_habit("Stretch", None)];
    let mut center = NotificationCenter::new();

    let first = center.merge(generate_notifications(&tasks, &habits, &defaults(), &now()));
    assert_eq!(first.len(), 2);

    for minutes in 1..5 {
        let later = now() + Duration::minutes(minutes);
        let added = center.merge(generate_notifications(&tasks, &habits, &defaults(), &later));
        assert!(added.is_empty());
    }
    assert_eq!(center.active_count(), 2);
}

#[test]
fn dismissed_condition_is_not_regenerated_until_clear_all() {
    let task = task_due("Late", -Duration::days(1));
    let tasks = [task.clone()];
    let id = format!("overdue-{}", task.id);
    let mut center = NotificationCenter::new();

    center.merge(generate_notifications(&tasks, &[], &defaults(), &now()));
    assert!(center.dismiss(&id));
    assert_eq!(center.active_count(), 0);

    let added = center.merge(generate_notifications(&tasks, &[], &defaults(), &now()));
    assert!(added.is_empty());
    assert_eq!(center.active_count(), 0);

    center.clear_all();
    assert_eq!(center.active_count(), 0);
    let added = center.merge(generate_notifications(&tasks, &[], &defaults(), &now()));
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].id, id);
}
