use echo_core::db::{open_db, open_db_in_memory};
use echo_core::settings::{SETTINGS_STORAGE_KEY, MAX_REMINDER_HOURS, MIN_REMINDER_HOURS};
use echo_core::{KvRepository, NotificationSettings, RepoError, SettingsStore, SqliteKvRepository};

#[test]
fn fresh_store_starts_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    let store = SettingsStore::load(SqliteKvRepository::new(&conn));

    assert_eq!(*store.settings(), NotificationSettings::default());
    assert!(store.settings().enabled);
    assert_eq!(store.settings().reminder_hours, 24);
}

#[test]
fn updates_are_persisted_as_camel_case_json() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::new(&conn);
    let mut store = SettingsStore::load(&repo);

    store.set_reminder_hours(6).unwrap();
    store.update(|s| s.overdue_alerts = false).unwrap();

    let raw = repo.get(SETTINGS_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["reminderHours"], 6);
    assert_eq!(json["overdueAlerts"], false);
    assert_eq!(json["dueDateReminders"], true);
}

#[test]
fn settings_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo_client.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let mut store = SettingsStore::load(SqliteKvRepository::new(&conn));
        store.set_enabled(false).unwrap();
        store.set_reminder_hours(3).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SettingsStore::load(SqliteKvRepository::new(&conn));
    assert!(!store.settings().enabled);
    assert_eq!(store.settings().reminder_hours, 3);
}

#[test]
fn malformed_blob_falls_back_to_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::new(&conn);
    repo.put(SETTINGS_STORAGE_KEY, "{not json").unwrap();

    let store = SettingsStore::load(&repo);
    assert_eq!(*store.settings(), NotificationSettings::default());
}

#[test]
fn partial_blob_is_backfilled_and_clamped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::new(&conn);
    repo.put(SETTINGS_STORAGE_KEY, r#"{"soundEnabled":false,"reminderHours":72}"#)
        .unwrap();

    let store = SettingsStore::load(&repo);
    assert!(!store.settings().sound_enabled);
    assert!(store.settings().habit_reminders);
    assert_eq!(store.settings().reminder_hours, MAX_REMINDER_HOURS);
}

#[test]
fn one_bad_field_does_not_reset_the_others() {
    let cases = [
        ("300", MAX_REMINDER_HOURS),
        ("-1", MIN_REMINDER_HOURS),
        ("2.5", 3),
        ("null", MAX_REMINDER_HOURS),
        (r#""six""#, MAX_REMINDER_HOURS),
    ];

    for (raw_hours, expected) in cases {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKvRepository::new(&conn);
        let blob = format!(r#"{{"enabled":false,"overdueAlerts":false,"reminderHours":{raw_hours}}}"#);
        repo.put(SETTINGS_STORAGE_KEY, &blob).unwrap();

        let store = SettingsStore::load(&repo);
        assert!(!store.settings().enabled, "enabled lost for reminderHours={raw_hours}");
        assert!(!store.settings().overdue_alerts);
        assert_eq!(store.settings().reminder_hours, expected, "reminderHours={raw_hours}");
    }
}

#[test]
fn mistyped_switch_resets_only_that_switch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::new(&conn);
    repo.put(
        SETTINGS_STORAGE_KEY,
        r#"{"soundEnabled":"no","habitReminders":false,"reminderHours":4}"#,
    )
    .unwrap();

    let store = SettingsStore::load(&repo);
    assert!(store.settings().sound_enabled);
    assert!(!store.settings().habit_reminders);
    assert_eq!(store.settings().reminder_hours, 4);
}

#[test]
fn reminder_hours_are_clamped_on_update() {
    let conn = open_db_in_memory().unwrap();
    let mut store = SettingsStore::load(SqliteKvRepository::new(&conn));

    assert_eq!(store.set_reminder_hours(0).unwrap().reminder_hours, MIN_REMINDER_HOURS);
    assert_eq!(store.set_reminder_hours(200).unwrap().reminder_hours, MAX_REMINDER_HOURS);
}

#[test]
fn reset_restores_and_persists_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::new(&conn);
    let mut store = SettingsStore::load(&repo);
    store.update(|s| {
        s.enabled = false;
        s.achievement_alerts = false;
    })
    .unwrap();

    store.reset().unwrap();
    assert_eq!(*store.settings(), NotificationSettings::default());
    let reloaded = SettingsStore::load(&repo);
    assert_eq!(*reloaded.settings(), NotificationSettings::default());
}

struct FailingRepo;

impl KvRepository for FailingRepo {
    fn get(&self, _key: &str) -> echo_core::RepoResult<Option<String>> {
        Ok(None)
    }

    fn put(&self, key: &str, _value: &str) -> echo_core::RepoResult<()> {
        Err(RepoError::InvalidKey(key.to_string()))
    }

    fn delete(&self, _key: &str) -> echo_core::RepoResult<bool> {
        Ok(false)
    }
}

#[test]
fn failed_write_keeps_previous_value() {
    let mut store = SettingsStore::load(FailingRepo);

    assert!(store.set_enabled(false).is_err());
    assert!(store.settings().enabled);
}

#[test]
fn kv_repository_trims_keys_and_rejects_blank_ones() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::new(&conn);

    repo.put("  theme ", "dark").unwrap();
    assert_eq!(repo.get("theme").unwrap().as_deref(), Some("dark"));
    repo.put("theme", "light").unwrap();
    assert_eq!(repo.get(" theme").unwrap().as_deref(), Some("light"));

    assert!(repo.delete("theme").unwrap());
    assert!(!repo.delete("theme").unwrap());
    assert!(matches!(repo.get("   "), Err(RepoError::InvalidKey(_))));
}
