//! `echo` command-line client.
//!
//! # Responsibility
//! - Wire config, logging, the settings store and the reminder pipeline.
//! - Expose one-shot checks, a polling watch loop and settings edits.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use echo_core::db::open_db;
use echo_core::{
    init_logging, ApiError, ClientConfig, ConsoleToastSink, DashboardService, DesktopChannel,
    HttpDashboardApi, LogLevel, NotificationDispatcher, NotificationSettings, NotifyRustNotifier,
    ReminderService, SettingsStore, SqliteKvRepository, Ticker, ToastSink,
};
use log::{info, warn};

const APP_NAME: &str = "Echo";

#[derive(Debug, Parser)]
#[command(name = "echo", about = "Reminders and notifications for the Echo dashboard", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Backend base URL, overrides config and environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token, overrides config and environment.
    #[arg(long, global = true)]
    token: Option<String>,
    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh once and print active notifications.
    Check(CheckArgs),
    /// Refresh on every poll interval until stdin closes.
    Watch(WatchArgs),
    /// Show or change notification preferences.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Probe backend health.
    Health,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Emit JSON instead of one line per notification.
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    desktop: DesktopArgs,
}

#[derive(Debug, Args)]
struct WatchArgs {
    #[command(flatten)]
    desktop: DesktopArgs,
}

#[derive(Debug, Clone, Copy, Args)]
struct DesktopArgs {
    /// Request desktop notification permission and deliver OS notices too.
    #[arg(long)]
    desktop: bool,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print the current preferences as JSON.
    Show,
    /// Change one or more preferences.
    Set(SettingsSetArgs),
    /// Restore defaults.
    Reset,
}

#[derive(Debug, Args)]
struct SettingsSetArgs {
    #[arg(long)]
    enabled: Option<bool>,
    #[arg(long)]
    due_date_reminders: Option<bool>,
    #[arg(long)]
    habit_reminders: Option<bool>,
    #[arg(long)]
    overdue_alerts: Option<bool>,
    #[arg(long)]
    sound_enabled: Option<bool>,
    #[arg(long)]
    achievement_alerts: Option<bool>,
    /// Lead time for "due soon" reminders, clamped to 1..=24.
    #[arg(long)]
    reminder_hours: Option<u8>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    start_logging(&config, cli.verbose);

    let conn = open_db(config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    let mut store = SettingsStore::load(SqliteKvRepository::new(&conn));

    match cli.command {
        Commands::Check(args) => handle_check(&config, *store.settings(), args),
        Commands::Watch(args) => handle_watch(&config, *store.settings(), args),
        Commands::Settings(command) => handle_settings(&mut store, command),
        Commands::Health => handle_health(&config),
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match cli.config.clone().or_else(ClientConfig::default_path) {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    config.apply_env();
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.api_token = Some(token.clone());
    }
    Ok(config)
}

fn start_logging(config: &ClientConfig, verbose: bool) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        match config.log_level() {
            Ok(level) => level,
            Err(err) => {
                eprintln!("warning: {err}; using default level");
                LogLevel::build_default()
            }
        }
    };
    if let Err(err) = init_logging(level, &config.log_dir()) {
        eprintln!("warning: file logging disabled: {err}");
    }
}

/// Builds the reminder pipeline. The desktop channel is only attached, and
/// its permission only requested, when the user passed `--desktop`.
fn build_reminders(
    config: &ClientConfig,
    desktop: DesktopArgs,
) -> Result<ReminderService<HttpDashboardApi>> {
    let api = HttpDashboardApi::new(&config.api_config())?;
    let toasts: Arc<dyn ToastSink> = Arc::new(ConsoleToastSink::stderr());
    let dashboard = Arc::new(DashboardService::new(api, Arc::clone(&toasts)));

    let mut dispatcher = NotificationDispatcher::new(toasts);
    if desktop.desktop {
        let notifier = NotifyRustNotifier::new(APP_NAME).with_activation_handler(|tag| {
            info!("event=desktop_activate module=cli status=ok");
            eprintln!("opened notification {tag}");
        });
        dispatcher = dispatcher.with_desktop(DesktopChannel::new(Box::new(notifier)));
        let permission = dispatcher.request_desktop_permission();
        info!("event=cli_desktop module=cli status=requested permission={permission:?}");
    }

    Ok(ReminderService::new(dashboard, dispatcher))
}

fn handle_check(config: &ClientConfig, settings: NotificationSettings, args: CheckArgs) -> Result<()> {
    let mut reminders = build_reminders(config, args.desktop)?;
    let outcome = match reminders.refresh(&settings, &Local::now()) {
        Ok(outcome) => outcome,
        Err(err) => return Err(explain_api_error(&reminders, err)),
    };

    let active = reminders.active();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&active)?);
        return Ok(());
    }

    if active.is_empty() {
        println!("No active notifications.");
    }
    for notification in &active {
        println!(
            "[{}] {}: {}",
            notification.kind.as_str(),
            notification.title,
            notification.message
        );
    }
    info!(
        "event=cli_check module=cli status=ok active={} toasts={}",
        outcome.active, outcome.delivery.toasts
    );
    Ok(())
}

fn handle_watch(config: &ClientConfig, settings: NotificationSettings, args: WatchArgs) -> Result<()> {
    let reminders = Arc::new(Mutex::new(build_reminders(config, args.desktop)?));
    let worker = Arc::clone(&reminders);

    let guard = Ticker::new("echo-reminders", config.poll_interval())
        .fire_immediately(true)
        .spawn(move || {
            let mut reminders = worker.lock().unwrap_or_else(PoisonError::into_inner);
            match reminders.refresh(&settings, &Local::now()) {
                Ok(outcome) if !outcome.added.is_empty() => {
                    eprintln!("{} new, {} active", outcome.added.len(), outcome.active);
                }
                Ok(_) => {}
                Err(ApiError::Unauthorized) => {
                    eprintln!("Session expired; set ECHO_API_TOKEN or pass --token.");
                }
                Err(err) => eprintln!("refresh failed: {}", err.user_message()),
            }
        })
        .context("starting reminder ticker")?;

    eprintln!(
        "Watching every {}s; close stdin (Ctrl-D) to stop.",
        config.poll_interval().as_secs()
    );
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        if line.is_err() {
            break;
        }
    }
    guard.stop();
    info!("event=cli_watch module=cli status=stopped");
    Ok(())
}

fn handle_settings(
    store: &mut SettingsStore<SqliteKvRepository<'_>>,
    command: SettingsCommand,
) -> Result<()> {
    let settings = match command {
        SettingsCommand::Show => *store.settings(),
        SettingsCommand::Reset => store.reset()?,
        SettingsCommand::Set(args) => store.update(|settings| {
            let SettingsSetArgs {
                enabled,
                due_date_reminders,
                habit_reminders,
                overdue_alerts,
                sound_enabled,
                achievement_alerts,
                reminder_hours,
            } = args;
            let apply = |slot: &mut bool, value: Option<bool>| {
                if let Some(value) = value {
                    *slot = value;
                }
            };
            apply(&mut settings.enabled, enabled);
            apply(&mut settings.due_date_reminders, due_date_reminders);
            apply(&mut settings.habit_reminders, habit_reminders);
            apply(&mut settings.overdue_alerts, overdue_alerts);
            apply(&mut settings.sound_enabled, sound_enabled);
            apply(&mut settings.achievement_alerts, achievement_alerts);
            if let Some(hours) = reminder_hours {
                settings.reminder_hours = hours;
            }
        })?,
    };

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
    Ok(())
}

fn handle_health(config: &ClientConfig) -> Result<()> {
    let api = HttpDashboardApi::new(&config.api_config())?;
    let toasts: Arc<dyn ToastSink> = Arc::new(ConsoleToastSink::stderr());
    let dashboard = DashboardService::new(api, toasts);

    match dashboard.health() {
        Ok(status) => {
            println!(
                "backend: {} ({})",
                status.status,
                if status.is_healthy() { "healthy" } else { "degraded" }
            );
            if let Some(version) = &status.version {
                println!("backend version: {version}");
            }
            println!("client core: {}", echo_core::core_version());
            Ok(())
        }
        Err(err) => {
            warn!("event=cli_health module=cli status=error error_code={}", err.code());
            anyhow::bail!("backend unreachable: {}", err.user_message())
        }
    }
}

fn explain_api_error(reminders: &ReminderService<HttpDashboardApi>, err: ApiError) -> anyhow::Error {
    if reminders.dashboard().api().session().login_required() {
        return anyhow::anyhow!("Session expired; set ECHO_API_TOKEN or pass --token.");
    }
    anyhow::anyhow!(err.user_message())
}
