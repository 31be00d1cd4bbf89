//! Cardio Health Assistant CLI
//!
//! Track cardiovascular metrics, get recommendations and reports.

use anyhow::Context;
use cardio_health_assistant::{
    activity::{ActivityLog, SharedActivityLog},
    config::Config,
    core::{FieldSummary, SampleInput},
    HealthSession, ReminderKind, UserProfile, MEDICAL_DISCLAIMER, VERSION,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardio-health")]
#[command(version = VERSION)]
#[command(about = "Cardiovascular health tracking assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a sample, e.g. `record blood_pressure=120/80 heart_rate=72`
    Record {
        /// field=value pairs
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Show per-field statistics
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show health recommendations
    Recommend,

    /// Check the latest vitals for emergencies
    Alert {
        /// Show every firing alert instead of the most urgent one
        #[arg(long)]
        all: bool,
    },

    /// Generate a full health report
    Report {
        /// Write the report to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show or update the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage reminders
    Remind {
        #[command(subcommand)]
        action: RemindAction,
    },

    /// Show stored data and activity statistics
    Status,

    /// Show configuration
    Config,

    /// Display the medical disclaimer
    Disclaimer,

    /// Serve the HTTP query API on localhost
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind to
        #[arg(long, default_value = "8787")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
        /// Health goal, e.g. "lower my blood pressure"
        #[arg(long)]
        goal: Option<String>,
    },
}

#[derive(Subcommand)]
enum RemindAction {
    /// Remind about a recurring event
    Add {
        event: String,
        /// Interval in minutes
        #[arg(long, default_value = "1440")]
        every: u32,
    },
    /// Remind to take a medication
    Medication {
        name: String,
        dosage: String,
        /// Frequency in hours (1-24)
        #[arg(long, default_value = "24")]
        every_hours: u32,
    },
    /// List reminders due soon
    List {
        /// Show every reminder, not only upcoming ones
        #[arg(long)]
        all: bool,
    },
    /// Mark a reminder as done
    Done { id: u64 },
    /// Stop a reminder
    Off { id: u64 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("could not load configuration")?;

    match cli.command {
        Commands::Record { pairs } => cmd_record(&config, &pairs),
        Commands::Summary { json } => cmd_summary(&config, json),
        Commands::Recommend => cmd_recommend(&config),
        Commands::Alert { all } => cmd_alert(&config, all),
        Commands::Report { output } => cmd_report(&config, output),
        Commands::Profile { action } => cmd_profile(&config, action),
        Commands::Remind { action } => cmd_remind(&config, action),
        Commands::Status => cmd_status(&config),
        Commands::Config => cmd_config(&config),
        Commands::Disclaimer => {
            println!("{MEDICAL_DISCLAIMER}");
            Ok(())
        }
        #[cfg(feature = "server")]
        Commands::Serve { port } => cmd_serve(&config, port),
    }
}

fn open_session(config: &Config) -> anyhow::Result<HealthSession> {
    config
        .ensure_directories()
        .context("could not create data directories")?;
    HealthSession::open(config).context("could not open health session")
}

fn activity_log(config: &Config) -> SharedActivityLog {
    Arc::new(ActivityLog::with_persistence(config.activity_path()))
}

fn save_activity(activity: &ActivityLog) {
    if let Err(e) = activity.save() {
        eprintln!("Warning: Could not save activity stats: {e}");
    }
}

fn cmd_record(config: &Config, pairs: &[String]) -> anyhow::Result<()> {
    let mut session = open_session(config)?;
    let activity = activity_log(config);

    let input = SampleInput::parse_pairs(pairs)?;
    let sample = session.record(input)?;
    println!("Recorded at {}:", sample.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    for (field, value) in sample.values() {
        println!("  {}: {} {}", field.label(), value, field.unit());
    }
    activity.record_sample();

    if let Some(alert) = session.emergency_alert() {
        println!();
        println!("⚠ {alert}");
        activity.record_alerts(1);
    }

    save_activity(&activity);
    Ok(())
}

fn cmd_summary(config: &Config, json: bool) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let summary = session.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        println!("No health metrics recorded yet.");
        println!("Run 'cardio-health record heart_rate=72' to add one.");
        return Ok(());
    }

    println!("Health Summary");
    println!("==============");
    for (field, stats) in summary.iter() {
        match stats {
            FieldSummary::Numeric(s) => println!(
                "{:<20} avg {:>8.2}  min {:>8.2}  max {:>8.2}  last {:>8.2}  (n={})",
                field.label(),
                s.average,
                s.min,
                s.max,
                s.last,
                s.count
            ),
            FieldSummary::BloodPressure(s) => println!(
                "{:<20} avg {:.1}/{:.1}  min {}/{}  max {}/{}  last {}  (n={})",
                field.label(),
                s.systolic.average,
                s.diastolic.average,
                s.systolic.min,
                s.diastolic.min,
                s.systolic.max,
                s.diastolic.max,
                s.last,
                s.count
            ),
        }
    }
    Ok(())
}

fn cmd_recommend(config: &Config) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let recommendations = session.recommendations();
    println!("{}", session.personalize(&recommendations.to_string()));
    Ok(())
}

fn cmd_alert(config: &Config, all: bool) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let activity = activity_log(config);

    let alerts = if all {
        session.emergency_alerts()
    } else {
        session.emergency_alert().into_iter().collect()
    };

    if alerts.is_empty() {
        println!("No emergency detected in your latest readings.");
        return Ok(());
    }

    for alert in &alerts {
        println!("⚠ {alert}");
    }
    activity.record_alerts(alerts.len() as u64);
    save_activity(&activity);
    Ok(())
}

fn cmd_report(config: &Config, output: Option<PathBuf>) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let activity = activity_log(config);
    let report = session.report();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &report)
                .with_context(|| format!("could not write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{report}"),
    }

    activity.record_report();
    save_activity(&activity);
    Ok(())
}

fn cmd_profile(config: &Config, action: ProfileAction) -> anyhow::Result<()> {
    let mut session = open_session(config)?;

    match action {
        ProfileAction::Show => {
            let profile = session.profile();
            println!("Profile: {}", profile.describe());
            if let Some(gender) = &profile.gender {
                println!("  Gender: {gender}");
            }
            if let Some(goal) = &profile.goal {
                println!("  Goal: {goal}");
            }
        }
        ProfileAction::Set {
            name,
            age,
            gender,
            goal,
        } => {
            session.update_profile(UserProfile {
                name,
                age,
                gender,
                goal,
            })?;
            session.save()?;
            println!("Profile updated: {}", session.profile().describe());
        }
    }
    Ok(())
}

fn cmd_remind(config: &Config, action: RemindAction) -> anyhow::Result<()> {
    let mut session = open_session(config)?;
    let activity = activity_log(config);
    let now = Utc::now();

    match action {
        RemindAction::Add { event, every } => {
            let id = session.reminders_mut().set_reminder(&event, every, now)?;
            println!("Reminder #{id} set for '{event}' every {every} minutes.");
            activity.record_reminder();
        }
        RemindAction::Medication {
            name,
            dosage,
            every_hours,
        } => {
            let id = session
                .reminders_mut()
                .add_medication_reminder(&name, &dosage, every_hours, now)?;
            println!("Reminder #{id}: take {name} ({dosage}) every {every_hours}h.");
            activity.record_reminder();
        }
        RemindAction::List { all } => {
            let reminders: Vec<_> = if all {
                session.reminders().iter().collect()
            } else {
                session
                    .reminders()
                    .upcoming(now, config.reminder_horizon())
            };
            if reminders.is_empty() {
                println!("No reminders due.");
            }
            for reminder in reminders {
                let kind = match reminder.kind {
                    ReminderKind::Event { .. } => "event",
                    ReminderKind::Medication { .. } => "medication",
                };
                println!(
                    "#{:<4} {:<10} due {}  {}{}",
                    reminder.id,
                    kind,
                    reminder.next_due.format("%Y-%m-%d %H:%M UTC"),
                    reminder.message(),
                    if reminder.active { "" } else { " (off)" }
                );
            }
            return Ok(());
        }
        RemindAction::Done { id } => {
            let reminder = session.reminders_mut().mark_completed(id, now)?;
            println!(
                "Reminder #{id} completed. Next due {}.",
                reminder.next_due.format("%Y-%m-%d %H:%M UTC")
            );
        }
        RemindAction::Off { id } => {
            session.reminders_mut().deactivate(id)?;
            println!("Reminder #{id} turned off.");
        }
    }

    session.save()?;
    save_activity(&activity);
    Ok(())
}

fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let activity = activity_log(config);

    println!("Cardio Health Assistant Status");
    println!("==============================");
    println!();
    println!("User ID: {}", session.user_id());
    println!("Profile: {}", session.profile().describe());
    println!("Samples stored: {}", session.store().len());
    if let Some(latest) = session.store().latest_sample() {
        println!(
            "Last sample: {}",
            latest.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("Reminders: {}", session.reminders().len());
    println!(
        "Sample journal: {}",
        if config.persist_samples {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();
    println!("{}", activity.summary());
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(config: &Config, port: u16) -> anyhow::Result<()> {
    use cardio_health_assistant::server::{run, ServerConfig, ServerState};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    if !config.persist_samples {
        eprintln!("Warning: sample journal disabled, recorded samples will be lost on exit.");
    }

    let session = open_session(config)?;
    let state = ServerState::new(session).with_activity(activity_log(config));

    let runtime = tokio::runtime::Runtime::new()?;
    let (addr, shutdown_tx) = runtime.block_on(run(ServerConfig::new(port), state))?;

    println!("Cardio Health Assistant v{VERSION}");
    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("could not set Ctrl+C handler")?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    let _ = shutdown_tx.send(());
    runtime.block_on(tokio::time::sleep(Duration::from_millis(100)));
    Ok(())
}
