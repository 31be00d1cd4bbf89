//! Demonstration of a health-tracking session.
//!
//! This example shows how to:
//! 1. Record samples (BMI is derived from weight and height)
//! 2. Summarize the recorded metrics
//! 3. Get recommendations and emergency alerts
//! 4. Generate a report
//! 5. Schedule a medication reminder
//!
//! Run with: cargo run --example session_demo

use cardio_health_assistant::{HealthSession, SampleInput, UserProfile, MEDICAL_DISCLAIMER};
use chrono::{Duration, Utc};

fn main() -> anyhow::Result<()> {
    println!("Cardio Health Assistant - Session Demo");
    println!("======================================");
    println!("{MEDICAL_DISCLAIMER}");

    let mut session = HealthSession::new();
    session.update_profile(UserProfile {
        name: Some("Demo User".to_string()),
        age: Some(58),
        goal: Some("bring my blood pressure under 130/80".to_string()),
        ..Default::default()
    })?;

    let readings = [
        SampleInput::new()
            .with("blood_pressure", "138/88")
            .with("heart_rate", 76)
            .with("weight", 92.5)
            .with("height", 1.78),
        SampleInput::new()
            .with("cholesterol_total", 255.0)
            .with("cholesterol_ldl", 170.0)
            .with("cholesterol_hdl", 38.0),
        SampleInput::new()
            .with("blood_pressure", "142/91")
            .with("exercise_minutes", 40),
    ];

    for reading in readings {
        let sample = session.record(reading)?;
        println!("Recorded {} field(s) at {}", sample.len(), sample.timestamp);
    }

    // Malformed readings are rejected before reaching the store
    if let Err(e) = session.record(SampleInput::new().with("blood_pressure", "142-91")) {
        println!("Rejected sample: {e}");
    }

    println!();
    println!("{}", session.personalize(&session.recommendations().to_string()));

    println!();
    match session.emergency_alert() {
        Some(alert) => println!("ALERT: {alert}"),
        None => println!("No emergency detected."),
    }

    let now = Utc::now();
    session
        .reminders_mut()
        .add_medication_reminder("Amlodipine", "5mg", 24, now)?;
    println!();
    for reminder in session.reminders().upcoming(now, Duration::hours(24)) {
        println!("#{} {} at {}", reminder.id, reminder.message(), reminder.next_due);
    }

    println!();
    println!("{}", session.report());
    Ok(())
}
