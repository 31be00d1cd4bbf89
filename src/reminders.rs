//! Reminder schedule for recurring health events and medications.
//!
//! Only scheduling lives here. Delivering a reminder (email, SMS, calendar)
//! is the job of whatever consumes [`ReminderSchedule::upcoming`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ReminderId = u64;

/// Interval applied after a reminder is marked completed.
pub const COMPLETION_INTERVAL_HOURS: i64 = 24;

/// Allowed medication frequency in hours.
pub const MEDICATION_FREQUENCY_HOURS: std::ops::RangeInclusive<u32> = 1..=24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("reminder name cannot be empty")]
    EmptyName,
    #[error("medication dosage cannot be empty")]
    EmptyDosage,
    #[error("interval must be at least one minute")]
    InvalidInterval,
    #[error("medication frequency {0}h out of range [1, 24]")]
    InvalidFrequency(u32),
    #[error("no reminder with id {0}")]
    NotFound(ReminderId),
}

/// What a reminder is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReminderKind {
    Event { name: String },
    Medication { name: String, dosage: String },
}

/// A scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub kind: ReminderKind,
    pub interval_minutes: u32,
    pub next_due: DateTime<Utc>,
    pub last_completed: Option<DateTime<Utc>>,
    pub active: bool,
}

impl Reminder {
    /// Text to deliver through a notification channel.
    pub fn message(&self) -> String {
        match &self.kind {
            ReminderKind::Event { name } => format!("Reminder: {name}"),
            ReminderKind::Medication { name, dosage } => {
                format!("Reminder: Take {name} ({dosage})")
            }
        }
    }

    pub fn is_due_by(&self, deadline: DateTime<Utc>) -> bool {
        self.active && self.next_due <= deadline
    }
}

/// All reminders of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    reminders: Vec<Reminder>,
    next_id: ReminderId,
}

impl ReminderSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a recurring event. Re-setting an existing event replaces its schedule.
    pub fn set_reminder(
        &mut self,
        event: &str,
        interval_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<ReminderId, ReminderError> {
        let event = event.trim();
        if event.is_empty() {
            return Err(ReminderError::EmptyName);
        }
        if interval_minutes == 0 {
            return Err(ReminderError::InvalidInterval);
        }

        let next_due = now + Duration::minutes(i64::from(interval_minutes));
        let existing = self.reminders.iter_mut().find(|r| {
            matches!(&r.kind, ReminderKind::Event { name } if name == event)
        });

        let id = match existing {
            Some(reminder) => {
                reminder.interval_minutes = interval_minutes;
                reminder.next_due = next_due;
                reminder.active = true;
                reminder.id
            }
            None => self.push(
                ReminderKind::Event {
                    name: event.to_string(),
                },
                interval_minutes,
                next_due,
            ),
        };

        tracing::info!(event, %next_due, "Reminder set");
        Ok(id)
    }

    /// Schedule a medication taken every `frequency_hours`.
    pub fn add_medication_reminder(
        &mut self,
        name: &str,
        dosage: &str,
        frequency_hours: u32,
        now: DateTime<Utc>,
    ) -> Result<ReminderId, ReminderError> {
        let (name, dosage) = (name.trim(), dosage.trim());
        if name.is_empty() {
            return Err(ReminderError::EmptyName);
        }
        if dosage.is_empty() {
            return Err(ReminderError::EmptyDosage);
        }
        if !MEDICATION_FREQUENCY_HOURS.contains(&frequency_hours) {
            return Err(ReminderError::InvalidFrequency(frequency_hours));
        }

        let next_due = now + Duration::hours(i64::from(frequency_hours));
        let id = self.push(
            ReminderKind::Medication {
                name: name.to_string(),
                dosage: dosage.to_string(),
            },
            frequency_hours * 60,
            next_due,
        );

        tracing::info!(medication = name, id, "Added medication reminder");
        Ok(id)
    }

    /// Active reminders due before `now + horizon` (overdue included), soonest first.
    pub fn upcoming(&self, now: DateTime<Utc>, horizon: Duration) -> Vec<&Reminder> {
        let deadline = now + horizon;
        let mut due: Vec<&Reminder> = self
            .reminders
            .iter()
            .filter(|r| r.is_due_by(deadline))
            .collect();
        due.sort_by_key(|r| r.next_due);
        due
    }

    /// Record completion; the next reminder is due a day later.
    pub fn mark_completed(
        &mut self,
        id: ReminderId,
        now: DateTime<Utc>,
    ) -> Result<&Reminder, ReminderError> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReminderError::NotFound(id))?;

        reminder.last_completed = Some(now);
        reminder.next_due = now + Duration::hours(COMPLETION_INTERVAL_HOURS);
        tracing::info!(id, "Marked reminder as completed");
        Ok(reminder)
    }

    pub fn deactivate(&mut self, id: ReminderId) -> Result<(), ReminderError> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReminderError::NotFound(id))?;
        reminder.active = false;
        Ok(())
    }

    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.iter()
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    fn push(&mut self, kind: ReminderKind, interval_minutes: u32, next_due: DateTime<Utc>) -> ReminderId {
        self.next_id += 1;
        let id = self.next_id;
        self.reminders.push(Reminder {
            id,
            kind,
            interval_minutes,
            next_due,
            last_completed: None,
            active: true,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> Duration {
        Duration::hours(24)
    }

    #[test]
    fn test_set_reminder_schedules_and_replaces() {
        let now = Utc::now();
        let mut schedule = ReminderSchedule::new();

        let id = schedule.set_reminder("exercise", 30, now).unwrap();
        assert_eq!(schedule.get(id).unwrap().next_due, now + Duration::minutes(30));

        let again = schedule.set_reminder("exercise", 90, now).unwrap();
        assert_eq!(id, again);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.get(id).unwrap().next_due, now + Duration::minutes(90));
    }

    #[test]
    fn test_medication_reminder() {
        let now = Utc::now();
        let mut schedule = ReminderSchedule::new();

        let id = schedule
            .add_medication_reminder("Lisinopril", "10mg", 12, now)
            .unwrap();
        let reminder = schedule.get(id).unwrap();
        assert_eq!(reminder.next_due, now + Duration::hours(12));
        assert_eq!(reminder.message(), "Reminder: Take Lisinopril (10mg)");

        assert_eq!(
            schedule.add_medication_reminder("Aspirin", "81mg", 0, now),
            Err(ReminderError::InvalidFrequency(0))
        );
        assert_eq!(
            schedule.add_medication_reminder("Aspirin", " ", 8, now),
            Err(ReminderError::EmptyDosage)
        );
    }

    #[test]
    fn test_upcoming_window_and_order() {
        let now = Utc::now();
        let mut schedule = ReminderSchedule::new();
        let late = schedule.add_medication_reminder("Statin", "20mg", 20, now).unwrap();
        let soon = schedule.set_reminder("check blood pressure", 60, now).unwrap();
        schedule.set_reminder("annual checkup", 60 * 24 * 7, now).unwrap();

        let upcoming: Vec<_> = schedule.upcoming(now, day()).iter().map(|r| r.id).collect();
        assert_eq!(upcoming, vec![soon, late]);
    }

    #[test]
    fn test_upcoming_includes_overdue() {
        let now = Utc::now();
        let mut schedule = ReminderSchedule::new();
        // Due two and a half hours ago, never completed
        let overdue = schedule
            .set_reminder("take blood pressure", 30, now - Duration::hours(3))
            .unwrap();
        let soon = schedule.set_reminder("evening walk", 120, now).unwrap();

        let reminder = schedule.get(overdue).unwrap();
        assert!(reminder.next_due < now);
        assert!(reminder.is_due_by(now));

        let upcoming: Vec<_> = schedule.upcoming(now, day()).iter().map(|r| r.id).collect();
        assert_eq!(upcoming, vec![overdue, soon]);

        // Still reported with a zero-length window
        let due_now: Vec<_> = schedule
            .upcoming(now, Duration::zero())
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(due_now, vec![overdue]);
    }

    #[test]
    fn test_mark_completed_and_deactivate() {
        let now = Utc::now();
        let mut schedule = ReminderSchedule::new();
        let id = schedule.add_medication_reminder("Metoprolol", "25mg", 8, now).unwrap();

        let later = now + Duration::hours(9);
        let reminder = schedule.mark_completed(id, later).unwrap();
        assert_eq!(reminder.last_completed, Some(later));
        assert_eq!(reminder.next_due, later + Duration::hours(24));

        schedule.deactivate(id).unwrap();
        assert!(schedule.upcoming(later, Duration::days(7)).is_empty());

        assert_eq!(schedule.deactivate(99), Err(ReminderError::NotFound(99)));
    }
}
