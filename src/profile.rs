//! User profile and response personalisation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest accepted age.
pub const MAX_AGE: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("age {0} out of range [0, {MAX_AGE}]")]
    AgeOutOfRange(u32),
}

/// Personal details supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    /// Free-text health goal, e.g. "walk 10k steps a day"
    pub goal: Option<String>,
}

impl UserProfile {
    /// Merge the fields set in `update` into this profile.
    ///
    /// Blank strings clear the corresponding field.
    pub fn merge(&mut self, update: UserProfile) -> Result<(), ProfileError> {
        if let Some(age) = update.age {
            if age > MAX_AGE {
                return Err(ProfileError::AgeOutOfRange(age));
            }
            self.age = Some(age);
        }
        merge_text(&mut self.name, update.name);
        merge_text(&mut self.gender, update.gender);
        merge_text(&mut self.goal, update.goal);
        Ok(())
    }

    /// Append goal and age context to an assistant response.
    pub fn personalize(&self, response: &str) -> String {
        let mut out = response.to_string();
        if let Some(goal) = &self.goal {
            out.push_str(&format!("\n\nRemember, your goal is to {goal}!"));
        }
        if let Some(age) = self.age {
            out.push_str(&format!(
                " Based on your age of {age}, consider consulting your doctor for age-specific advice."
            ));
        }
        out
    }

    /// One-line description for display.
    pub fn describe(&self) -> String {
        match (&self.name, self.age) {
            (Some(name), Some(age)) => format!("{name}, age {age}"),
            (Some(name), None) => name.clone(),
            (None, Some(age)) => format!("age {age}"),
            (None, None) => "anonymous".to_string(),
        }
    }
}

fn merge_text(slot: &mut Option<String>, update: Option<String>) {
    if let Some(value) = update {
        let value = value.trim();
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }
}
