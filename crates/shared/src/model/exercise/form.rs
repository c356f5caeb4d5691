use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ExerciseRecord, RecordInput, NOTE_MAX_CHARS};
use crate::{error::ValidationError, model::ValidateModel};

/// The add/edit form fields exactly as typed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub note: String,
}

impl RecordForm {
    /// Trims and parses the fields, collecting every problem found
    pub fn parse(&self) -> Result<RecordInput, ValidationError> {
        let mut error_messages = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            error_messages.push("Exercise name is required".to_string());
        }

        let date = match self.date.trim() {
            "" => None,
            date => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(e) => {
                    error_messages.push(format!("Invalid date \"{date}\": {e}"));
                    None
                }
            },
        };

        let weight = match self.weight.trim() {
            "" => None,
            weight => match weight.parse::<f64>() {
                Ok(weight) => Some(weight),
                Err(e) => {
                    error_messages.push(format!("Invalid weight \"{weight}\": {e}"));
                    None
                }
            },
        };

        let note = match self.note.trim() {
            "" => None,
            note => Some(note.to_string()),
        };

        let input = RecordInput {
            name,
            date,
            weight,
            note,
        };

        if let Err(e) = input.validate() {
            for message in e.error_messages {
                if !error_messages.contains(&message) {
                    error_messages.push(message);
                }
            }
        }

        if error_messages.is_empty() {
            Ok(input)
        } else {
            Err(ValidationError { error_messages })
        }
    }
}

impl From<&ExerciseRecord> for RecordForm {
    fn from(record: &ExerciseRecord) -> Self {
        Self {
            name: record.name.clone(),
            date: record
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            weight: record
                .weight
                .filter(|w| w.is_finite() && *w > 0.0)
                .map(|w| w.to_string())
                .unwrap_or_default(),
            note: record.note.clone().unwrap_or_default(),
        }
    }
}

impl ValidateModel for RecordInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut error_messages = Vec::new();

        if self.name.trim().is_empty() {
            error_messages.push("Exercise name is required".to_string());
        }

        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight <= 0.0 {
                error_messages.push(format!("Weight must be a positive number, got {weight}"));
            }
        }

        if let Some(note) = &self.note {
            let chars = note.chars().count();
            if chars > NOTE_MAX_CHARS {
                error_messages.push(format!(
                    "Note must be at most {NOTE_MAX_CHARS} characters, got {chars}"
                ));
            }
        }

        if error_messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { error_messages })
        }
    }
}

impl RecordInput {
    /// Trims the name and note the way the form does before validating
    pub(crate) fn normalized(self) -> Result<Self, ValidationError> {
        let input = Self {
            name: self.name.trim().to_string(),
            note: self
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            ..self
        };
        input.validate()?;
        Ok(input)
    }
}
