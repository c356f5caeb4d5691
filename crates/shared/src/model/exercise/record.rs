use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Maximum length of a record note, in characters
pub const NOTE_MAX_CHARS: usize = 30;

/// One logged exercise entry as it is held in memory and persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
    /// Creation timestamp in milliseconds since the epoch
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user supplied part of a record, already validated
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordInput {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub weight: Option<f64>,
    pub note: Option<String>,
}

impl RecordInput {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl ExerciseRecord {
    /// Builds a new record stamped with `now`
    pub(crate) fn new(id: RecordId, input: RecordInput, now: DateTime<Utc>) -> Self {
        let RecordInput {
            name,
            date,
            weight,
            note,
        } = input;

        Self {
            id,
            name,
            date,
            weight,
            note,
            order: now.timestamp_millis(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the user supplied fields. `updated_at` only moves when the
    /// date changes
    pub(crate) fn replace(&mut self, input: RecordInput, now: DateTime<Utc>) {
        if self.date != input.date {
            self.updated_at = now;
        }

        self.name = input.name;
        self.date = input.date;
        self.weight = input.weight;
        self.note = input.note;
    }

    pub fn matches(&self, term_lowercase: &str) -> bool {
        self.name.to_lowercase().contains(term_lowercase)
    }
}
