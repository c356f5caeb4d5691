//! Derives what the exercise list shows: filter by name, sort, then group
//! consecutive records by date.

use std::{cmp::Ordering, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    model::{Clock, ExerciseRecord, RecordInput},
    store::{DurableSlot, RecordStore},
    types::RecordId,
};

/// Records whose name contains `term`, ignoring case. A blank term keeps
/// everything
pub fn filter<'a>(records: &'a [ExerciseRecord], term: &str) -> Vec<&'a ExerciseRecord> {
    if term.trim().is_empty() {
        return records.iter().collect();
    }

    let term = term.to_lowercase();
    records.iter().filter(|r| r.matches(&term)).collect()
}

/// Display order: dated before undated, newest date first, then earliest
/// `updated_at` first
pub fn compare(a: &ExerciseRecord, b: &ExerciseRecord) -> Ordering {
    match (a.date, b.date) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (date_a, date_b) => date_b.cmp(&date_a).then(a.updated_at.cmp(&b.updated_at)),
    }
}

/// Sorts in display order. The sort is stable so records with equal keys keep
/// their input order
pub fn sort(records: &mut [&ExerciseRecord]) {
    records.sort_by(|a, b| compare(a, b));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "date")]
pub enum DateKey {
    Date(NaiveDate),
    NoDate,
}

impl DateKey {
    pub fn of(record: &ExerciseRecord) -> Self {
        record.date.map_or(DateKey::NoDate, DateKey::Date)
    }

    /// Heading shown above the group
    pub fn label(&self) -> String {
        match self {
            DateKey::Date(date) => date.format("%-m/%-d/%Y").to_string(),
            DateKey::NoDate => "No Date".to_string(),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateKey::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateKey::NoDate => write!(f, "no-date"),
        }
    }
}

/// A run of consecutive records sharing one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup<'a> {
    pub key: DateKey,
    pub label: String,
    pub records: Vec<&'a ExerciseRecord>,
}

/// Splits sorted records into runs. A new group starts whenever the date key
/// differs from the previous record's, so a date seen again later opens a
/// second group
pub fn group<'a>(sorted: &[&'a ExerciseRecord]) -> Vec<DateGroup<'a>> {
    let mut groups: Vec<DateGroup<'a>> = Vec::new();

    for &record in sorted {
        let key = DateKey::of(record);
        match groups.last_mut() {
            Some(current) if current.key == key => current.records.push(record),
            _ => groups.push(DateGroup {
                key,
                label: key.label(),
                records: vec![record],
            }),
        }
    }

    groups
}

/// Filter, sort and group in one go
pub fn project<'a>(records: &'a [ExerciseRecord], term: &str) -> Vec<DateGroup<'a>> {
    let mut visible = filter(records, term);
    sort(&mut visible);
    group(&visible)
}

/// What the empty list should tell the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EmptyHint {
    /// Nothing logged at all
    NoExercisesYet,
    /// The search matched nothing; submitting it would add `term`
    NoMatches { term: String },
}

pub fn empty_hint(records: &[ExerciseRecord], term: &str) -> Option<EmptyHint> {
    if !filter(records, term).is_empty() {
        return None;
    }

    if term.trim().is_empty() {
        Some(EmptyHint::NoExercisesYet)
    } else {
        Some(EmptyHint::NoMatches {
            term: term.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchSubmit {
    /// The term was blank
    Ignored,
    /// At least one existing name contains the term, nothing was created
    Matched(usize),
    /// Nothing matched so a record with just this name was created. The search
    /// term should be cleared
    Created(RecordId),
}

/// Handles the terminating key in the search box: adds the term as a new
/// exercise unless an existing name already contains it
pub fn resolve_search_submit<S: DurableSlot, C: Clock>(
    store: &mut RecordStore<S, C>,
    term: &str,
) -> SearchSubmit {
    if term.trim().is_empty() {
        return SearchSubmit::Ignored;
    }

    let matches = filter(store.records(), term).len();
    if matches > 0 {
        debug!(term, matches, "Search submit matched existing exercises");
        return SearchSubmit::Matched(matches);
    }

    match store.create(RecordInput::named(term)) {
        Ok(record) => SearchSubmit::Created(record.id.clone()),
        Err(e) => {
            debug!(term, "Search submit rejected: {e}");
            SearchSubmit::Ignored
        }
    }
}
