use std::collections::HashSet;

use tracing::{debug, error, trace, warn};

use crate::{
    error::{StorageError, StoreError, ValidationError},
    model::{Clock, ExerciseRecord, RecordInput, SystemClock},
    types::RecordId,
};

mod slot;
pub use slot::*;

/// Key the collection is persisted under
pub const STORAGE_KEY: &str = "fitnessExerciseTracker.exercises";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// Nothing was written because the collection hasn't been loaded yet
    Deferred,
}

/// Owns the exercise collection and keeps the durable slot in step with it
#[derive(Debug)]
pub struct RecordStore<S, C = SystemClock> {
    slot: S,
    clock: C,
    key: String,
    records: Vec<ExerciseRecord>,
    loaded: bool,
}

impl<S: DurableSlot> RecordStore<S, SystemClock> {
    pub fn new(slot: S) -> Self {
        Self::with_clock(slot, SystemClock)
    }
}

impl<S: DurableSlot, C: Clock> RecordStore<S, C> {
    pub fn with_clock(slot: S, clock: C) -> Self {
        Self {
            slot,
            clock,
            key: STORAGE_KEY.to_string(),
            records: Vec::new(),
            loaded: false,
        }
    }

    pub fn with_key<K: Into<String>>(mut self, key: K) -> Self {
        self.key = key.into();
        self
    }

    /// Replaces the in-memory collection with the persisted one.
    ///
    /// Whatever the outcome the store counts as loaded afterwards, so later
    /// mutations are written back. On error the collection is left empty.
    pub fn load(&mut self) -> Result<usize, StorageError> {
        self.loaded = true;
        self.records.clear();

        let Some(json) = self.slot.read(&self.key)? else {
            debug!(key = %self.key, "Nothing stored yet");
            return Ok(0);
        };

        let stored: Vec<ExerciseRecord> =
            serde_json::from_str(&json).map_err(|e| StorageError::Malformed {
                key: self.key.clone(),
                message: e.to_string(),
            })?;

        let mut seen = HashSet::with_capacity(stored.len());
        for mut record in stored {
            if record.name.trim().is_empty() {
                warn!(id = %record.id, "Skipping stored exercise with an empty name");
                continue;
            }
            if !seen.insert(record.id.clone()) {
                warn!(id = %record.id, "Skipping stored exercise with a duplicate id");
                continue;
            }
            if record.weight.is_some_and(|w| !w.is_finite() || w <= 0.0) {
                warn!(id = %record.id, weight = ?record.weight, "Dropping stored weight that is not a positive number");
                record.weight = None;
            }
            self.records.push(record);
        }

        debug!(key = %self.key, count = self.records.len(), "Loaded exercises");
        Ok(self.records.len())
    }

    /// Loads, logging and swallowing any failure
    pub fn load_or_empty(&mut self) -> usize {
        match self.load() {
            Ok(count) => count,
            Err(e) => {
                error!("Error loading exercises: {e}");
                0
            }
        }
    }

    /// Writes the whole collection to the slot
    pub fn save(&self) -> Result<SaveOutcome, StorageError> {
        if !self.loaded {
            trace!("Save skipped until the stored collection has been loaded");
            return Ok(SaveOutcome::Deferred);
        }

        let json = serde_json::to_string(&self.records).map_err(|e| StorageError::Write {
            key: self.key.clone(),
            message: e.to_string(),
        })?;
        self.slot.write(&self.key, &json)?;

        trace!(key = %self.key, count = self.records.len(), "Saved exercises");
        Ok(SaveOutcome::Written)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            error!("Error saving exercises: {e}");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn records(&self) -> &[ExerciseRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&ExerciseRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn fresh_id(&self) -> RecordId {
        loop {
            let id = RecordId::new_v4();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Appends a new record stamped with the current instant
    pub fn create(&mut self, input: RecordInput) -> Result<&ExerciseRecord, ValidationError> {
        let input = input.normalized()?;
        let record = ExerciseRecord::new(self.fresh_id(), input, self.clock.now());

        debug!(id = %record.id, name = %record.name, "Created exercise");
        self.records.push(record);
        self.persist();

        let index = self.records.len() - 1;
        Ok(&self.records[index])
    }

    /// Replaces the user supplied fields of an existing record, keeping its
    /// identity and creation stamps
    pub fn update(
        &mut self,
        id: &RecordId,
        input: RecordInput,
    ) -> Result<&ExerciseRecord, StoreError> {
        let input = input.normalized()?;
        let now = self.clock.now();

        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        self.records[index].replace(input, now);
        debug!(%id, "Updated exercise");
        self.persist();

        Ok(&self.records[index])
    }

    /// Removes the record, returning it. Absent ids are ignored
    pub fn delete(&mut self, id: &RecordId) -> Option<ExerciseRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        let record = self.records.remove(index);

        debug!(%id, "Deleted exercise");
        self.persist();

        Some(record)
    }
}
