use tracing::{debug, warn};

use crate::{
    error::{StoreError, ValidationError},
    model::{Clock, ExerciseRecord, RecordForm, RecordInput, SystemClock},
    query::{self, DateGroup, EmptyHint, SearchSubmit},
    store::{DurableSlot, RecordStore},
    types::RecordId,
};

/// Which form, if any, is open
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Hidden,
    Adding,
    Editing(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmit {
    Created(RecordId),
    Updated(RecordId),
}

/// All state behind the exercise page. Every user action goes through one of
/// the `on_*` handlers or the form methods
#[derive(Debug)]
pub struct ExerciseLog<S, C = SystemClock> {
    store: RecordStore<S, C>,
    search_term: String,
    form_mode: FormMode,
    form: RecordForm,
}

impl<S: DurableSlot> ExerciseLog<S, SystemClock> {
    /// Loads the stored collection, starting empty if that fails
    pub fn open(slot: S) -> Self {
        Self::from_store(RecordStore::new(slot))
    }
}

impl<S: DurableSlot, C: Clock> ExerciseLog<S, C> {
    pub fn from_store(mut store: RecordStore<S, C>) -> Self {
        if !store.is_loaded() {
            store.load_or_empty();
        }

        Self {
            store,
            search_term: String::new(),
            form_mode: FormMode::Hidden,
            form: RecordForm::default(),
        }
    }

    pub fn store(&self) -> &RecordStore<S, C> {
        &self.store
    }

    pub fn records(&self) -> &[ExerciseRecord] {
        self.store.records()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term<T: Into<String>>(&mut self, term: T) {
        self.search_term = term.into();
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
    }

    pub fn form_mode(&self) -> &FormMode {
        &self.form_mode
    }

    pub fn form(&self) -> &RecordForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordForm {
        &mut self.form
    }

    pub fn on_create(&mut self, input: RecordInput) -> Result<RecordId, ValidationError> {
        Ok(self.store.create(input)?.id.clone())
    }

    pub fn on_edit(&mut self, id: &RecordId, input: RecordInput) -> Result<(), StoreError> {
        self.store.update(id, input)?;
        Ok(())
    }

    pub fn on_delete(&mut self, id: &RecordId) -> Option<ExerciseRecord> {
        let deleted = self.store.delete(id);
        if matches!(&self.form_mode, FormMode::Editing(editing) if editing == id) {
            self.reset_form();
        }
        deleted
    }

    /// The terminating key was pressed in the search box
    pub fn on_search_submit(&mut self) -> SearchSubmit {
        let outcome = query::resolve_search_submit(&mut self.store, &self.search_term);
        if let SearchSubmit::Created(id) = &outcome {
            debug!(%id, "Added exercise from search");
            self.clear_search();
        }
        outcome
    }

    /// The grouped list for the current search
    pub fn groups(&self) -> Vec<DateGroup<'_>> {
        query::project(self.store.records(), &self.search_term)
    }

    pub fn empty_hint(&self) -> Option<EmptyHint> {
        query::empty_hint(self.store.records(), &self.search_term)
    }

    pub fn open_add_form(&mut self) {
        self.form = RecordForm::default();
        self.form_mode = FormMode::Adding;
    }

    /// Opens the form pre-filled with the record's fields
    pub fn begin_edit(&mut self, id: &RecordId) -> Result<(), StoreError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        self.form = RecordForm::from(record);
        self.form_mode = FormMode::Editing(id.clone());
        Ok(())
    }

    /// Creates or updates from the form, then closes it. The form stays open
    /// with its contents if validation fails
    pub fn submit_form(&mut self) -> Result<FormSubmit, StoreError> {
        let input = self.form.parse()?;

        let outcome = match &self.form_mode {
            FormMode::Editing(id) => {
                let id = id.clone();
                self.store.update(&id, input)?;
                FormSubmit::Updated(id)
            }
            FormMode::Adding | FormMode::Hidden => {
                FormSubmit::Created(self.store.create(input)?.id.clone())
            }
        };

        self.reset_form();
        Ok(outcome)
    }

    pub fn cancel_form(&mut self) {
        self.reset_form();
    }

    /// Deletes the record being edited. Only available while editing
    pub fn delete_editing(&mut self) -> Option<ExerciseRecord> {
        let FormMode::Editing(id) = &self.form_mode else {
            warn!("Delete requested without a record being edited");
            return None;
        };

        let id = id.clone();
        let deleted = self.store.delete(&id);
        self.reset_form();
        deleted
    }

    fn reset_form(&mut self) {
        self.form = RecordForm::default();
        self.form_mode = FormMode::Hidden;
    }
}
