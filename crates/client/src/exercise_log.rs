use gloo::utils::format::JsValueSerdeExt;
use serde::Serialize;
use shared::{
    model::RecordForm,
    query::SearchSubmit,
    session::{FormMode, FormSubmit},
    utils::tracing::configure_tracing_once as configure_tracing,
    ExerciseLog,
};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

use crate::{storage::LocalStorageSlot, utils::to_js_error};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    <JsValue as JsValueSerdeExt>::from_serde(value).map_err(to_js_error)
}

fn form_from_js(form: &JsValue) -> Result<RecordForm, JsValue> {
    JsValueSerdeExt::into_serde(form).map_err(to_js_error)
}

/// The page's handle on the exercise log, backed by `localStorage`
#[wasm_bindgen(js_name = ExerciseLog)]
pub struct WebExerciseLog {
    log: ExerciseLog<LocalStorageSlot>,
}

#[wasm_bindgen(js_class = ExerciseLog)]
impl WebExerciseLog {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebExerciseLog {
        configure_tracing();
        Self {
            log: ExerciseLog::open(LocalStorageSlot),
        }
    }

    /// Adds a record from `{ name, date, weight, note }` and returns its id
    #[wasm_bindgen(js_name = onCreate)]
    pub fn on_create(&mut self, form: JsValue) -> Result<String, JsValue> {
        let input = form_from_js(&form)?.parse().map_err(to_js_error)?;
        let id = self.log.on_create(input).map_err(to_js_error)?;
        Ok(id.to_string())
    }

    #[wasm_bindgen(js_name = onEdit)]
    pub fn on_edit(&mut self, id: String, form: JsValue) -> Result<(), JsValue> {
        let input = form_from_js(&form)?.parse().map_err(to_js_error)?;
        self.log.on_edit(&id.into(), input).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = onDelete)]
    pub fn on_delete(&mut self, id: String) -> bool {
        self.log.on_delete(&id.into()).is_some()
    }

    /// Returns the id of the created record, if the search term was added
    #[wasm_bindgen(js_name = onSearchSubmit)]
    pub fn on_search_submit(&mut self) -> Option<String> {
        match self.log.on_search_submit() {
            SearchSubmit::Created(id) => Some(id.to_string()),
            SearchSubmit::Matched(_) | SearchSubmit::Ignored => None,
        }
    }

    #[wasm_bindgen(getter = searchTerm)]
    pub fn search_term(&self) -> String {
        self.log.search_term().to_string()
    }

    #[wasm_bindgen(setter = searchTerm)]
    pub fn set_search_term(&mut self, term: String) {
        self.log.set_search_term(term);
    }

    #[wasm_bindgen(js_name = clearSearch)]
    pub fn clear_search(&mut self) {
        self.log.clear_search();
    }

    /// The grouped, sorted, filtered list to render
    pub fn groups(&self) -> Result<JsValue, JsValue> {
        to_js(&self.log.groups())
    }

    #[wasm_bindgen(js_name = emptyHint)]
    pub fn empty_hint(&self) -> Result<JsValue, JsValue> {
        to_js(&self.log.empty_hint())
    }

    #[wasm_bindgen(js_name = openAddForm)]
    pub fn open_add_form(&mut self) {
        self.log.open_add_form();
    }

    #[wasm_bindgen(js_name = beginEdit)]
    pub fn begin_edit(&mut self, id: String) -> Result<(), JsValue> {
        self.log.begin_edit(&id.into()).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn form(&self) -> Result<JsValue, JsValue> {
        to_js(self.log.form())
    }

    /// Replaces the form fields with `{ name, date, weight, note }`
    #[wasm_bindgen(js_name = setForm)]
    pub fn set_form(&mut self, form: JsValue) -> Result<(), JsValue> {
        *self.log.form_mut() = form_from_js(&form)?;
        Ok(())
    }

    /// `"hidden"`, `"adding"` or `"editing"`
    #[wasm_bindgen(getter = formMode)]
    pub fn form_mode(&self) -> String {
        match self.log.form_mode() {
            FormMode::Hidden => "hidden",
            FormMode::Adding => "adding",
            FormMode::Editing(_) => "editing",
        }
        .to_string()
    }

    /// Creates or updates from the form and returns the affected id
    #[wasm_bindgen(js_name = submitForm)]
    pub fn submit_form(&mut self) -> Result<String, JsValue> {
        let outcome = self.log.submit_form().map_err(to_js_error)?;
        Ok(match outcome {
            FormSubmit::Created(id) | FormSubmit::Updated(id) => id.to_string(),
        })
    }

    #[wasm_bindgen(js_name = cancelForm)]
    pub fn cancel_form(&mut self) {
        self.log.cancel_form();
    }

    #[wasm_bindgen(js_name = deleteEditing)]
    pub fn delete_editing(&mut self) -> bool {
        self.log.delete_editing().is_some()
    }
}

impl Default for WebExerciseLog {
    fn default() -> Self {
        Self::new()
    }
}
