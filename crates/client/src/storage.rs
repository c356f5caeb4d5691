use shared::{
    error::{describe_js_value, StorageError},
    store::DurableSlot,
};
use web_sys::Storage;

/// The browser's `localStorage`. Every access looks the storage object up
/// again so a disabled store surfaces as an error instead of a panic
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageSlot;

impl LocalStorageSlot {
    fn storage() -> Result<Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        window
            .local_storage()?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_string()))
    }
}

impl DurableSlot for LocalStorageSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Read {
                key: key.to_string(),
                message: describe_js_value(&e),
            })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: describe_js_value(&e),
            })
    }
}

