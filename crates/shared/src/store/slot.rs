use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::error::StorageError;

/// A synchronous string key-value store that survives reloads
pub trait DurableSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemorySlotInner {
    values: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-memory slot. Clones share the same storage, like two handles on one
/// browser profile
#[derive(Debug, Clone, Default)]
pub struct MemorySlot(Rc<RefCell<MemorySlotInner>>);

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        let slot = Self::new();
        slot.0.borrow_mut().values.insert(key.into(), value.into());
        slot
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().values.get(key).cloned()
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.0.borrow().writes
    }

    /// Makes subsequent reads fail as if storage were disabled
    pub fn fail_reads(&self, fail: bool) {
        self.0.borrow_mut().fail_reads = fail;
    }

    /// Makes subsequent writes fail as if the quota were exceeded
    pub fn fail_writes(&self, fail: bool) {
        self.0.borrow_mut().fail_writes = fail;
    }
}

impl DurableSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.0.borrow();
        if inner.fail_reads {
            return Err(StorageError::Read {
                key: key.to_string(),
                message: "storage is disabled".to_string(),
            });
        }
        Ok(inner.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.0.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Write {
                key: key.to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}
