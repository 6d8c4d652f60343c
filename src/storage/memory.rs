use super::{DocumentStore, StorageError};
use crate::models::StorageData;
use std::sync::{Mutex, MutexGuard};

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<StorageData>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: StorageData) -> Result<Self, StorageError> {
        data.validate()?;
        Ok(Self {
            data: Mutex::new(data),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StorageData>, StorageError> {
        self.data
            .lock()
            .map_err(|e| StorageError::Storage(format!("Failed to lock memory store: {}", e)))
    }
}

impl DocumentStore for MemoryStorage {
    fn read(&self) -> Result<StorageData, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn modify<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut StorageData) -> Result<T, StorageError>,
    {
        let mut data = self.lock()?;
        let mut draft = data.clone();
        let result = f(&mut draft)?;
        if draft.lists != data.lists {
            draft.touch();
            *data = draft;
        }
        Ok(result)
    }
}
