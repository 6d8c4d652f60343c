use super::{DocumentStore, StorageError};
use crate::models::StorageData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonStorage {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let raw = path.as_ref().to_string_lossy();
        if raw.trim().is_empty() {
            return Err(StorageError::Storage(
                "Storage path not configured".to_string(),
            ));
        }
        let path = PathBuf::from(shellexpand::tilde(&raw).to_string());
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StorageData, StorageError> {
        if !self.path.exists() {
            return Ok(StorageData::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StorageData::new());
        }

        let data: StorageData = serde_json::from_str(&contents)?;
        data.validate()?;
        Ok(data)
    }

    fn save(&self, data: &StorageData) -> Result<(), StorageError> {
        // Validate data before saving
        data.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;

        // Verify the write was successful by reading back
        let contents = std::fs::read_to_string(&self.path)?;
        let read_data: StorageData = serde_json::from_str(&contents)?;
        if read_data.lists.len() != data.lists.len() {
            return Err(StorageError::Storage(
                "Data integrity check failed".to_string(),
            ));
        }

        Ok(())
    }
}

impl DocumentStore for JsonStorage {
    fn read(&self) -> Result<StorageData, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Storage(format!("Failed to lock storage file: {}", e)))?;
        self.load()
    }

    fn modify<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut StorageData) -> Result<T, StorageError>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Storage(format!("Failed to lock storage file: {}", e)))?;
        let mut data = self.load()?;
        let before = data.lists.clone();
        let result = f(&mut data)?;
        if data.lists != before {
            data.touch();
            self.save(&data)?;
        }
        Ok(result)
    }
}
