use crate::models::{List, StorageData};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub mod json;
pub mod memory;
mod migrations;
pub mod sqlite;
#[cfg(test)]
pub(crate) mod test_utils;

pub use json::JsonStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Duplicate list name: {0}")]
    DuplicateList(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Json,
    Sqlite,
}

impl StorageType {
    pub const VALID: &'static [&'static str] = &["json", "sqlite"];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageType::Json => "json",
            StorageType::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(StorageType::Json),
            "sqlite" => Ok(StorageType::Sqlite),
            other => Err(StorageError::Storage(format!(
                "Unknown storage type: {}",
                other
            ))),
        }
    }
}

/// The persistence collaborator behind the list manager.
///
/// Every method is atomic on its own; callers never need to hold a lock
/// across two calls. Mutations that target a missing list or todo report it
/// through their return value instead of failing.
pub trait Storage: Send + Sync {
    fn all_lists(&self) -> Result<Vec<List>, StorageError>;
    fn find_list(&self, list_id: u64) -> Result<Option<List>, StorageError>;
    fn create_new_list(&self, name: &str) -> Result<u64, StorageError>;
    fn update_list_name(&self, list_id: u64, name: &str) -> Result<bool, StorageError>;
    fn delete_list(&self, list_id: u64) -> Result<bool, StorageError>;
    fn create_new_todo(&self, list_id: u64, name: &str) -> Result<Option<u64>, StorageError>;
    fn delete_todo_from_list(&self, list_id: u64, todo_id: u64) -> Result<bool, StorageError>;
    fn update_todo_status(
        &self,
        list_id: u64,
        todo_id: u64,
        completed: bool,
    ) -> Result<bool, StorageError>;
    fn mark_all_todos_as_completed(&self, list_id: u64) -> Result<bool, StorageError>;
    /// Drops every list and todo.
    fn reset(&self) -> Result<(), StorageError>;
}

/// A backend that keeps all lists in one `StorageData` document.
pub trait DocumentStore: Send + Sync {
    fn read(&self) -> Result<StorageData, StorageError>;

    /// Applies `f` to the document and persists the result as one step.
    ///
    /// Nothing is written when `f` fails or leaves the lists untouched.
    fn modify<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut StorageData) -> Result<T, StorageError>;
}

impl<D: DocumentStore> Storage for D {
    fn all_lists(&self) -> Result<Vec<List>, StorageError> {
        Ok(self.read()?.lists)
    }

    fn find_list(&self, list_id: u64) -> Result<Option<List>, StorageError> {
        Ok(self.read()?.find_list(list_id).cloned())
    }

    fn create_new_list(&self, name: &str) -> Result<u64, StorageError> {
        self.modify(|data| data.create_list(name.to_string()))
    }

    fn update_list_name(&self, list_id: u64, name: &str) -> Result<bool, StorageError> {
        self.modify(|data| Ok(data.rename_list(list_id, name.to_string())))
    }

    fn delete_list(&self, list_id: u64) -> Result<bool, StorageError> {
        self.modify(|data| Ok(data.remove_list(list_id)))
    }

    fn create_new_todo(&self, list_id: u64, name: &str) -> Result<Option<u64>, StorageError> {
        self.modify(|data| data.add_todo(list_id, name.to_string()))
    }

    fn delete_todo_from_list(&self, list_id: u64, todo_id: u64) -> Result<bool, StorageError> {
        self.modify(|data| Ok(data.remove_todo(list_id, todo_id)))
    }

    fn update_todo_status(
        &self,
        list_id: u64,
        todo_id: u64,
        completed: bool,
    ) -> Result<bool, StorageError> {
        self.modify(|data| Ok(data.set_todo_completed(list_id, todo_id, completed)))
    }

    fn mark_all_todos_as_completed(&self, list_id: u64) -> Result<bool, StorageError> {
        self.modify(|data| Ok(data.complete_all(list_id)))
    }

    fn reset(&self) -> Result<(), StorageError> {
        self.modify(|data| {
            data.lists.clear();
            Ok(())
        })
    }
}

pub fn create_storage(
    storage_type: StorageType,
    path: &Path,
) -> Result<Box<dyn Storage>, StorageError> {
    tracing::debug!(%storage_type, path = %path.display(), "opening storage");
    match storage_type {
        StorageType::Json => Ok(Box::new(JsonStorage::new(path)?)),
        StorageType::Sqlite => Ok(Box::new(SqliteStorage::new(path)?)),
    }
}
