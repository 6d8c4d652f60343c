use crate::config::ConfigManager;
use crate::storage::{JsonStorage, MemoryStorage, SqliteStorage, Storage};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("rtlists_test")
        .tempdir()
        .expect("Failed to create temporary directory")
}

/// A storage backend together with whatever keeps its files alive.
pub struct TestStorage {
    label: &'static str,
    storage: Box<dyn Storage>,
    _temp_dir: Option<TempDir>,
}

impl TestStorage {
    pub fn memory() -> Self {
        Self {
            label: "memory",
            storage: Box::new(MemoryStorage::new()),
            _temp_dir: None,
        }
    }

    pub fn json() -> Self {
        let temp_dir = temp_dir();
        let storage = JsonStorage::new(temp_dir.path().join("test_storage.json"))
            .expect("Failed to create test storage");
        Self {
            label: "json",
            storage: Box::new(storage),
            _temp_dir: Some(temp_dir),
        }
    }

    pub fn sqlite() -> Self {
        let temp_dir = temp_dir();
        let storage = SqliteStorage::new(temp_dir.path().join("test_storage.db"))
            .expect("Failed to create test storage");
        Self {
            label: "sqlite",
            storage: Box::new(storage),
            _temp_dir: Some(temp_dir),
        }
    }

    /// One instance of every backend, for behavior that must not differ.
    pub fn all() -> Vec<Self> {
        vec![Self::memory(), Self::json(), Self::sqlite()]
    }

    pub fn storage(&self) -> &dyn Storage {
        &*self.storage
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Creates a config manager whose config file and data file both live in a
/// temporary directory, so tests never touch the user's real setup.
pub fn create_test_config_manager() -> (ConfigManager, TempDir) {
    let temp_dir = temp_dir();
    let config_path = temp_dir.path().join("config.json");
    let mut manager =
        ConfigManager::new(Some(config_path.as_path())).expect("Failed to create config");
    let data_path = temp_dir.path().join("test-data.json");
    manager
        .set("storage.path", data_path.to_str().expect("utf-8 temp path"))
        .expect("Failed to set storage.path");
    (manager, temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_backend_starts_empty() {
        for backend in TestStorage::all() {
            let lists = backend.storage().all_lists().unwrap();
            assert!(lists.is_empty(), "{} should start empty", backend.label());
        }
    }

    #[test]
    fn test_backend_parity_for_raw_operations() {
        for backend in TestStorage::all() {
            let storage = backend.storage();
            let label = backend.label();

            let list_id = storage.create_new_list("Parity").unwrap();
            let a = storage.create_new_todo(list_id, "a").unwrap().unwrap();
            let b = storage.create_new_todo(list_id, "b").unwrap().unwrap();
            assert_eq!((a, b), (1, 2), "{label}");

            assert!(storage.update_todo_status(list_id, a, true).unwrap(), "{label}");
            assert!(!storage.update_todo_status(list_id, 42, true).unwrap(), "{label}");
            assert!(storage.delete_todo_from_list(list_id, b).unwrap(), "{label}");
            assert!(!storage.delete_todo_from_list(list_id, b).unwrap(), "{label}");

            assert!(storage.update_list_name(list_id, "Renamed").unwrap(), "{label}");
            assert!(!storage.update_list_name(list_id + 1, "Nope").unwrap(), "{label}");

            let list = storage.find_list(list_id).unwrap().unwrap();
            assert_eq!(list.name, "Renamed", "{label}");
            assert_eq!(list.todos.len(), 1, "{label}");
            assert!(list.todos[0].completed, "{label}");

            storage.reset().unwrap();
            assert!(storage.all_lists().unwrap().is_empty(), "{label}");
        }
    }

    #[test]
    fn test_backend_parity_for_ids_beyond_i64() {
        let huge = i64::MAX as u64 + 1;
        for backend in TestStorage::all() {
            let storage = backend.storage();
            let label = backend.label();
            let list_id = storage.create_new_list("Bounds").unwrap();
            storage.create_new_todo(list_id, "a").unwrap();

            for id in [huge, u64::MAX] {
                assert_eq!(storage.find_list(id).unwrap(), None, "{label}");
                assert!(!storage.update_list_name(id, "Nope").unwrap(), "{label}");
                assert_eq!(storage.create_new_todo(id, "b").unwrap(), None, "{label}");
                assert!(!storage.mark_all_todos_as_completed(id).unwrap(), "{label}");
                assert!(!storage.delete_todo_from_list(list_id, id).unwrap(), "{label}");
                assert!(!storage.update_todo_status(list_id, id, true).unwrap(), "{label}");
                assert!(!storage.update_todo_status(id, 1, true).unwrap(), "{label}");
                assert!(!storage.delete_list(id).unwrap(), "{label}");
            }
            assert_eq!(storage.all_lists().unwrap().len(), 1, "{label}");
        }
    }

    #[test]
    fn test_config_manager_fixture() {
        let (manager, _temp_dir) = create_test_config_manager();

        let storage_path = manager.get("storage.path").expect("Storage path not set");
        assert!(storage_path.contains("rtlists_test"));

        let storage = manager.create_storage().unwrap();
        assert!(storage.all_lists().is_ok());
    }
}
