use super::migrations;
use super::{Storage, StorageError};
use crate::models::{List, Todo};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Ids above `i64::MAX` cannot be stored, so they never match a row.
fn sql_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

/// One past `max`, never below 1.
fn next_sql_id(max: i64, kind: &str) -> Result<i64, StorageError> {
    max.max(0)
        .checked_add(1)
        .ok_or_else(|| StorageError::InvalidData(format!("no {} ids left to assign", kind)))
}

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let raw = path.as_ref().to_string_lossy();
        if raw.trim().is_empty() {
            return Err(StorageError::Storage(
                "Storage path not configured".to_string(),
            ));
        }
        let path = PathBuf::from(shellexpand::tilde(&raw).to_string());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)
            .map_err(|e| StorageError::Storage(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Storage(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn get_connection(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Storage(format!("Failed to lock connection: {}", e)))
    }

    fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<(u64, Todo)> {
        Ok((
            row.get(0)?,
            Todo {
                id: row.get(1)?,
                name: row.get(2)?,
                completed: row.get(3)?,
            },
        ))
    }

    fn load_todos(conn: &Connection, list_id: i64) -> Result<Vec<Todo>, StorageError> {
        let mut stmt = conn
            .prepare(
                "SELECT list_id, id, name, completed FROM todos WHERE list_id = ?1 ORDER BY id",
            )
            .map_err(|e| StorageError::Storage(format!("Failed to prepare todos query: {}", e)))?;

        let todos = stmt
            .query_map(params![list_id], Self::todo_from_row)?
            .map(|row| row.map(|(_, todo)| todo))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Storage(format!("Failed to read todo: {}", e)))?;
        Ok(todos)
    }

    fn list_exists(conn: &Connection, list_id: i64) -> Result<bool, StorageError> {
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM lists WHERE id = ?1", params![list_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}

impl Storage for SqliteStorage {
    fn all_lists(&self) -> Result<Vec<List>, StorageError> {
        let conn = self.get_connection()?;

        let mut stmt = conn
            .prepare("SELECT id, name FROM lists ORDER BY id")
            .map_err(|e| StorageError::Storage(format!("Failed to prepare lists query: {}", e)))?;
        let mut lists = stmt
            .query_map([], |row| Ok(List::new(row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Storage(format!("Failed to read list: {}", e)))?;

        let positions: HashMap<u64, usize> = lists
            .iter()
            .enumerate()
            .map(|(index, list)| (list.id, index))
            .collect();

        let mut stmt = conn
            .prepare("SELECT list_id, id, name, completed FROM todos ORDER BY list_id, id")
            .map_err(|e| StorageError::Storage(format!("Failed to prepare todos query: {}", e)))?;
        for row in stmt.query_map([], Self::todo_from_row)? {
            let (list_id, todo) =
                row.map_err(|e| StorageError::Storage(format!("Failed to read todo: {}", e)))?;
            let index = positions.get(&list_id).ok_or_else(|| {
                StorageError::InvalidData(format!(
                    "todo {} references non-existent list {}",
                    todo.id, list_id
                ))
            })?;
            lists[*index].todos.push(todo);
        }

        Ok(lists)
    }

    fn find_list(&self, list_id: u64) -> Result<Option<List>, StorageError> {
        let Some(list_id) = sql_id(list_id) else {
            return Ok(None);
        };
        let conn = self.get_connection()?;
        let list = conn
            .query_row(
                "SELECT id, name FROM lists WHERE id = ?1",
                params![list_id],
                |row| Ok(List::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match list {
            Some(mut list) => {
                list.todos = Self::load_todos(&conn, list_id)?;
                Ok(Some(list))
            }
            None => Ok(None),
        }
    }

    fn create_new_list(&self, name: &str) -> Result<u64, StorageError> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let max: i64 = tx.query_row("SELECT COALESCE(MAX(id), 0) FROM lists", [], |row| {
            row.get(0)
        })?;
        let id = next_sql_id(max, "list")?;
        tx.execute(
            "INSERT INTO lists (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        tx.commit()?;
        Ok(id as u64)
    }

    fn update_list_name(&self, list_id: u64, name: &str) -> Result<bool, StorageError> {
        let Some(list_id) = sql_id(list_id) else {
            return Ok(false);
        };
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "UPDATE lists SET name = ?1 WHERE id = ?2",
            params![name, list_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_list(&self, list_id: u64) -> Result<bool, StorageError> {
        let Some(list_id) = sql_id(list_id) else {
            return Ok(false);
        };
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM todos WHERE list_id = ?1", params![list_id])?;
        let changed = tx.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn create_new_todo(&self, list_id: u64, name: &str) -> Result<Option<u64>, StorageError> {
        let Some(list_id) = sql_id(list_id) else {
            return Ok(None);
        };
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        if !Self::list_exists(&tx, list_id)? {
            return Ok(None);
        }
        let max: i64 = tx.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM todos WHERE list_id = ?1",
            params![list_id],
            |row| row.get(0),
        )?;
        let id = next_sql_id(max, "todo")?;
        tx.execute(
            "INSERT INTO todos (list_id, id, name, completed) VALUES (?1, ?2, ?3, 0)",
            params![list_id, id, name],
        )?;
        tx.commit()?;
        Ok(Some(id as u64))
    }

    fn delete_todo_from_list(&self, list_id: u64, todo_id: u64) -> Result<bool, StorageError> {
        let (Some(list_id), Some(todo_id)) = (sql_id(list_id), sql_id(todo_id)) else {
            return Ok(false);
        };
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "DELETE FROM todos WHERE list_id = ?1 AND id = ?2",
            params![list_id, todo_id],
        )?;
        Ok(changed > 0)
    }

    fn update_todo_status(
        &self,
        list_id: u64,
        todo_id: u64,
        completed: bool,
    ) -> Result<bool, StorageError> {
        let (Some(list_id), Some(todo_id)) = (sql_id(list_id), sql_id(todo_id)) else {
            return Ok(false);
        };
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "UPDATE todos SET completed = ?1 WHERE list_id = ?2 AND id = ?3",
            params![completed, list_id, todo_id],
        )?;
        Ok(changed > 0)
    }

    fn mark_all_todos_as_completed(&self, list_id: u64) -> Result<bool, StorageError> {
        let Some(list_id) = sql_id(list_id) else {
            return Ok(false);
        };
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        if !Self::list_exists(&tx, list_id)? {
            return Ok(false);
        }
        tx.execute(
            "UPDATE todos SET completed = 1 WHERE list_id = ?1",
            params![list_id],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn reset(&self) -> Result<(), StorageError> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM todos", [])?;
        tx.execute("DELETE FROM lists", [])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_storage_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage_path = temp_dir.path().join("lists.db");
        let storage = SqliteStorage::new(&storage_path);
        assert!(storage.is_ok());
        assert!(storage_path.exists());
    }

    #[test]
    fn test_sqlite_persists_across_connections() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage_path = temp_dir.path().join("lists.db");
        {
            let storage = SqliteStorage::new(&storage_path).unwrap();
            let list_id = storage.create_new_list("Garden").unwrap();
            let todo_id = storage.create_new_todo(list_id, "Weed").unwrap().unwrap();
            assert!(storage.update_todo_status(list_id, todo_id, true).unwrap());
        }

        let storage = SqliteStorage::new(&storage_path).unwrap();
        let list = storage.find_list(1).unwrap().unwrap();
        assert_eq!(list.name, "Garden");
        assert_eq!(list.todos.len(), 1);
        assert!(list.todos[0].completed);
    }

    #[test]
    fn test_todo_ids_are_scoped_per_list() {
        let storage = SqliteStorage::in_memory().unwrap();
        let first = storage.create_new_list("First").unwrap();
        let second = storage.create_new_list("Second").unwrap();

        assert_eq!(storage.create_new_todo(first, "a").unwrap(), Some(1));
        assert_eq!(storage.create_new_todo(first, "b").unwrap(), Some(2));
        assert_eq!(storage.create_new_todo(second, "c").unwrap(), Some(1));
        assert_eq!(storage.create_new_todo(99, "d").unwrap(), None);
    }

    #[test]
    fn test_delete_list_removes_its_todos() {
        let storage = SqliteStorage::in_memory().unwrap();
        let list_id = storage.create_new_list("Temp").unwrap();
        storage.create_new_todo(list_id, "gone").unwrap();

        assert!(storage.delete_list(list_id).unwrap());
        assert!(!storage.delete_list(list_id).unwrap());

        let conn = storage.get_connection().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_exhausted_ids_are_an_error() {
        let storage = SqliteStorage::in_memory().unwrap();
        {
            let conn = storage.get_connection().unwrap();
            conn.execute(
                "INSERT INTO lists (id, name) VALUES (?1, 'Last')",
                params![i64::MAX],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO todos (list_id, id, name, completed) VALUES (?1, ?1, 'last', 0)",
                params![i64::MAX],
            )
            .unwrap();
        }

        assert!(matches!(
            storage.create_new_list("Next"),
            Err(StorageError::InvalidData(_))
        ));
        assert!(matches!(
            storage.create_new_todo(i64::MAX as u64, "next"),
            Err(StorageError::InvalidData(_))
        ));
        assert_eq!(storage.all_lists().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_name_violates_constraint() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.create_new_list("Once").unwrap();
        assert!(matches!(
            storage.create_new_list("Once"),
            Err(StorageError::Sqlite(_))
        ));
        assert_eq!(storage.all_lists().unwrap().len(), 1);
    }
}
