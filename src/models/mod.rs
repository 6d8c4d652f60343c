use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    pub fn new(id: u64, name: String) -> Self {
        Self {
            id,
            name,
            completed: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct List {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl List {
    pub fn new(id: u64, name: String) -> Self {
        Self {
            id,
            name,
            todos: Vec::new(),
        }
    }

    /// A list is complete once it has at least one todo and none are open.
    pub fn is_complete(&self) -> bool {
        !self.todos.is_empty() && self.todos_remaining_count() == 0
    }

    pub fn todos_count(&self) -> usize {
        self.todos.len()
    }

    pub fn todos_remaining_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    fn next_todo_id(&self) -> Result<u64, StorageError> {
        next_id(self.todos.iter().map(|todo| todo.id), "todo")
    }
}

/// One past the largest id in use, or 1 when there are none.
fn next_id<I>(ids: I, kind: &str) -> Result<u64, StorageError>
where
    I: Iterator<Item = u64>,
{
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| StorageError::InvalidData(format!("no {} ids left to assign", kind)))
}

/// Which kind of name failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    List,
    Todo,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::List => write!(f, "list"),
            NameKind::Todo => write!(f, "todo"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error("The {0} name must be between 1 and 100 characters.")]
    InvalidName(NameKind),
    #[error("The list name must be unique.")]
    DuplicateName(String),
    #[error("The specified list was not found.")]
    ListNotFound(u64),
    #[error("The specified todo was not found.")]
    TodoNotFound { list_id: u64, todo_id: u64 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ListError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ListError::ListNotFound(_) | ListError::TodoNotFound { .. }
        )
    }
}

/// The document persisted by the memory and JSON backends.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageData {
    pub version: u32, // Schema version for future migrations
    #[serde(default)]
    pub lists: Vec<List>,
    pub last_sync: DateTime<Utc>,
}

impl Default for StorageData {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageData {
    pub fn new() -> Self {
        Self {
            version: 1,
            lists: Vec::new(),
            last_sync: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for list in &self.lists {
            if !ids.insert(list.id) {
                return Err(StorageError::InvalidData(format!(
                    "duplicate list id {}",
                    list.id
                )));
            }
            if !names.insert(list.name.as_str()) {
                return Err(StorageError::DuplicateList(list.name.clone()));
            }

            let mut todo_ids = HashSet::new();
            for todo in &list.todos {
                if !todo_ids.insert(todo.id) {
                    return Err(StorageError::InvalidData(format!(
                        "duplicate todo id {} in list {}",
                        todo.id, list.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn find_list(&self, list_id: u64) -> Option<&List> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    fn find_list_mut(&mut self, list_id: u64) -> Option<&mut List> {
        self.lists.iter_mut().find(|list| list.id == list_id)
    }

    fn next_list_id(&self) -> Result<u64, StorageError> {
        next_id(self.lists.iter().map(|list| list.id), "list")
    }

    pub fn create_list(&mut self, name: String) -> Result<u64, StorageError> {
        let id = self.next_list_id()?;
        self.lists.push(List::new(id, name));
        Ok(id)
    }

    pub fn rename_list(&mut self, list_id: u64, name: String) -> bool {
        match self.find_list_mut(list_id) {
            Some(list) => {
                list.name = name;
                true
            }
            None => false,
        }
    }

    pub fn remove_list(&mut self, list_id: u64) -> bool {
        let before = self.lists.len();
        self.lists.retain(|list| list.id != list_id);
        self.lists.len() != before
    }

    pub fn add_todo(&mut self, list_id: u64, name: String) -> Result<Option<u64>, StorageError> {
        let Some(list) = self.find_list_mut(list_id) else {
            return Ok(None);
        };
        let id = list.next_todo_id()?;
        list.todos.push(Todo::new(id, name));
        Ok(Some(id))
    }

    pub fn remove_todo(&mut self, list_id: u64, todo_id: u64) -> bool {
        match self.find_list_mut(list_id) {
            Some(list) => {
                let before = list.todos.len();
                list.todos.retain(|todo| todo.id != todo_id);
                list.todos.len() != before
            }
            None => false,
        }
    }

    pub fn set_todo_completed(&mut self, list_id: u64, todo_id: u64, completed: bool) -> bool {
        let todo = self
            .find_list_mut(list_id)
            .and_then(|list| list.todos.iter_mut().find(|todo| todo.id == todo_id));
        match todo {
            Some(todo) => {
                todo.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn complete_all(&mut self, list_id: u64) -> bool {
        match self.find_list_mut(list_id) {
            Some(list) => {
                list.todos.iter_mut().for_each(|todo| todo.completed = true);
                true
            }
            None => false,
        }
    }

    /// Bumps the sync timestamp ahead of a save.
    pub fn touch(&mut self) {
        self.last_sync = Utc::now();
    }
}
