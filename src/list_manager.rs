use crate::models::{List, ListError, Todo};
use crate::storage::Storage;
use crate::validation::{validate_list_name, validate_todo_name};

/// Reorders items so those failing `is_done` come first, keeping the
/// relative order inside each group.
fn partition_done<T, F>(items: Vec<T>, is_done: F) -> Vec<T>
where
    F: Fn(&T) -> bool,
{
    let (mut open, done): (Vec<T>, Vec<T>) =
        items.into_iter().partition(|item| !is_done(item));
    open.extend(done);
    open
}

/// Incomplete lists first, then complete ones.
pub fn sort_lists(lists: Vec<List>) -> Vec<List> {
    partition_done(lists, List::is_complete)
}

/// Open todos first, then completed ones.
pub fn sort_todos(todos: Vec<Todo>) -> Vec<Todo> {
    partition_done(todos, |todo| todo.completed)
}

/// Validates input and applies list/todo changes through a storage backend.
///
/// Names are trimmed before they are validated or stored. Every failing call
/// returns before the backend is asked to mutate anything.
pub struct ListManager<'a> {
    storage: &'a dyn Storage,
}

impl<'a> ListManager<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    pub fn list_all(&self) -> Result<Vec<List>, ListError> {
        let lists = self.storage.all_lists()?;
        tracing::debug!(count = lists.len(), "loaded lists");
        Ok(sort_lists(lists))
    }

    pub fn find_list(&self, list_id: u64) -> Result<List, ListError> {
        self.storage
            .find_list(list_id)?
            .ok_or(ListError::ListNotFound(list_id))
    }

    /// Same as [`find_list`](Self::find_list) with the todos in display order.
    pub fn find_list_sorted(&self, list_id: u64) -> Result<List, ListError> {
        let mut list = self.find_list(list_id)?;
        list.todos = sort_todos(std::mem::take(&mut list.todos));
        Ok(list)
    }

    pub fn create_list(&self, name: &str) -> Result<u64, ListError> {
        let name = name.trim();
        let existing = self.storage.all_lists()?;
        if let Err(e) = validate_list_name(name, &existing) {
            tracing::warn!(list_name = name, error = %e, "rejected list name");
            return Err(e);
        }

        let id = self.storage.create_new_list(name)?;
        tracing::info!(list_id = id, list_name = name, "created list");
        Ok(id)
    }

    /// Renames a list.
    ///
    /// The uniqueness check includes the list being renamed, so keeping the
    /// current name is reported as a duplicate.
    pub fn rename_list(&self, list_id: u64, new_name: &str) -> Result<(), ListError> {
        let new_name = new_name.trim();
        let existing = self.storage.all_lists()?;
        if !existing.iter().any(|list| list.id == list_id) {
            return Err(ListError::ListNotFound(list_id));
        }
        if let Err(e) = validate_list_name(new_name, &existing) {
            tracing::warn!(list_id, list_name = new_name, error = %e, "rejected list rename");
            return Err(e);
        }

        if !self.storage.update_list_name(list_id, new_name)? {
            return Err(ListError::ListNotFound(list_id));
        }
        tracing::info!(list_id, list_name = new_name, "renamed list");
        Ok(())
    }

    pub fn delete_list(&self, list_id: u64) -> Result<(), ListError> {
        if !self.storage.delete_list(list_id)? {
            return Err(ListError::ListNotFound(list_id));
        }
        tracing::info!(list_id, "deleted list");
        Ok(())
    }

    pub fn add_todo(&self, list_id: u64, text: &str) -> Result<u64, ListError> {
        let text = text.trim();
        if let Err(e) = validate_todo_name(text) {
            tracing::warn!(list_id, error = %e, "rejected todo name");
            return Err(e);
        }

        let todo_id = self
            .storage
            .create_new_todo(list_id, text)?
            .ok_or(ListError::ListNotFound(list_id))?;
        tracing::info!(list_id, todo_id, "added todo");
        Ok(todo_id)
    }

    pub fn delete_todo(&self, list_id: u64, todo_id: u64) -> Result<(), ListError> {
        if !self.storage.delete_todo_from_list(list_id, todo_id)? {
            return Err(self.todo_not_found(list_id, todo_id)?);
        }
        tracing::info!(list_id, todo_id, "deleted todo");
        Ok(())
    }

    pub fn set_todo_completed(
        &self,
        list_id: u64,
        todo_id: u64,
        completed: bool,
    ) -> Result<(), ListError> {
        if !self
            .storage
            .update_todo_status(list_id, todo_id, completed)?
        {
            return Err(self.todo_not_found(list_id, todo_id)?);
        }
        tracing::info!(list_id, todo_id, completed, "updated todo status");
        Ok(())
    }

    pub fn complete_all_todos(&self, list_id: u64) -> Result<(), ListError> {
        if !self.storage.mark_all_todos_as_completed(list_id)? {
            return Err(ListError::ListNotFound(list_id));
        }
        tracing::info!(list_id, "completed all todos");
        Ok(())
    }

    /// Picks the right not-found error once a todo mutation matched nothing.
    fn todo_not_found(&self, list_id: u64, todo_id: u64) -> Result<ListError, ListError> {
        Ok(match self.storage.find_list(list_id)? {
            Some(_) => ListError::TodoNotFound { list_id, todo_id },
            None => ListError::ListNotFound(list_id),
        })
    }
}
