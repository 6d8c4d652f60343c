use crate::cli::{Cli, Commands, ConfigCommand, ListCommand, TodoCommand};
use crate::config::{ConfigError, ConfigManager};
use crate::list_manager::ListManager;
use crate::models::{List, ListError};
use crate::routes::{
    LIST_CREATED, LIST_DELETED, LIST_UPDATED, TODOS_COMPLETED, TODO_ADDED, TODO_DELETED,
    TODO_UPDATED,
};
use crate::storage::StorageError;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    List(#[from] ListError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Runs one parsed command, writing user-facing output to `out`.
///
/// `input` is only read by commands that ask for confirmation.
pub fn execute<W, R>(cli: Cli, out: &mut W, input: &mut R) -> Result<(), CommandError>
where
    W: Write,
    R: BufRead,
{
    let mut config = ConfigManager::new(cli.config.as_deref())?;

    match cli.command {
        Commands::List(command) => {
            let storage = config.create_storage()?;
            let manager = ListManager::new(&*storage);
            run_list_command(&manager, command, out)
        }
        Commands::Todo(command) => {
            let storage = config.create_storage()?;
            let manager = ListManager::new(&*storage);
            run_todo_command(&manager, command, out)
        }
        Commands::Config(command) => run_config_command(&mut config, command, out, input),
    }
}

fn list_line(list: &List) -> String {
    let done = list.todos_count() - list.todos_remaining_count();
    let marker = if list.is_complete() { " ✓" } else { "" };
    format!(
        "{:>4}  {} [{}/{}]{}",
        list.id,
        list.name,
        done,
        list.todos_count(),
        marker
    )
}

fn run_list_command<W: Write>(
    manager: &ListManager<'_>,
    command: ListCommand,
    out: &mut W,
) -> Result<(), CommandError> {
    match command {
        ListCommand::All => {
            let lists = manager.list_all()?;
            if lists.is_empty() {
                writeln!(out, "No lists yet.")?;
            }
            for list in &lists {
                writeln!(out, "{}", list_line(list))?;
            }
        }
        ListCommand::Add { name } => {
            let id = manager.create_list(&name)?;
            writeln!(out, "{} (id {})", LIST_CREATED, id)?;
        }
        ListCommand::Show { list_id } => {
            let list = manager.find_list_sorted(list_id)?;
            writeln!(out, "{}", list_line(&list))?;
            if list.todos.is_empty() {
                writeln!(out, "      (no todos)")?;
            }
            for todo in &list.todos {
                let check = if todo.completed { "x" } else { " " };
                writeln!(out, "      [{}] {:>3}. {}", check, todo.id, todo.name)?;
            }
        }
        ListCommand::Rename { list_id, name } => {
            manager.rename_list(list_id, &name)?;
            writeln!(out, "{}", LIST_UPDATED)?;
        }
        ListCommand::Delete { list_id } => {
            manager.delete_list(list_id)?;
            writeln!(out, "{}", LIST_DELETED)?;
        }
        ListCommand::Complete { list_id } => {
            manager.complete_all_todos(list_id)?;
            writeln!(out, "{}", TODOS_COMPLETED)?;
        }
    }
    Ok(())
}

fn run_todo_command<W: Write>(
    manager: &ListManager<'_>,
    command: TodoCommand,
    out: &mut W,
) -> Result<(), CommandError> {
    match command {
        TodoCommand::Add { list_id, name } => {
            let todo_id = manager.add_todo(list_id, &name)?;
            writeln!(out, "{} (id {})", TODO_ADDED, todo_id)?;
        }
        TodoCommand::Delete { list_id, todo_id } => {
            manager.delete_todo(list_id, todo_id)?;
            writeln!(out, "{}", TODO_DELETED)?;
        }
        TodoCommand::Check { list_id, todo_id } => {
            manager.set_todo_completed(list_id, todo_id, true)?;
            writeln!(out, "{}", TODO_UPDATED)?;
        }
        TodoCommand::Uncheck { list_id, todo_id } => {
            manager.set_todo_completed(list_id, todo_id, false)?;
            writeln!(out, "{}", TODO_UPDATED)?;
        }
    }
    Ok(())
}

fn run_config_command<W: Write, R: BufRead>(
    config: &mut ConfigManager,
    command: ConfigCommand,
    out: &mut W,
    input: &mut R,
) -> Result<(), CommandError> {
    match command {
        ConfigCommand::Get { key } => {
            let value = config.get(&key).ok_or(CommandError::UnknownKey(key))?;
            writeln!(out, "{}", value)?;
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            writeln!(out, "{} = {}", key, value)?;
        }
        ConfigCommand::Unset { key } => {
            config.unset(&key)?;
            writeln!(out, "{} reset to default", key)?;
        }
        ConfigCommand::List => {
            for (key, value, is_default) in config.list() {
                let suffix = if is_default { " (default)" } else { "" };
                writeln!(out, "{} = {}{}", key, value, suffix)?;
            }
        }
        ConfigCommand::Reset => {
            write!(
                out,
                "Warning: This will delete all lists and todos. Continue? [y/N] "
            )?;
            out.flush()?;

            let mut answer = String::new();
            input.read_line(&mut answer)?;
            if answer.trim().eq_ignore_ascii_case("y") {
                config.create_storage()?.reset()?;
                tracing::info!("storage reset");
                writeln!(out, "All lists have been deleted.")?;
            } else {
                writeln!(out, "Operation cancelled.")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    fn run(config: &Path, args: &[&str], stdin: &str) -> Result<String, CommandError> {
        let config = config.to_str().unwrap();
        let cli = Cli::parse_from(
            ["rusty_todo_lists", "--config", config]
                .iter()
                .chain(args.iter()),
        );
        let mut out = Vec::new();
        let mut input = stdin.as_bytes();
        execute(cli, &mut out, &mut input)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = temp_dir.path().join("config.json");
        let data = temp_dir.path().join("lists.json");
        run(
            &config,
            &["config", "set", "storage.path", data.to_str().unwrap()],
            "",
        )
        .unwrap();
        (temp_dir, config)
    }

    #[test]
    fn test_list_lifecycle() {
        let (_temp_dir, config) = setup();

        let output = run(&config, &["list", "add", "Groceries"], "").unwrap();
        assert_eq!(output, "The list has been created. (id 1)\n");
        run(&config, &["todo", "add", "1", "Milk"], "").unwrap();
        run(&config, &["todo", "add", "1", "Eggs"], "").unwrap();
        run(&config, &["todo", "check", "1", "1"], "").unwrap();

        let output = run(&config, &["list", "all"], "").unwrap();
        assert_eq!(output, "   1  Groceries [1/2]\n");

        let output = run(&config, &["list", "show", "1"], "").unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[1], "      [ ]   2. Eggs");
        assert_eq!(lines[2], "      [x]   1. Milk");

        run(&config, &["list", "complete", "1"], "").unwrap();
        let output = run(&config, &["list", "all"], "").unwrap();
        assert_eq!(output, "   1  Groceries [2/2] ✓\n");
    }

    #[test]
    fn test_domain_errors_propagate() {
        let (_temp_dir, config) = setup();
        run(&config, &["list", "add", "Work"], "").unwrap();

        let err = run(&config, &["list", "add", "Work"], "").unwrap_err();
        assert_eq!(err.to_string(), "The list name must be unique.");

        let err = run(&config, &["list", "show", "9"], "").unwrap_err();
        assert!(matches!(err, CommandError::List(ListError::ListNotFound(9))));

        let err = run(&config, &["config", "get", "colour"], "").unwrap_err();
        assert!(matches!(err, CommandError::UnknownKey(_)));
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let (_temp_dir, config) = setup();
        run(&config, &["list", "add", "Keep me"], "").unwrap();

        let output = run(&config, &["config", "reset"], "n\n").unwrap();
        assert!(output.contains("Warning: This will delete all lists and todos"));
        assert!(output.contains("Operation cancelled."));
        assert!(run(&config, &["list", "all"], "").unwrap().contains("Keep me"));

        let output = run(&config, &["config", "reset"], "y\n").unwrap();
        assert!(output.contains("All lists have been deleted."));
        assert_eq!(run(&config, &["list", "all"], "").unwrap(), "No lists yet.\n");
    }
}
