use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rusty_todo_lists", version, about = "Named todo lists from the command line")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log operation details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, view and manage lists
    #[command(subcommand)]
    List(ListCommand),
    /// Manage the todos inside a list
    #[command(subcommand)]
    Todo(TodoCommand),
    /// Inspect or change configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Show every list, unfinished lists first
    All,
    /// Create a new list
    Add { name: String },
    /// Show one list and its todos
    Show { list_id: u64 },
    /// Rename a list
    Rename { list_id: u64, name: String },
    /// Delete a list and all of its todos
    Delete { list_id: u64 },
    /// Mark every todo in a list as completed
    Complete { list_id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum TodoCommand {
    /// Add a todo to a list
    Add { list_id: u64, name: String },
    /// Delete a todo
    Delete { list_id: u64, todo_id: u64 },
    /// Mark a todo as completed
    Check { list_id: u64, todo_id: u64 },
    /// Mark a todo as not completed
    Uncheck { list_id: u64, todo_id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective value of a key
    Get { key: String },
    /// Set a key
    Set { key: String, value: String },
    /// Revert a key to its default
    Unset { key: String },
    /// Print all keys
    List,
    /// Delete every list after confirmation
    Reset,
}
