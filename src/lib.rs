pub mod cli;
pub mod commands;
pub mod config;
pub mod list_manager;
pub mod models;
pub mod routes;
pub mod storage;
pub mod validation;
