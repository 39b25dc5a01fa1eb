/// Server settings shared by the CLI and the web layer.
pub mod config;
/// Database layer: open, migrate, task and user CRUD.
pub mod db;
/// Crate error type.
pub mod error;
/// Data types: Task, User, Status, pagination.
pub mod models;
/// Axum-based HTTP API and router.
pub mod web;
