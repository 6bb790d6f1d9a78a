//! Storage Layer
//!
//! Handles all data persistence: SQLite database, encrypted secrets, and JSON config.

pub mod config;
pub mod credential_store;
pub mod database;
pub mod secrets;

pub use config::*;
pub use credential_store::*;
pub use database::*;
pub use secrets::*;
