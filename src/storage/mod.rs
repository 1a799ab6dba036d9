//! SQLite storage layer for DTC configurations.
//!
//! This module provides the persistence layer using SQLite with:
//! - Two correlated tables per configuration (record + name)
//! - One transaction per configuration write or delete
//! - Bit-exact storage of unsigned ids in signed columns
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Single-connection CRUD primitives
//! - [`gateway`] - Connection lifecycle, snapshot and background worker

pub mod gateway;
pub mod schema;
pub mod sqlite;

pub use gateway::{BatchReport, Gateway, ItemFailure, Snapshot};
pub use sqlite::SqliteStorage;
