//! DTC configuration store
//!
//! Keeps named binary configurations in a SQLite database and moves them in
//! and out of the store as file pairs.
//!
//! # Architecture
//!
//! - [`storage`] - SQLite store and the async [`storage::Gateway`]
//! - [`sync`] - File-pair codec, export and import reconciliation
//! - [`model`] - The [`model::Configuration`] record
//! - [`config`] - Database path resolution
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
