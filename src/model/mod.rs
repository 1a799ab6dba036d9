//! Data models for the DTC configuration store.
//!
//! The store has a single entity:
//! - Configuration

pub mod configuration;

pub use configuration::Configuration;
