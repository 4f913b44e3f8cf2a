//! Core types and shared functionality for cuppy.
//!
//! This crate provides:
//! - SQLite-backed persistence (policy cache and fetch records)
//! - Unified error types
//! - Layered application configuration

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, PolicyFailureMode};
pub use error::Error;
pub use store::{CachedPolicy, FetchRecord, Store};
