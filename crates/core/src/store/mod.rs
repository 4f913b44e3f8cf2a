//! SQLite-backed persistence for policy documents and fetch records.
//!
//! This module provides the narrow query surface the compliance engine and
//! the fetch pipeline read and write through, using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Point lookup and upsert-by-unique-key for both tables
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod migrations;
pub mod policies;
pub mod records;

pub use crate::Error;

pub use connection::Store;
pub use policies::CachedPolicy;
pub use records::FetchRecord;
