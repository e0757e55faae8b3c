//! SQLite backend for the forum client.
//!
//! Implements both external services on a local database: [`SqliteStore`] is
//! a [`DocumentStore`](forum_core::store::DocumentStore) with realtime
//! snapshot pushes, [`SqliteDirectory`] a
//! [`DirectoryService`](forum_core::directory::DirectoryService) with argon2
//! password hashing and a persisted session.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod directory;
mod encode;
mod schema;
mod store;

pub mod error;

pub use directory::{MIN_PASSWORD_LEN, SqliteDirectory};
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
