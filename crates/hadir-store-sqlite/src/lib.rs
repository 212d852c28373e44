//! SQLite backend for the Hadir store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Change notification is in-process:
//! every handle cloned from one [`SqliteStore`] shares the same revision
//! counters.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
