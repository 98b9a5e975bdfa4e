//! SQLite backend for the versioned medical-record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write is one `BEGIN IMMEDIATE`
//! transaction.

mod assemble;
mod encode;
mod parents;
mod schema;
mod store;
mod versioned;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
