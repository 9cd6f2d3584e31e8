//! SQLite backend for the backoffice store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Target passwords are sealed with
//! XChaCha20-Poly1305 before they reach the database.

mod encode;
mod schema;
mod store;

pub mod crypto;
pub mod error;

pub use crypto::SecretKey;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
