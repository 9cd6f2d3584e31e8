//! Core types and trait definitions for the report backoffice.
//!
//! This crate is deliberately free of HTTP, database and object-storage
//! dependencies. Every other crate depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod delivery;
pub mod error;
pub mod history;
pub mod report;
pub mod status;
pub mod store;
pub mod target;
pub mod task;

pub use error::{Error, Result};
