//! Core types and trait definitions for the forum client.
//!
//! This crate is deliberately free of database and network dependencies. It
//! describes the two external services the client talks to (the document
//! store and the directory service) by the interface the sync layer needs,
//! plus the value types that flow through them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod document;
pub mod entity;
pub mod error;
pub mod path;
pub mod store;

pub use error::{Error, Failure, Result};
