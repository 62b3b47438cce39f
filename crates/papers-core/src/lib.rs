//! Core types and trait definitions for the Papers registry.
//!
//! A registry holds people and the identity credentials (passports, ID
//! documents) they own. This crate is deliberately free of database
//! dependencies: it defines the entities, the error taxonomy, the store
//! traits, and the relationship rules every backend must uphold.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod enforcer;
pub mod entity;
pub mod error;
pub mod memory;
pub mod store;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
pub use memory::MemoryStore;
