//! SQLite backend for the Papers registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Uniqueness of credential ownership and
//! the delete guard are enforced twice: by explicit checks inside each
//! transaction, and by the schema's unique index and foreign key, whose
//! rejections are translated into the same [`papers_core::Error`] variants.

mod constraint;
mod encode;
mod schema;
mod store;

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::StoreConfig;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
