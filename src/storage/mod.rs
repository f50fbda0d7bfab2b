//! Storage Layer
//!
//! The SQLite-backed store: schema bootstrap and repair, parameterized
//! statement execution, and lazy listings for read APIs.

pub mod engine;
pub mod listing;
pub mod schema;

pub use engine::{Bootstrap, Executed, StorageError, Store};
pub use listing::Listing;
