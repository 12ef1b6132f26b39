//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - The storage seam used by the comment query

mod database;
mod models;
mod store;

pub use database::Database;
pub use models::*;
pub use store::CommentStore;
