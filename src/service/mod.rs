//! Service layer
//!
//! Contains business logic separated from HTTP handlers.

mod comment_query;

pub use comment_query::{CommentQueryService, FilterSpec};
