//! Data models
//!
//! Rust structs representing database rows.
//! IDs are SQLite integer identities assigned in insertion order;
//! timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Author
// =============================================================================

/// Someone who writes comments
///
/// `username` is the lookup key for filtering. It is indexed, not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub username: String,
}

// =============================================================================
// Post
// =============================================================================

/// A container for comments
///
/// Owns its comments: deleting a post deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    /// Owning post
    pub post_id: i64,
    /// Referenced author (not owned)
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    /// Defaults to the insertion time
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment joined with its author's username
///
/// Row shape of the users' comments query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthoredComment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result ordering for the users' comments query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentOrder {
    /// Comment identity ascending (insertion order)
    #[default]
    Identity,
    /// `created_at` ascending, ties broken by identity
    CreatedAt,
}

impl CommentOrder {
    /// SQL `ORDER BY` terms against the `c` (comments) alias
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Identity => "c.id ASC",
            Self::CreatedAt => "c.created_at ASC, c.id ASC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::CreatedAt => "created_at",
        }
    }
}
