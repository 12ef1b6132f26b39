//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-checked queries.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::collections::BTreeSet;
use std::path::Path;

use super::models::*;
use crate::config::DatabaseConfig;
use crate::error::AppError;

/// Joined projection shared by the users' comments query and its plan.
///
/// `posts` is joined so only comments attached to an existing post are
/// returned; the filter is appended as an `IN (...)` list.
const COMMENTS_BY_USERNAMES_SELECT: &str = r#"
    SELECT
        c.id AS id,
        c.post_id AS post_id,
        c.author_id AS author_id,
        a.username AS author_username,
        c.created_at AS created_at,
        c.updated_at AS updated_at
    FROM comments c
    INNER JOIN posts p ON p.id = c.post_id
    INNER JOIN authors a ON a.id = c.author_id
    WHERE a.username IN ("#;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to SQLite database with default pool settings
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        let config = DatabaseConfig {
            path: path.to_path_buf(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        };
        Self::connect_with_config(&config).await
    }

    /// Connect using pool limits from configuration.
    pub async fn connect_with_config(config: &DatabaseConfig) -> Result<Self, AppError> {
        let path = config.path.as_path();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Cascading post deletes depend on foreign keys being enforced.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(
            path = %path.display(),
            max_connections = config.max_connections,
            "Database connected and migrated successfully"
        );

        Ok(Self { pool })
    }

    // =========================================================================
    // Author
    // =========================================================================

    /// Insert a new author
    pub async fn insert_author(&self, username: &str) -> Result<Author, AppError> {
        let result = sqlx::query("INSERT INTO authors (username) VALUES (?)")
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(Author {
            id: result.last_insert_rowid(),
            username: username.to_string(),
        })
    }

    /// Get author by ID
    pub async fn get_author(&self, id: i64) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<_, Author>("SELECT id, username FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    // =========================================================================
    // Post
    // =========================================================================

    /// Insert a new post
    ///
    /// # Arguments
    /// * `created_at` - Creation time, defaults to now
    pub async fn insert_post(&self, created_at: Option<DateTime<Utc>>) -> Result<Post, AppError> {
        let now = Utc::now();
        let created_at = created_at.unwrap_or(now);

        let result = sqlx::query("INSERT INTO posts (created_at, updated_at) VALUES (?, ?)")
            .bind(created_at)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(Post {
            id: result.last_insert_rowid(),
            created_at,
            updated_at: now,
        })
    }

    /// Delete a post together with all of its comments
    ///
    /// The comments go through `ON DELETE CASCADE` in the same statement.
    ///
    /// # Returns
    /// true if a post was deleted
    pub async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Comment
    // =========================================================================

    /// Insert a new comment
    ///
    /// # Errors
    /// Returns a database error if the post or the author does not exist
    pub async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, AppError> {
        let now = Utc::now();
        let created_at = comment.created_at.unwrap_or(now);

        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            created_at,
            updated_at: now,
        })
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, created_at, updated_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Count all comments
    pub async fn count_comments(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get comments whose author's username is in `usernames` (single JOIN, avoids N+1)
    ///
    /// Matching is exact and case-sensitive. An empty set returns no rows
    /// without touching the database.
    pub async fn get_comments_by_author_usernames(
        &self,
        usernames: &BTreeSet<String>,
        order: CommentOrder,
    ) -> Result<Vec<AuthoredComment>, AppError> {
        if usernames.is_empty() {
            return Ok(vec![]);
        }

        let mut query_builder = comments_by_usernames_query("", usernames, order);
        let comments = query_builder
            .build_query_as::<AuthoredComment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    /// `EXPLAIN QUERY PLAN` detail lines for the users' comments query
    #[cfg(test)]
    pub(crate) async fn explain_comments_by_author_usernames(
        &self,
        usernames: &BTreeSet<String>,
        order: CommentOrder,
    ) -> Result<Vec<String>, AppError> {
        let mut query_builder =
            comments_by_usernames_query("EXPLAIN QUERY PLAN", usernames, order);
        let rows = query_builder.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("detail").map_err(AppError::from))
            .collect()
    }
}

fn comments_by_usernames_query<'args>(
    prefix: &str,
    usernames: &'args BTreeSet<String>,
    order: CommentOrder,
) -> QueryBuilder<'args, Sqlite> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(prefix);
    query_builder.push(COMMENTS_BY_USERNAMES_SELECT);
    {
        let mut separated = query_builder.separated(", ");
        for username in usernames {
            separated.push_bind(username);
        }
    }
    query_builder.push(") ORDER BY ");
    query_builder.push(order.as_sql());
    query_builder
}
