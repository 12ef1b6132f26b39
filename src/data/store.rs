//! Storage seam for the users' comments query

use std::collections::BTreeSet;
use std::future::Future;

use super::Database;
use super::models::{AuthoredComment, CommentOrder};
use crate::error::AppError;

/// Read access the comment query needs from storage
///
/// Implementations answer with one joined read: comments, their authors
/// and posts resolved together, restricted to `usernames` and ordered by
/// `order`. An empty `usernames` set answers with no rows.
pub trait CommentStore: Send + Sync {
    fn find_comments_by_usernames(
        &self,
        usernames: &BTreeSet<String>,
        order: CommentOrder,
    ) -> impl Future<Output = Result<Vec<AuthoredComment>, AppError>> + Send;
}

impl CommentStore for Database {
    fn find_comments_by_usernames(
        &self,
        usernames: &BTreeSet<String>,
        order: CommentOrder,
    ) -> impl Future<Output = Result<Vec<AuthoredComment>, AppError>> + Send {
        self.get_comments_by_author_usernames(usernames, order)
    }
}
