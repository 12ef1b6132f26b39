//! Users' comments query
//!
//! Returns the comments written by a set of authors, optionally in
//! chronological order. Filtering and ordering run inside the store as a
//! single joined read.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data::{AuthoredComment, CommentOrder, CommentStore};
use crate::error::AppError;

/// Which comments to return and in what order
///
/// `usernames` is always a set, even for one name. Duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub usernames: BTreeSet<String>,
    pub sort_by_date: bool,
}

impl FilterSpec {
    pub fn new<I, S>(usernames: I, sort_by_date: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            usernames: usernames.into_iter().map(Into::into).collect(),
            sort_by_date,
        }
    }

    pub fn order(&self) -> CommentOrder {
        if self.sort_by_date {
            CommentOrder::CreatedAt
        } else {
            CommentOrder::Identity
        }
    }
}

/// Comment query service
pub struct CommentQueryService<S> {
    store: Arc<S>,
}

impl<S: CommentStore> CommentQueryService<S> {
    /// Create new comment query service
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get comments authored by any of `filter.usernames`
    ///
    /// An empty username set yields an empty result without a storage read.
    /// Storage errors are returned unchanged.
    ///
    /// # Returns
    /// Comments ordered by `created_at` then id when `sort_by_date` is set,
    /// by id otherwise
    pub async fn users_comments(
        &self,
        filter: &FilterSpec,
    ) -> Result<Vec<AuthoredComment>, AppError> {
        if filter.usernames.is_empty() {
            tracing::debug!("No usernames requested; skipping comment lookup");
            return Ok(vec![]);
        }

        let order = filter.order();
        let comments = self
            .store
            .find_comments_by_usernames(&filter.usernames, order)
            .await?;

        tracing::debug!(
            usernames = filter.usernames.len(),
            order = order.as_str(),
            returned = comments.len(),
            "Users' comments fetched"
        );

        Ok(comments)
    }
}
