//! Deleting a comment together with its replies.
//!
//! The store offers no transaction, so this is two requests: direct replies
//! first, then the comment. Anything nested deeper goes with its parent via
//! the store's own referential cascade. If the second request fails the
//! replies are already gone while the comment survives; that state is
//! reported as [`DeletionError::CommentNotDeleted`] and repairing it means
//! issuing the same delete again.

use thiserror::Error;

use super::cache::ForestCache;
use crate::error::StoreError;
use crate::store::CommentStore;

#[derive(Debug, Error)]
pub enum DeletionError {
    #[error("could not delete replies of comment {comment_id}; nothing was deleted")]
    RepliesNotDeleted {
        comment_id: String,
        #[source]
        source: StoreError,
    },

    #[error("replies of comment {comment_id} were deleted but the comment itself was not")]
    CommentNotDeleted {
        comment_id: String,
        #[source]
        source: StoreError,
    },
}

impl DeletionError {
    /// True when some rows were already removed before the failure.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::CommentNotDeleted { .. })
    }
}

pub async fn delete_comment(
    store: &dyn CommentStore,
    cache: &ForestCache,
    comment_id: &str,
    recipe_id: &str,
) -> Result<(), DeletionError> {
    if let Err(source) = store.delete_comments_by_parent(comment_id).await {
        let err = DeletionError::RepliesNotDeleted {
            comment_id: comment_id.to_string(),
            source,
        };
        tracing::warn!(recipe_id, error = %err, "comment deletion failed");
        return Err(err);
    }

    if let Err(source) = store.delete_comment_by_id(comment_id).await {
        let err = DeletionError::CommentNotDeleted {
            comment_id: comment_id.to_string(),
            source,
        };
        tracing::warn!(recipe_id, error = %err, "comment deletion left replies removed");
        // the next read must show what is actually stored
        cache.invalidate(recipe_id).await;
        return Err(err);
    }

    tracing::info!(recipe_id, comment_id, "comment deleted");
    cache.invalidate(recipe_id).await;

    Ok(())
}
