//! Validating and posting a new comment or reply.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::cache::ForestCache;
use crate::error::{StoreError, ValidationError};
use crate::models::{CommentRecord, NewComment};
use crate::store::CommentStore;

pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_AUTHOR_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("comment submission failed")]
    Submission(#[source] StoreError),
}

/// What the user has typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerDraft {
    pub comment_text: String,
    pub author_name: String,
    pub anonymous: bool,
}

impl Default for ComposerDraft {
    fn default() -> Self {
        Self {
            comment_text: String::new(),
            author_name: String::new(),
            anonymous: true,
        }
    }
}

impl ComposerDraft {
    /// Checks the draft and produces the row to insert. An anonymous draft
    /// never carries a name, whatever was typed into the name field.
    pub fn validate(
        &self,
        recipe_id: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<NewComment, ValidationError> {
        let comment_text = self.comment_text.trim();
        let text_len = comment_text.chars().count();
        if text_len == 0 {
            return Err(ValidationError::EmptyComment);
        }
        if text_len > MAX_COMMENT_CHARS {
            return Err(ValidationError::CommentTooLong {
                max: MAX_COMMENT_CHARS,
                actual: text_len,
            });
        }

        let author_name = if self.anonymous {
            None
        } else {
            let name = self.author_name.trim();
            let name_len = name.chars().count();
            if name_len > MAX_AUTHOR_CHARS {
                return Err(ValidationError::AuthorNameTooLong {
                    max: MAX_AUTHOR_CHARS,
                    actual: name_len,
                });
            }
            (!name.is_empty()).then(|| name.to_string())
        };

        Ok(NewComment {
            recipe_id: recipe_id.to_string(),
            comment_text: comment_text.to_string(),
            author_name,
            parent_comment_id: parent_comment_id.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Posted(CommentRecord),
    /// A previous submit from this composer has not finished; nothing was sent.
    AlreadySubmitting,
}

/// One comment form: either the top-level form of a recipe or the reply
/// form under a specific comment.
///
/// The parent id is not checked here. Keeping replies within the depth cap is
/// up to whoever decides to show the form; a bypass is left to the store to
/// reject.
#[derive(Debug)]
pub struct ReplyComposer {
    recipe_id: String,
    parent_comment_id: Option<String>,
    draft: Mutex<ComposerDraft>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReplyComposer {
    pub fn new(recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            parent_comment_id: None,
            draft: Mutex::new(ComposerDraft::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn replying_to(recipe_id: impl Into<String>, parent_comment_id: impl Into<String>) -> Self {
        Self {
            parent_comment_id: Some(parent_comment_id.into()),
            ..Self::new(recipe_id)
        }
    }

    pub fn with_draft(self, draft: ComposerDraft) -> Self {
        *self.lock_draft() = draft;
        self
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn draft(&self) -> ComposerDraft {
        self.lock_draft().clone()
    }

    pub fn edit_draft(&self, edit: impl FnOnce(&mut ComposerDraft)) {
        edit(&mut self.lock_draft());
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.lock_draft().comment_text.trim().is_empty()
    }

    /// Posts the current draft. On success the draft is cleared and the
    /// recipe's cached forest invalidated; on failure the draft is kept so
    /// the user can retry.
    pub async fn submit(
        &self,
        store: &dyn CommentStore,
        cache: &ForestCache,
    ) -> Result<SubmitOutcome, ComposerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SubmitOutcome::AlreadySubmitting);
        }
        let _guard = InFlight(&self.in_flight);

        let new_comment = self
            .draft()
            .validate(&self.recipe_id, self.parent_comment_id.as_deref())?;

        let record = store.insert_comment(new_comment).await.map_err(|e| {
            tracing::warn!(recipe_id = %self.recipe_id, error = %e, "posting comment failed");
            ComposerError::Submission(e)
        })?;

        tracing::info!(
            recipe_id = %self.recipe_id,
            comment_id = %record.id,
            is_reply = record.parent_comment_id.is_some(),
            "comment posted"
        );
        cache.invalidate(&self.recipe_id).await;
        *self.lock_draft() = ComposerDraft::default();

        Ok(SubmitOutcome::Posted(record))
    }

    fn lock_draft(&self) -> MutexGuard<'_, ComposerDraft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
