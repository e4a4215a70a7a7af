use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::comments::{ComposerError, DeletionError};

/// Failure talking to the backing data service.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Local precondition violations. These never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Comment text is required")]
    EmptyComment,

    #[error("Comment text must be at most {max} characters (got {actual})")]
    CommentTooLong { max: usize, actual: usize },

    #[error("Name must be at most {max} characters (got {actual})")]
    AuthorNameTooLong { max: usize, actual: usize },

    #[error("Rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),

    #[error("The comment being replied to does not exist")]
    UnknownParent,

    #[error("Replies can only be nested {max} levels deep")]
    ReplyTooDeep { max: usize },

    #[error("Title is required")]
    EmptyTitle,

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },
}

impl ValidationError {
    /// Input the error should be shown next to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyComment | Self::CommentTooLong { .. } => "comment_text",
            Self::AuthorNameTooLong { .. } => "author_name",
            Self::RatingOutOfRange(_) => "rating",
            Self::UnknownParent | Self::ReplyTooDeep { .. } => "parent_comment_id",
            Self::EmptyTitle => "title",
            Self::OutOfRange { field } => *field,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error("Missing or invalid session")]
    Unauthorized,

    #[error("Only the recipe's author can change it")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("A submission is already in progress")]
    Busy,

    #[error("Failed to post comment, please try again")]
    Submission(#[source] StoreError),

    #[error("Failed to delete comment, please try again")]
    Deletion(#[from] DeletionError),

    #[error("Request to the data service failed")]
    Store(#[from] StoreError),
}

impl From<ComposerError> for ApiError {
    fn from(err: ComposerError) -> Self {
        match err {
            ComposerError::Validation(e) => Self::Validation(e),
            ComposerError::Submission(e) => Self::Submission(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Validation(e) => {
                serde_json::json!({"detail": e.to_string(), "field": e.field()})
            }
            Self::Body(rejection) => serde_json::json!({"detail": rejection.body_text()}),
            Self::Deletion(e) if e.is_partial() => serde_json::json!({
                "detail": "Replies were deleted but the comment was not, please try again",
                "partial": true
            }),
            _ => serde_json::json!({"detail": self.to_string()}),
        };

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Body(rejection) => rejection.status(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy => StatusCode::CONFLICT,
            Self::Submission(e) | Self::Store(e) => {
                tracing::error!(error = %e, "{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Deletion(e) => {
                tracing::error!(error = %e, "{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(body)).into_response()
    }
}
