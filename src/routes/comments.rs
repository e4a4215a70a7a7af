use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::Serialize;

use crate::auth::{MaybeSession, RequireSession};
use crate::comments::{
    CommentsView, ComposerDraft, MAX_REPLY_DEPTH, ReplyComposer, SubmitOutcome, ViewStates,
    can_reply, delete_comment, render_forest,
};
use crate::error::{ApiError, ValidationError};
use crate::models::{CommentViewQuery, CreateComment};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct CommentsResponse {
    #[serde(flatten)]
    view: CommentsView,
    can_delete: bool,
}

pub fn comments_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{recipe_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/{recipe_id}/comments/{comment_id}",
            axum::routing::delete(remove_comment),
        )
}

async fn list_comments(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(recipe_id): Path<String>,
    Query(query): Query<CommentViewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let forest = state
        .forests
        .forest(&recipe_id, state.comments.as_ref())
        .await?;
    let states = ViewStates::from_id_lists(query.collapsed.as_deref(), query.replying.as_deref());

    Ok(Json(CommentsResponse {
        view: render_forest(&forest, &states, Utc::now()),
        can_delete: session.is_some(),
    }))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<CreateComment>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(parent_id) = input.parent_comment_id.as_deref() {
        check_reply_target(&state, &recipe_id, parent_id).await?;
    }

    let composer = match input.parent_comment_id {
        Some(parent_id) => ReplyComposer::replying_to(recipe_id, parent_id),
        None => ReplyComposer::new(recipe_id),
    }
    .with_draft(ComposerDraft {
        comment_text: input.comment_text,
        author_name: input.author_name.unwrap_or_default(),
        anonymous: input.anonymous,
    });

    match composer
        .submit(state.comments.as_ref(), &state.forests)
        .await?
    {
        SubmitOutcome::Posted(record) => Ok((StatusCode::CREATED, Json(record))),
        // Unreachable with a composer per request; only a long-lived
        // client-side composer can already be submitting.
        SubmitOutcome::AlreadySubmitting => Err(ApiError::Busy),
    }
}

/// The parent must be a visible comment of the same recipe that still
/// accepts replies.
async fn check_reply_target(
    state: &AppState,
    recipe_id: &str,
    parent_id: &str,
) -> Result<(), ApiError> {
    let forest = state
        .forests
        .forest(recipe_id, state.comments.as_ref())
        .await?;
    let parent = forest
        .find(parent_id)
        .ok_or(ValidationError::UnknownParent)?;

    if !can_reply(parent.depth()) {
        return Err(ValidationError::ReplyTooDeep {
            max: MAX_REPLY_DEPTH,
        }
        .into());
    }

    Ok(())
}

async fn remove_comment(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path((recipe_id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(user_id = %session.user_id, %recipe_id, %comment_id, "deleting comment");
    delete_comment(
        state.comments.as_ref(),
        &state.forests,
        &comment_id,
        &recipe_id,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "message": "Comment deleted successfully"
    })))
}
