//! Threaded comments on a recipe.

pub mod cache;
pub mod cascade;
pub mod composer;
pub mod forest;
pub mod presentation;

pub use cache::ForestCache;
pub use cascade::{DeletionError, delete_comment};
pub use composer::{ComposerDraft, ComposerError, ReplyComposer, SubmitOutcome};
pub use forest::{CommentNode, Forest, NodeRef};
pub use presentation::{
    CommentView, CommentsView, MAX_REPLY_DEPTH, NodeViewState, ViewStates, can_reply, render_forest,
};
