use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A flat `recipe_comments` row as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CommentRecord {
    pub id: String,
    pub recipe_id: String,
    pub parent_comment_id: Option<String>,
    pub author_name: Option<String>,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a comment or reply. Fields are already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub recipe_id: String,
    pub comment_text: String,
    pub author_name: Option<String>,
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub comment_text: String,
    pub author_name: Option<String>,
    #[serde(default = "default_anonymous")]
    pub anonymous: bool,
    pub parent_comment_id: Option<String>,
}

fn default_anonymous() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
pub struct CommentViewQuery {
    /// Comma-separated ids whose replies are hidden.
    pub collapsed: Option<String>,
    /// Comma-separated ids with an open reply form.
    pub replying: Option<String>,
}
