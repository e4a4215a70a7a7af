//! How a comment forest is shown: labels, timestamps, and the per-node
//! collapsed/replying state a client keeps while the thread is on screen.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::forest::{Forest, NodeRef};

/// Nodes at this depth or deeper are not offered a reply form.
pub const MAX_REPLY_DEPTH: usize = 3;

/// Nested `replies` stop at this depth. Everything below a node at this
/// depth is listed flat in its `replies`, in thread order, so the size of a
/// thread never bounds how deep rendering and serialization recurse.
pub const MAX_NESTED_DEPTH: usize = 16;

pub const ANONYMOUS: &str = "Anonymous";

pub fn can_reply(depth: usize) -> bool {
    depth < MAX_REPLY_DEPTH
}

/// Client-side state of one rendered comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeViewState {
    expanded: bool,
    replying: bool,
}

impl Default for NodeViewState {
    fn default() -> Self {
        Self {
            expanded: true,
            replying: false,
        }
    }
}

impl NodeViewState {
    pub fn collapsed() -> Self {
        Self {
            expanded: false,
            ..Self::default()
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_replying(&self) -> bool {
        self.replying
    }

    /// Show/hide replies. Leaf comments have no toggle.
    pub fn toggle_replies(&mut self, node: &NodeRef<'_>) {
        if node.reply_count() > 0 {
            self.expanded = !self.expanded;
        }
    }

    /// Reply/Cancel. Unavailable once the reply depth cap is reached.
    pub fn toggle_reply_form(&mut self, node: &NodeRef<'_>) {
        if can_reply(node.depth()) {
            self.replying = !self.replying;
        }
    }

    pub fn reply_submitted(&mut self) {
        self.replying = false;
    }
}

/// View states keyed by comment id; unknown ids use the default state.
#[derive(Debug, Clone, Default)]
pub struct ViewStates(HashMap<String, NodeViewState>);

impl ViewStates {
    /// Parses the comma-separated id lists a client sends back.
    pub fn from_id_lists(collapsed: Option<&str>, replying: Option<&str>) -> Self {
        let mut states = Self::default();
        for id in split_ids(collapsed) {
            states.entry(id).expanded = false;
        }
        for id in split_ids(replying) {
            states.entry(id).replying = true;
        }
        states
    }

    pub fn get(&self, id: &str) -> NodeViewState {
        self.0.get(id).copied().unwrap_or_default()
    }

    pub fn entry(&mut self, id: &str) -> &mut NodeViewState {
        self.0.entry(id.to_string()).or_default()
    }
}

fn split_ids(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.into_iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub id: String,
    pub parent_comment_id: Option<String>,
    pub author_label: String,
    pub avatar_initial: String,
    pub timestamp_label: String,
    pub created_at: DateTime<Utc>,
    /// Raw text; clients must preserve whitespace and line breaks.
    pub body: String,
    pub depth: usize,
    pub indented: bool,
    pub can_reply: bool,
    pub reply_action_label: Option<&'static str>,
    pub replying: bool,
    pub reply_count: usize,
    pub replies_toggle_label: Option<String>,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentsView {
    pub heading: String,
    pub top_level_count: usize,
    pub comments: Vec<CommentView>,
}

pub fn render_forest(forest: &Forest, states: &ViewStates, now: DateTime<Utc>) -> CommentsView {
    let top_level_count = forest.top_level_count();
    let heading = if top_level_count > 0 {
        format!("Comments ({top_level_count})")
    } else {
        "Comments".to_string()
    };

    CommentsView {
        heading,
        top_level_count,
        comments: forest.roots().map(|n| render_node(n, states, now)).collect(),
    }
}

fn render_node(node: NodeRef<'_>, states: &ViewStates, now: DateTime<Utc>) -> CommentView {
    let expanded = states.get(node.id()).is_expanded();

    let replies = if !expanded {
        Vec::new()
    } else if node.depth() < MAX_NESTED_DEPTH {
        node.replies().map(|r| render_node(r, states, now)).collect()
    } else {
        flattened_replies(node, states, now)
    };

    comment_view(node, states, now, replies)
}

/// All visible descendants of `node` in depth-first thread order, each
/// without nested replies. Collapsed descendants hide their own subtree.
fn flattened_replies(node: NodeRef<'_>, states: &ViewStates, now: DateTime<Utc>) -> Vec<CommentView> {
    let mut views = Vec::new();
    let mut stack: Vec<NodeRef<'_>> = node.replies().rev().collect();

    while let Some(next) = stack.pop() {
        if states.get(next.id()).is_expanded() {
            stack.extend(next.replies().rev());
        }
        views.push(comment_view(next, states, now, Vec::new()));
    }

    views
}

fn comment_view(
    node: NodeRef<'_>,
    states: &ViewStates,
    now: DateTime<Utc>,
    replies: Vec<CommentView>,
) -> CommentView {
    let record = node.record();
    let state = states.get(node.id());
    let depth = node.depth();
    let can_reply = can_reply(depth);
    let replying = can_reply && state.is_replying();
    let reply_count = node.reply_count();

    CommentView {
        id: record.id.clone(),
        parent_comment_id: record.parent_comment_id.clone(),
        author_label: author_label(record.author_name.as_deref()).to_string(),
        avatar_initial: avatar_initial(record.author_name.as_deref()),
        timestamp_label: format_timestamp(record.created_at, now),
        created_at: record.created_at,
        body: record.comment_text.clone(),
        depth,
        indented: depth > 0,
        can_reply,
        reply_action_label: can_reply.then_some(if replying { "Cancel" } else { "Reply" }),
        replying,
        reply_count,
        replies_toggle_label: replies_toggle_label(reply_count, state.is_expanded()),
        replies,
    }
}

pub fn author_label(author_name: Option<&str>) -> &str {
    match author_name {
        Some(name) if !name.is_empty() => name,
        _ => ANONYMOUS,
    }
}

pub fn avatar_initial(author_name: Option<&str>) -> String {
    author_name
        .and_then(|name| name.chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "A".to_string())
}

/// "Hide 1 reply" / "Show 3 replies"; `None` for leaf comments.
pub fn replies_toggle_label(reply_count: usize, expanded: bool) -> Option<String> {
    if reply_count == 0 {
        return None;
    }
    let verb = if expanded { "Hide" } else { "Show" };
    let noun = if reply_count == 1 { "reply" } else { "replies" };
    Some(format!("{verb} {reply_count} {noun}"))
}

/// Relative time for the last week, a calendar date after that. Dates are
/// rendered in UTC with English month abbreviations.
pub fn format_timestamp(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();

    if seconds < 60 {
        return "just now".to_string();
    }
    if seconds < 3_600 {
        return format!("{}m ago", seconds / 60);
    }
    if seconds < 86_400 {
        return format!("{}h ago", seconds / 3_600);
    }
    if seconds < 604_800 {
        return format!("{}d ago", seconds / 86_400);
    }

    if created_at.year() != now.year() {
        created_at.format("%b %-d, %Y").to_string()
    } else {
        created_at.format("%b %-d").to_string()
    }
}
