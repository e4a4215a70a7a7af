//! Flat comment rows to a forest of threaded replies.
//!
//! Nodes live in an arena and refer to their replies by index. Only nodes
//! reachable from a top-level comment are ever visited: a record whose
//! parent is missing (an orphan) or whose parent chain loops back on itself
//! is never reachable and therefore never shows up in the forest.

use std::collections::HashMap;

use crate::models::CommentRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub record: CommentRecord,
    replies: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    nodes: Vec<CommentNode>,
    roots: Vec<usize>,
}

impl Forest {
    /// Builds the forest in two passes over `records`, which must already be
    /// sorted ascending by `created_at`. Sibling order is input order.
    pub fn build(records: Vec<CommentRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(record.id.clone()).or_insert(i);
        }

        let mut nodes: Vec<CommentNode> = records
            .into_iter()
            .map(|record| CommentNode {
                record,
                replies: Vec::new(),
            })
            .collect();
        let mut roots = Vec::new();

        for i in 0..nodes.len() {
            match nodes[i].record.parent_comment_id.as_deref() {
                None => roots.push(i),
                Some(parent_id) => {
                    if let Some(&parent) = index.get(parent_id) {
                        nodes[parent].replies.push(i);
                    }
                }
            }
        }

        let forest = Self { nodes, roots };
        let dropped = forest.nodes.len() - forest.len();
        if dropped > 0 {
            tracing::debug!(dropped, "comments unreachable from a top-level comment were dropped");
        }
        forest
    }

    pub fn roots(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        self.roots.iter().map(move |&index| NodeRef {
            forest: self,
            index,
            depth: 0,
        })
    }

    /// Number of top-level comments.
    pub fn top_level_count(&self) -> usize {
        self.roots.len()
    }

    /// Number of comments reachable from a top-level comment.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(i) = stack.pop() {
            count += 1;
            stack.extend(&self.nodes[i].replies);
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Finds a visible comment by id, with its computed depth.
    pub fn find(&self, id: &str) -> Option<NodeRef<'_>> {
        let mut stack: Vec<NodeRef<'_>> = self.roots().collect();
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.replies());
        }
        None
    }
}

/// Borrowed view of one node together with its depth.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    forest: &'a Forest,
    index: usize,
    depth: usize,
}

impl<'a> NodeRef<'a> {
    pub fn record(&self) -> &'a CommentRecord {
        &self.forest.nodes[self.index].record
    }

    pub fn id(&self) -> &'a str {
        &self.record().id
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn reply_count(&self) -> usize {
        self.forest.nodes[self.index].replies.len()
    }

    pub fn replies(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator + 'a {
        let forest = self.forest;
        let depth = self.depth + 1;
        forest.nodes[self.index]
            .replies
            .iter()
            .map(move |&index| NodeRef {
                forest,
                index,
                depth,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::record;

    /// Id tree rendered as nested tuples, for compact assertions.
    #[derive(Debug, PartialEq)]
    struct Shape(String, Vec<Shape>);

    fn shape(node: NodeRef<'_>) -> Shape {
        Shape(node.id().to_string(), node.replies().map(shape).collect())
    }

    fn leaf(id: &str) -> Shape {
        Shape(id.to_string(), vec![])
    }

    #[test]
    fn builds_nested_replies() {
        let forest = Forest::build(vec![
            record("A", None, 1),
            record("B", Some("A"), 2),
            record("C", Some("B"), 3),
            record("D", None, 4),
        ]);

        let shapes: Vec<_> = forest.roots().map(shape).collect();
        assert_eq!(
            shapes,
            vec![
                Shape("A".into(), vec![Shape("B".into(), vec![leaf("C")])]),
                leaf("D"),
            ]
        );
        assert_eq!(forest.len(), 4);
        assert_eq!(forest.top_level_count(), 2);
    }

    #[test]
    fn replies_keep_input_order_even_when_parent_comes_later() {
        // replies listed before their parent still attach
        let forest = Forest::build(vec![
            record("r1", Some("p"), 1),
            record("p", None, 2),
            record("r2", Some("p"), 3),
        ]);

        let shapes: Vec<_> = forest.roots().map(shape).collect();
        assert_eq!(shapes, vec![Shape("p".into(), vec![leaf("r1"), leaf("r2")])]);
    }

    #[test]
    fn every_record_is_placed_once_in_a_valid_forest() {
        let mut records = vec![record("root0", None, 0), record("root1", None, 1)];
        for i in 0..30 {
            let parent = if i < 2 { format!("root{i}") } else { format!("n{}", i / 2) };
            records.push(record(&format!("n{i}"), Some(&parent), 10 + i));
        }
        let expected = records.len();
        let forest = Forest::build(records.clone());

        assert_eq!(forest.len(), expected);
        for rec in &records {
            let node = forest.find(&rec.id).expect("every record is visible");
            let children: Vec<_> = node.replies().map(|r| r.id().to_string()).collect();
            let want: Vec<_> = records
                .iter()
                .filter(|r| r.parent_comment_id.as_deref() == Some(rec.id.as_str()))
                .map(|r| r.id.clone())
                .collect();
            assert_eq!(children, want);
            let times: Vec<_> = node.replies().map(|r| r.record().created_at).collect();
            assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn orphans_are_dropped() {
        let forest = Forest::build(vec![
            record("A", None, 1),
            record("orphan", Some("gone"), 2),
            record("orphan-child", Some("orphan"), 3),
        ]);

        assert_eq!(forest.roots().map(shape).collect::<Vec<_>>(), vec![leaf("A")]);
        assert_eq!(forest.len(), 1);
        assert!(forest.find("orphan").is_none());
        assert!(forest.find("orphan-child").is_none());
    }

    #[test]
    fn parent_cycles_are_unreachable() {
        let forest = Forest::build(vec![
            record("A", None, 1),
            record("x", Some("y"), 2),
            record("y", Some("x"), 3),
            record("self", Some("self"), 4),
        ]);

        assert_eq!(forest.len(), 1);
        assert!(forest.find("x").is_none());
        assert!(forest.find("self").is_none());
    }

    #[test]
    fn depth_counts_parent_hops() {
        let forest = Forest::build(vec![
            record("d0", None, 0),
            record("d1", Some("d0"), 1),
            record("d2", Some("d1"), 2),
            record("d3", Some("d2"), 3),
        ]);

        for (id, depth) in [("d0", 0), ("d1", 1), ("d2", 2), ("d3", 3)] {
            assert_eq!(forest.find(id).unwrap().depth(), depth);
        }
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        let forest = Forest::build(Vec::new());
        assert!(forest.is_empty());
        assert_eq!(forest.len(), 0);
    }
}
