use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

/// Classification of a phylogeny node.
///
/// Tips carry the sample identifier used to join against the metadata
/// table; internal nodes carry nothing beyond their children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Observed sample at the tip of the tree
    Leaf { sample: Option<String> },
    /// Inferred common ancestor
    Internal,
}

/// Rule that produced a node's absolute-time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSource {
    /// Looked up from the sample metadata table
    Metadata,
    /// Tip identifier had no usable metadata date
    LeafDefault,
    /// Tip carried no identifier at all
    NoNameDefault,
    /// Minimum child time minus the node's branch length
    Calculated,
    /// No child produced a resolved time
    InternalDefault,
    /// Internal node with an empty child list
    NoChildrenDefault,
}

impl TimeSource {
    pub const ALL: [TimeSource; 6] = [
        TimeSource::Metadata,
        TimeSource::LeafDefault,
        TimeSource::NoNameDefault,
        TimeSource::Calculated,
        TimeSource::InternalDefault,
        TimeSource::NoChildrenDefault,
    ];

    /// True for every tag except `Metadata` and `Calculated`.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, TimeSource::Metadata | TimeSource::Calculated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSource::Metadata => "metadata",
            TimeSource::LeafDefault => "default_leaf_fallback",
            TimeSource::NoNameDefault => "default_no_name_fallback",
            TimeSource::Calculated => "calculated",
            TimeSource::InternalDefault => "default_internal_fallback",
            TimeSource::NoChildrenDefault => "default_no_children_fallback",
        }
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display attributes consumed by downstream renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTraits {
    /// Hex color assigned from the region palette
    pub color: Option<String>,
    /// Broad reporting region (Northeast, West, Midwest, South, Other)
    pub broad_region: Option<String>,
    /// Region exactly as it appears in the metadata table
    pub original_region: Option<String>,
    /// Member of the configured highlight sample set
    pub highlighted: bool,
}

/// Data payload for phylogeny nodes.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Distance to the parent; absent on roots and in malformed input
    pub branch_length: Option<f64>,
    /// Estimated calendar time (decimal year); set by the estimator
    pub absolute_time: Option<f64>,
    /// Rule that produced `absolute_time`; set by the estimator
    pub time_source: Option<TimeSource>,
    /// Display attributes; set by trait assignment
    pub traits: NodeTraits,
}

impl NodeData {
    pub fn leaf(sample: Option<String>, branch_length: Option<f64>) -> Self {
        Self {
            kind: NodeKind::Leaf { sample },
            branch_length,
            absolute_time: None,
            time_source: None,
            traits: NodeTraits::default(),
        }
    }

    pub fn internal(branch_length: Option<f64>) -> Self {
        Self {
            kind: NodeKind::Internal,
            branch_length,
            absolute_time: None,
            time_source: None,
            traits: NodeTraits::default(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Sample identifier, if this is a named tip.
    pub fn sample(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { sample } => sample.as_deref().filter(|s| !s.is_empty()),
            NodeKind::Internal => None,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sample().unwrap_or("*"))
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Phylogeny data for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in Newick order
    pub children: Vec<Index>,
}

/// Arena-based tree structure for one rooted phylogeny.
///
/// Uses a generational arena for memory-safe node references and O(1)
/// lookups. Child order is preserved from the source tree.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Pre-order traversal, children visited in Newick order.
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    /// Post-order traversal: every child is yielded before its parent.
    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    /// Maximum node depth, counting the root as 1. Empty trees are 0.
    ///
    /// Iterative: phylogenies routinely nest deeper than the call stack
    /// tolerates.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push((root, 1));
        }
        while let Some((idx, depth)) = stack.pop() {
            if depth > max_depth {
                max_depth = depth;
            }
            if let Some(node) = self.get_node(idx) {
                for &child in &node.children {
                    stack.push((child, depth + 1));
                }
            }
        }
        max_depth
    }

    #[instrument(level = "debug", skip(self))]
    pub fn tip_count(&self) -> usize {
        self.iter().filter(|(_, node)| node.data.is_leaf()).count()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn internal_count(&self) -> usize {
        self.iter().filter(|(_, node)| !node.data.is_leaf()).count()
    }

    /// Collects the identifiers of all named tips, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn tip_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push(root);
        }
        while let Some(idx) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                if let Some(sample) = node.data.sample() {
                    names.push(sample.to_string());
                }
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        names
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tip_tree() -> TreeArena {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(NodeData::internal(None), None);
        tree.insert_node(NodeData::leaf(Some("A".into()), Some(0.1)), Some(root));
        tree.insert_node(NodeData::leaf(Some("B".into()), Some(0.2)), Some(root));
        tree
    }

    #[test]
    fn test_postorder_yields_children_before_parent() {
        let tree = two_tip_tree();
        let labels: Vec<String> = tree
            .iter_postorder()
            .map(|(_, node)| node.data.to_string())
            .collect();
        assert_eq!(labels, vec!["A", "B", "*"]);
    }

    #[test]
    fn test_preorder_starts_at_root() {
        let tree = two_tip_tree();
        let labels: Vec<String> = tree.iter().map(|(_, node)| node.data.to_string()).collect();
        assert_eq!(labels, vec!["*", "A", "B"]);
    }

    #[test]
    fn test_counts_and_depth() {
        let tree = two_tip_tree();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.tip_count(), 2);
        assert_eq!(tree.internal_count(), 1);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.tip_names(), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = TreeArena::new();
        assert_eq!(tree.depth(), 0);
        assert!(tree.iter_postorder().next().is_none());
    }

    #[test]
    fn test_empty_sample_name_is_not_a_sample() {
        let data = NodeData::leaf(Some(String::new()), None);
        assert!(data.sample().is_none());
    }
}
