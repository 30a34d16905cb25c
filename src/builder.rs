use std::collections::HashSet;
use std::fs;
use std::path::Path;

use phylotree::tree::{NodeId, Tree as PhyloTree};
use tracing::{debug, instrument};

use crate::arena::{NodeData, TreeArena};
use crate::errors::{TreeError, TreeResult};

/// Converts externally parsed Newick trees into [`TreeArena`]s.
///
/// Parsing itself is delegated to the `phylotree` crate; this builder only
/// walks the parsed structure, classifies nodes as tip or internal, and
/// carries names and branch lengths over.
pub struct TreeBuilder {
    visited: HashSet<NodeId>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
        }
    }

    /// Load every tree from a Newick file.
    ///
    /// A file may hold several `;`-terminated trees; each becomes its own
    /// arena.
    #[instrument(level = "debug", skip(self))]
    pub fn build_from_file(&mut self, path: &Path) -> TreeResult<Vec<TreeArena>> {
        if !path.exists() {
            return Err(TreeError::FileNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let trees = self.build_from_newick(&raw)?;
        if trees.is_empty() {
            return Err(TreeError::EmptyInput(path.to_path_buf()));
        }
        debug!("loaded {} tree(s) from {}", trees.len(), path.display());
        Ok(trees)
    }

    /// Parse a (possibly multi-tree) Newick string.
    #[instrument(level = "debug", skip_all)]
    pub fn build_from_newick(&mut self, raw: &str) -> TreeResult<Vec<TreeArena>> {
        let mut trees = Vec::new();
        for chunk in raw.split_inclusive(';') {
            let candidate = chunk.trim();
            if candidate.is_empty() || !candidate.ends_with(';') {
                continue;
            }
            let phylo = PhyloTree::from_newick(candidate)
                .map_err(|err| TreeError::InvalidNewick(err.to_string()))?;
            trees.push(self.build_tree(&phylo)?);
        }
        Ok(trees)
    }

    /// Convert one parsed tree into the arena representation.
    ///
    /// Runs on an explicit stack; a node reached twice means the input is
    /// not a tree and conversion is rejected.
    #[instrument(level = "debug", skip_all)]
    fn build_tree(&mut self, phylo: &PhyloTree) -> TreeResult<TreeArena> {
        let mut tree = TreeArena::new();
        self.visited.clear();

        let root = phylo
            .get_root()
            .map_err(|err| TreeError::InvalidNewick(err.to_string()))?;
        let mut stack = vec![(root, None)];

        while let Some((phylo_id, parent_idx)) = stack.pop() {
            if !self.visited.insert(phylo_id) {
                return Err(TreeError::CycleDetected(phylo_id));
            }

            let node = phylo
                .get(&phylo_id)
                .map_err(|err| TreeError::InvalidNewick(err.to_string()))?;

            // Childless parsed nodes are tips; internal labels (support
            // values) are not carried over.
            let data = if node.children.is_empty() {
                NodeData::leaf(node.name.clone(), node.parent_edge)
            } else {
                NodeData::internal(node.parent_edge)
            };
            let current_idx = tree.insert_node(data, parent_idx);

            // Reversed push keeps Newick child order once popped
            for &child in node.children.iter().rev() {
                stack.push((child, Some(current_idx)));
            }
        }

        Ok(tree)
    }
}
