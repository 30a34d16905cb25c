//! Tests for TreeBuilder

use std::path::PathBuf;
use tempfile::TempDir;

use chronotree::arena::NodeKind;
use chronotree::builder::TreeBuilder;
use chronotree::errors::TreeError;

fn create_tree_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write tree file");
    path
}

#[test]
fn given_newick_file_when_building_then_creates_tree() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_tree_file(&temp, "tree.nwk", "(A:0.1,(B:0.2,C:0.3):0.4);\n");

    // Act
    let mut builder = TreeBuilder::new();
    let trees = builder.build_from_file(&path).unwrap();

    // Assert
    assert_eq!(trees.len(), 1);
    let tree = &trees[0];
    assert!(tree.root().is_some());
    assert_eq!(tree.tip_count(), 3);
    assert_eq!(tree.internal_count(), 2);
    assert_eq!(tree.depth(), 3);
}

#[test]
fn given_file_with_multiple_trees_when_building_then_creates_all() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_tree_file(&temp, "trees.nwk", "(A:0.1,B:0.2);\n(C:0.3,D:0.4);\n");

    // Act
    let mut builder = TreeBuilder::new();
    let trees = builder.build_from_file(&path).unwrap();

    // Assert
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].tip_names(), vec!["A", "B"]);
    assert_eq!(trees[1].tip_names(), vec!["C", "D"]);
}

#[test]
fn given_nonexistent_file_when_building_then_errors() {
    // Arrange
    let mut builder = TreeBuilder::new();

    // Act
    let result = builder.build_from_file(&PathBuf::from("/nonexistent/tree.nwk"));

    // Assert
    assert!(matches!(result, Err(TreeError::FileNotFound(_))));
}

#[test]
fn given_empty_file_when_building_then_errors() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_tree_file(&temp, "empty.nwk", "");

    // Act
    let result = TreeBuilder::new().build_from_file(&path);

    // Assert
    assert!(matches!(result, Err(TreeError::EmptyInput(_))));
}

#[test]
fn given_unbalanced_newick_when_building_then_errors() {
    // Arrange
    let mut builder = TreeBuilder::new();

    // Act
    let result = builder.build_from_newick("((A:0.1,B:0.2;");

    // Assert
    assert!(result.is_err());
}

#[test]
fn given_parsed_tree_then_nodes_classified_and_lengths_carried() {
    // Arrange
    let mut builder = TreeBuilder::new();

    // Act
    let trees = builder.build_from_newick("(A:0.25,(B:0.5,C):0.75);").unwrap();

    // Assert
    let tree = &trees[0];
    let root = tree.get_node(tree.root().unwrap()).unwrap();
    assert_eq!(root.data.kind, NodeKind::Internal);
    assert_eq!(root.data.branch_length, None);

    for (_, node) in tree.iter() {
        match node.data.sample() {
            Some("A") => assert_eq!(node.data.branch_length, Some(0.25)),
            Some("B") => assert_eq!(node.data.branch_length, Some(0.5)),
            Some("C") => assert_eq!(node.data.branch_length, None),
            _ => assert_eq!(node.data.kind, NodeKind::Internal),
        }
    }
}

#[test]
fn given_parsed_tree_then_child_order_preserved() {
    // Arrange
    let mut builder = TreeBuilder::new();

    // Act
    let trees = builder
        .build_from_newick("((D:0.1,C:0.2):0.3,(B:0.4,A:0.5):0.6);")
        .unwrap();

    // Assert: pre-order follows Newick order left to right
    assert_eq!(trees[0].tip_names(), vec!["D", "C", "B", "A"]);
}

#[test]
fn given_fresh_nodes_then_no_time_assigned_yet() {
    // Arrange
    let mut builder = TreeBuilder::new();

    // Act
    let trees = builder.build_from_newick("(A:0.1,B:0.2);").unwrap();

    // Assert
    for (_, node) in trees[0].iter() {
        assert!(node.data.absolute_time.is_none());
        assert!(node.data.time_source.is_none());
    }
}
