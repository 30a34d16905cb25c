//! chronotree annotates phylogenetic trees with calendar-time estimates.
//!
//! A Newick tree and a tab-separated sample table go in; every node comes
//! out carrying a decimal-year estimate, a provenance tag describing how
//! that estimate was derived, and display traits (region, color,
//! highlight) for downstream renderers. Missing data never aborts the
//! pipeline: gaps are absorbed by configurable fallbacks and surfaced
//! through the reporting commands instead.

use std::path::Path;

use tracing::instrument;

pub mod arena;
pub mod builder;
pub mod cli;
pub mod config;
pub mod errors;
pub mod estimator;
pub mod metadata;
pub mod report;
pub mod style;
pub mod util;

use crate::arena::TreeArena;
use crate::builder::TreeBuilder;
use crate::config::Settings;
use crate::errors::TreeResult;
use crate::estimator::assign_node_times;
use crate::metadata::SampleTable;
use crate::style::assign_traits;

/// Run the full annotation pipeline over a Newick file.
///
/// Loads the metadata table, builds one arena per tree in the file,
/// estimates node times, and assigns display traits. Returns the
/// annotated trees together with the table for further aggregation.
#[instrument(level = "debug", skip(settings))]
pub fn annotate_file(
    tree_path: &Path,
    metadata_path: &Path,
    settings: &Settings,
) -> TreeResult<(Vec<TreeArena>, SampleTable)> {
    let table = SampleTable::load(metadata_path)?;
    let lookup = table.time_lookup();

    let mut trees = TreeBuilder::new().build_from_file(tree_path)?;
    for tree in &mut trees {
        assign_node_times(tree, &lookup, &settings.timing);
        assign_traits(tree, &table, &settings.style);
    }
    Ok((trees, table))
}
