//! Read-only aggregation over annotated trees: fallback usage, provenance
//! breakdowns, and tree statistics.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::arena::{NodeKind, TimeSource, TreeArena};
use crate::metadata::SampleTable;
use crate::style::StyleConfig;

/// Token reported for tips that carry no sample identifier.
pub const MISSING_NAME_TOKEN: &str = "NO_NAME";

/// How many offending sample names a report lists before truncating.
pub const MAX_LISTED_NAMES: usize = 10;

/// Counts of fallback usage after the estimator has run.
#[derive(Debug, Default, PartialEq)]
pub struct DefaultUsageReport {
    pub total_tips: usize,
    pub total_internal: usize,
    /// Tips that received `default_leaf_fallback` or `default_no_name_fallback`
    pub tips_defaulted: usize,
    /// Internal nodes that received `default_internal_fallback` or
    /// `default_no_children_fallback`
    pub internal_defaulted: usize,
    /// Identifiers of the defaulted tips, [`MISSING_NAME_TOKEN`] when absent
    pub missing_samples: Vec<String>,
}

impl DefaultUsageReport {
    /// Tabulate fallback usage over an annotated tree. Read-only.
    #[instrument(level = "debug", skip_all)]
    pub fn from_tree(tree: &TreeArena) -> Self {
        let mut report = Self::default();
        for (_, node) in tree.iter() {
            let fallback = node.data.time_source.is_some_and(|s| s.is_fallback());
            match &node.data.kind {
                NodeKind::Leaf { sample } => {
                    report.total_tips += 1;
                    if fallback {
                        report.tips_defaulted += 1;
                        let name = sample
                            .clone()
                            .filter(|s| !s.is_empty())
                            .unwrap_or_else(|| MISSING_NAME_TOKEN.to_string());
                        report.missing_samples.push(name);
                    }
                }
                NodeKind::Internal => {
                    report.total_internal += 1;
                    if fallback {
                        report.internal_defaulted += 1;
                    }
                }
            }
        }
        report
    }

    /// The first [`MAX_LISTED_NAMES`] offending tip identifiers.
    pub fn listed_samples(&self) -> &[String] {
        let end = self.missing_samples.len().min(MAX_LISTED_NAMES);
        &self.missing_samples[..end]
    }

    /// How many offenders fall beyond the listing cap.
    pub fn unlisted_count(&self) -> usize {
        self.missing_samples.len().saturating_sub(MAX_LISTED_NAMES)
    }

    pub fn any_defaults(&self) -> bool {
        self.tips_defaulted > 0 || self.internal_defaulted > 0
    }
}

/// Breakdown of provenance tags across a whole tree.
///
/// Keys are tag strings so output sorts alphabetically; nodes the
/// estimator never touched count as `unknown`.
#[derive(Debug, Default, PartialEq)]
pub struct TimeSourceSummary {
    pub overall: BTreeMap<String, usize>,
    pub tips: BTreeMap<String, usize>,
    pub internal: BTreeMap<String, usize>,
    pub total_nodes: usize,
}

impl TimeSourceSummary {
    #[instrument(level = "debug", skip_all)]
    pub fn from_tree(tree: &TreeArena) -> Self {
        let mut summary = Self::default();
        for (_, node) in tree.iter() {
            summary.total_nodes += 1;
            let tag = node
                .data
                .time_source
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            *summary.overall.entry(tag.clone()).or_insert(0) += 1;
            let per_kind = if node.data.is_leaf() {
                &mut summary.tips
            } else {
                &mut summary.internal
            };
            *per_kind.entry(tag).or_insert(0) += 1;
        }
        summary
    }

    /// Share of all nodes, in percent.
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total_nodes == 0 {
            0.0
        } else {
            count as f64 / self.total_nodes as f64 * 100.0
        }
    }
}

/// One highlighted sample found among the tree's tips.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedTip {
    pub strain: String,
    /// Region verbatim from the metadata table
    pub region: Option<String>,
    pub broad_region: String,
}

/// Tip/internal totals, depth, per-region tip counts, and highlight
/// coverage for one tree.
#[derive(Debug, Default, PartialEq)]
pub struct TreeStats {
    pub tip_count: usize,
    pub internal_count: usize,
    pub depth: usize,
    /// Broad region -> count over tips carrying a region trait
    pub region_counts: BTreeMap<String, usize>,
    /// Configured highlight samples actually present in the tree, sorted
    pub highlights_in_tree: Vec<HighlightedTip>,
    pub highlight_total: usize,
}

/// Collect statistics over an annotated tree.
///
/// Region counts rely on traits already being assigned; highlight coverage
/// is the intersection of the style's highlight set with the tree's tips.
#[instrument(level = "debug", skip_all)]
pub fn tree_stats(tree: &TreeArena, table: &SampleTable, style: &StyleConfig) -> TreeStats {
    let mut stats = TreeStats {
        tip_count: tree.tip_count(),
        internal_count: tree.internal_count(),
        depth: tree.depth(),
        highlight_total: style.highlight_samples.len(),
        ..TreeStats::default()
    };

    for (_, node) in tree.iter() {
        if let Some(broad) = node.data.traits.broad_region.as_deref() {
            *stats.region_counts.entry(broad.to_string()).or_insert(0) += 1;
        }
    }

    let regions = table.region_lookup();
    let mut found: Vec<String> = tree
        .tip_names()
        .into_iter()
        .filter(|name| style.highlight_samples.contains(name))
        .collect();
    found.sort();
    found.dedup();
    stats.highlights_in_tree = found
        .into_iter()
        .map(|strain| {
            let region = regions.get(&strain).cloned().flatten();
            let broad = crate::metadata::broad_region(region.as_deref()).to_string();
            HighlightedTip {
                strain,
                region,
                broad_region: broad,
            }
        })
        .collect();

    stats
}
