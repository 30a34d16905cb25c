//! Display trait assignment: region colors and highlight flags per node.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arena::{NodeKind, TreeArena};
use crate::metadata::{broad_region, SampleTable};

/// Region-to-color table plus the highlight sample set.
///
/// Compiled defaults carry a palette of well-separated colors; every field
/// can be overridden through the settings layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    /// Hex color per broad region; keys are lowercase (the config layer
    /// lowercases table keys on load)
    pub region_colors: BTreeMap<String, String>,
    /// Color for regions missing from the table
    pub fallback_color: String,
    /// Sample identifiers to flag for highlighting
    pub highlight_samples: BTreeSet<String>,
    /// Color renderers should use for highlighted samples
    pub highlight_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let mut region_colors = BTreeMap::new();
        region_colors.insert("northeast".to_string(), "#A1B426".to_string());
        region_colors.insert("west".to_string(), "#F26721".to_string());
        region_colors.insert("midwest".to_string(), "#002957".to_string());
        region_colors.insert("south".to_string(), "#129DBF".to_string());
        Self {
            region_colors,
            fallback_color: "#CCCCCC".to_string(),
            highlight_samples: BTreeSet::new(),
            highlight_color: "#AD122A".to_string(),
        }
    }
}

impl StyleConfig {
    /// Color for a broad region, or the fallback color.
    pub fn color_for(&self, broad_region: &str) -> &str {
        self.region_colors
            .get(&broad_region.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.fallback_color)
    }
}

/// Attach region and color traits to every named tip.
///
/// Internal nodes and unnamed tips keep their default traits; renderers
/// fall back to neutral styling for them.
#[instrument(level = "debug", skip_all)]
pub fn assign_traits(tree: &mut TreeArena, table: &SampleTable, style: &StyleConfig) {
    let regions = table.region_lookup();

    let named: Vec<(Index, String)> = tree
        .iter()
        .filter_map(|(idx, node)| match &node.data.kind {
            NodeKind::Leaf { sample: Some(name) } if !name.is_empty() => {
                Some((idx, name.clone()))
            }
            _ => None,
        })
        .collect();
    debug!("assigning traits to {} named tips", named.len());

    for (idx, name) in named {
        let region = regions.get(&name).cloned().flatten();
        let broad = broad_region(region.as_deref()).to_string();
        let highlighted = style.highlight_samples.contains(&name);

        if let Some(node) = tree.get_node_mut(idx) {
            let traits = &mut node.data.traits;
            traits.color = Some(style.color_for(&broad).to_string());
            traits.broad_region = Some(broad);
            traits.original_region = region;
            traits.highlighted = highlighted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeData;
    use crate::metadata::SampleRecord;

    #[test]
    fn test_color_for_is_case_insensitive_and_falls_back() {
        let style = StyleConfig::default();
        assert_eq!(style.color_for("Midwest"), "#002957");
        assert_eq!(style.color_for("midwest"), "#002957");
        assert_eq!(style.color_for("Atlantis"), "#CCCCCC");
    }

    #[test]
    fn test_traits_assigned_to_named_tips_only() {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(NodeData::internal(None), None);
        let named = tree.insert_node(NodeData::leaf(Some("S1".into()), None), Some(root));
        let unnamed = tree.insert_node(NodeData::leaf(None, None), Some(root));

        let table = SampleTable::from_rows(vec![SampleRecord {
            strain: "S1".into(),
            date: None,
            region: Some("NE_East".into()),
        }]);
        let mut style = StyleConfig::default();
        style.highlight_samples.insert("S1".into());

        assign_traits(&mut tree, &table, &style);

        let traits = &tree.get_node(named).unwrap().data.traits;
        assert_eq!(traits.broad_region.as_deref(), Some("Midwest"));
        assert_eq!(traits.original_region.as_deref(), Some("NE_East"));
        assert_eq!(traits.color.as_deref(), Some("#002957"));
        assert!(traits.highlighted);

        let default_traits = &tree.get_node(unnamed).unwrap().data.traits;
        assert!(default_traits.color.is_none());
        assert!(!default_traits.highlighted);
    }
}
