use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;
use generational_arena::Index;
use itertools::Itertools;
use tracing::instrument;

use crate::arena::{TreeArena, TreeNode};
use crate::builder::TreeBuilder;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::config::Settings;
use crate::estimator::assign_node_times;
use crate::metadata::SampleTable;
use crate::report::{tree_stats, DefaultUsageReport, TimeSourceSummary};

pub fn execute_command(cli: &Cli, settings: &Settings) -> Result<()> {
    match &cli.command {
        Some(Commands::Annotate {
            tree,
            metadata,
            output,
            internal,
        }) => _annotate(tree, metadata, output.as_deref(), *internal, settings),
        Some(Commands::Report { tree, metadata }) => _report(tree, metadata, settings),
        Some(Commands::Stats { tree, metadata }) => _stats(tree, metadata, settings),
        Some(Commands::Tree { tree, metadata }) => _tree(tree, metadata.as_deref(), settings),
        Some(Commands::Config { command }) => _config(command, settings),
        Some(Commands::Completion { shell }) => {
            print_completions(*shell);
            Ok(())
        }
        None => Ok(()),
    }
}

fn print_completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

#[instrument(skip(settings))]
fn _annotate(
    tree_path: &Path,
    metadata_path: &Path,
    output_path: Option<&Path>,
    include_internal: bool,
    settings: &Settings,
) -> Result<()> {
    let (trees, _) = crate::annotate_file(tree_path, metadata_path, settings)?;

    let out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    write_annotations(&trees, out, include_internal)?;

    if let Some(path) = output_path {
        output::action(
            "Annotated",
            &format!("{} tree(s) -> {}", trees.len(), path.display()),
        );
    }
    Ok(())
}

/// Export the per-node annotation table as TSV.
///
/// Every exported node carries a finite time and a provenance tag; this is
/// the contract downstream renderers consume.
fn write_annotations(
    trees: &[TreeArena],
    out: Box<dyn Write>,
    include_internal: bool,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    wtr.write_record([
        "tree",
        "node",
        "type",
        "sample",
        "branch_length",
        "absolute_time",
        "time_source",
        "region",
        "broad_region",
        "color",
        "highlighted",
    ])?;

    for (tree_no, tree) in trees.iter().enumerate() {
        for (node_no, (_, node)) in tree.iter().enumerate() {
            if !include_internal && !node.data.is_leaf() {
                continue;
            }
            let data = &node.data;
            wtr.write_record([
                tree_no.to_string(),
                node_no.to_string(),
                (if data.is_leaf() { "leaf" } else { "internal" }).to_string(),
                data.sample().unwrap_or("").to_string(),
                data.branch_length.map(|l| l.to_string()).unwrap_or_default(),
                data.absolute_time.map(|t| t.to_string()).unwrap_or_default(),
                data.time_source.map(|s| s.to_string()).unwrap_or_default(),
                data.traits.original_region.clone().unwrap_or_default(),
                data.traits.broad_region.clone().unwrap_or_default(),
                data.traits.color.clone().unwrap_or_default(),
                data.traits.highlighted.to_string(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[instrument(skip(settings))]
fn _report(tree_path: &Path, metadata_path: &Path, settings: &Settings) -> Result<()> {
    let (trees, _) = crate::annotate_file(tree_path, metadata_path, settings)?;

    for (tree_no, tree) in trees.iter().enumerate() {
        if trees.len() > 1 {
            output::header(&format!("Tree {}", tree_no + 1));
        }
        print_time_source_summary(tree);
        print_default_usage(tree);
    }
    Ok(())
}

fn print_time_source_summary(tree: &TreeArena) {
    let summary = TimeSourceSummary::from_tree(tree);
    output::header("TIME ASSIGNMENT ANALYSIS");
    for (tag, count) in &summary.overall {
        output::detail(&format!(
            "{}: {} nodes ({:.1}%)",
            tag,
            count,
            summary.percentage(*count)
        ));
    }
    println!();
}

fn print_default_usage(tree: &TreeArena) {
    let report = DefaultUsageReport::from_tree(tree);
    output::header("DEFAULT TIME USAGE");
    if !report.any_defaults() {
        output::detail("No fallback values in use");
        return;
    }
    output::detail(&format!(
        "Tips on fallback: {} out of {}",
        report.tips_defaulted, report.total_tips
    ));
    output::detail(&format!(
        "Internal nodes on fallback: {} out of {}",
        report.internal_defaulted, report.total_internal
    ));

    if report.tips_defaulted > 0 {
        output::warning("samples missing usable dates:");
        for name in report.listed_samples() {
            output::detail(&format!("- {}", name));
        }
        if report.unlisted_count() > 0 {
            output::detail(&format!("... and {} more", report.unlisted_count()));
        }
    }
    if report.internal_defaulted > 0 {
        output::warning(&format!(
            "{} internal node(s) could not derive times from children",
            report.internal_defaulted
        ));
    }
}

#[instrument(skip(settings))]
fn _stats(tree_path: &Path, metadata_path: &Path, settings: &Settings) -> Result<()> {
    let (trees, table) = crate::annotate_file(tree_path, metadata_path, settings)?;

    output::header("Metadata by broad region");
    for (region, count) in table.broad_region_counts() {
        output::detail(&format!("{}: {} rows", region, count));
    }

    for (tree_no, tree) in trees.iter().enumerate() {
        if trees.len() > 1 {
            output::header(&format!("Tree {}", tree_no + 1));
        }
        let stats = tree_stats(tree, &table, &settings.style);

        output::header("TREE STATISTICS");
        output::detail(&format!("Tips: {}", stats.tip_count));
        output::detail(&format!("Internal nodes: {}", stats.internal_count));
        output::detail(&format!("Depth: {}", stats.depth));

        if !stats.region_counts.is_empty() {
            output::header("Samples by broad region");
            for (region, count) in stats
                .region_counts
                .iter()
                .sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)))
            {
                output::detail(&format!(
                    "{}: {} samples (color: {})",
                    region,
                    count,
                    settings.style.color_for(region)
                ));
            }
        }

        if stats.highlight_total > 0 {
            output::header("Highlight coverage");
            output::detail(&format!(
                "Highlighted samples in tree: {} out of {}",
                stats.highlights_in_tree.len(),
                stats.highlight_total
            ));
            for tip in &stats.highlights_in_tree {
                output::detail(&format!(
                    "{}: {} -> {}",
                    tip.strain,
                    tip.region.as_deref().unwrap_or("unknown"),
                    tip.broad_region
                ));
            }
        }
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _tree(tree_path: &Path, metadata_path: Option<&Path>, settings: &Settings) -> Result<()> {
    let table = match metadata_path {
        Some(path) => SampleTable::load(path)?,
        None => SampleTable::default(),
    };
    let lookup = table.time_lookup();

    let mut trees = TreeBuilder::new().build_from_file(tree_path)?;
    for tree in &mut trees {
        assign_node_times(tree, &lookup, &settings.timing);
        if let Some(rendered) = render_tree(tree) {
            println!("{}", rendered);
        }
    }
    Ok(())
}

/// Assemble a termtree rendering bottom-up.
///
/// Post-order guarantees every child subtree is complete before its parent
/// is built, so no recursion is needed even for very deep trees.
fn render_tree(tree: &TreeArena) -> Option<termtree::Tree<String>> {
    let mut built: HashMap<Index, termtree::Tree<String>> = HashMap::new();
    for (idx, node) in tree.iter_postorder() {
        let mut rendered = termtree::Tree::new(node_label(node));
        for &child in &node.children {
            if let Some(subtree) = built.remove(&child) {
                rendered.push(subtree);
            }
        }
        built.insert(idx, rendered);
    }
    tree.root().and_then(|root| built.remove(&root))
}

fn node_label(node: &TreeNode) -> String {
    match (node.data.absolute_time, node.data.time_source) {
        (Some(time), Some(source)) => format!("{} [{:.2}, {}]", node.data, time, source),
        _ => node.data.to_string(),
    }
}

#[instrument(skip(settings))]
fn _config(command: &ConfigCommands, settings: &Settings) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { path } => {
            let target = path
                .clone()
                .or_else(Settings::global_config_path)
                .context("cannot determine config path")?;
            Settings::write_template(&target)?;
            output::action("Created", &target.display());
        }
        ConfigCommands::Path => match Settings::global_config_path() {
            Some(path) => {
                let state = if path.exists() { "(exists)" } else { "(not found)" };
                output::info(&format!("{} {}", path.display(), state));
            }
            None => output::warning("no home directory; global config unavailable"),
        },
    }
    Ok(())
}
