//! Combination of whole fragments into one report.
//!
//! Splits every fragment into its parts and hands each kind to its merger.
//! Nothing is produced unless every consistency check passes.

use super::consistency::{merge_references, merge_samples, resolve_contig_threshold};
use super::performance::merge_performance;
use super::plots::{merge_plots, replace_plots};
use super::tables::{merge_tables, replace_tables};
use crate::error::MergeError;
use crate::fragment::Fragment;
use crate::models::{MergeMode, MergedReport};
use tracing::{debug, info};

/// Merge fragments, in the given order, into the combined report values.
pub fn aggregate(fragments: Vec<Fragment>, mode: MergeMode) -> Result<MergedReport, MergeError> {
    let mut performance = Vec::new();
    let mut tables = Vec::new();
    let mut plots = Vec::new();
    let mut pages = Vec::new();

    for fragment in fragments {
        debug!("Collecting fragment {}", fragment.name);
        performance.extend(fragment.performance);
        tables.extend(fragment.tables);
        plots.extend(fragment.plots);
        pages.push(fragment.page);
    }

    let performance = merge_performance(&performance);
    let references = merge_references(&pages)?;
    let samples = merge_samples(&pages);

    let (tables, plots) = match mode {
        MergeMode::Assemblers => (merge_tables(&tables)?, merge_plots(&plots)),
        MergeMode::Samples => (replace_tables(&tables), replace_plots(&plots)),
    };

    let min_contig_size = resolve_contig_threshold(&pages)?;

    let table_keys: Vec<String> = tables.keys().map(String::from).collect();
    let overview = overview_caption(mode, &table_keys);

    info!(
        "Merged {} pages: {} performance records, {} tables, {} plot documents",
        pages.len(),
        performance.len(),
        tables.len(),
        plots.len()
    );

    Ok(MergedReport {
        performance,
        references,
        samples,
        tables,
        plots,
        table_keys,
        min_contig_size,
        overview,
    })
}

/// Caption for the report overview, as a markdown template literal.
pub fn overview_caption(mode: MergeMode, table_keys: &[String]) -> String {
    match mode {
        MergeMode::Assemblers => "`Combined report of assemblers`".to_string(),
        MergeMode::Samples => {
            let keys: Vec<String> = table_keys.iter().map(|key| format!("'{}'", key)).collect();
            format!("`Combined report of samples: [{}]`", keys.join(", "))
        }
    }
}
