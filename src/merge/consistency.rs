//! Cross-fragment checks on the values embedded in rendered pages.

use crate::error::MergeError;
use crate::fragment::PageVariables;
use serde_json::{Map, Value};

/// Union the reference sets of all pages.
///
/// Every fragment must have been produced against the same reference
/// collection, so the union may hold at most one reference.
pub fn merge_references(pages: &[PageVariables]) -> Result<Map<String, Value>, MergeError> {
    let mut merged = Map::new();

    for references in pages.iter().filter_map(|page| page.references.as_ref()) {
        for (name, organisms) in references {
            merged.insert(name.clone(), organisms.clone());
        }
    }

    if merged.len() > 1 {
        return Err(MergeError::MultipleReferences {
            names: merged.keys().cloned().collect(),
        });
    }

    Ok(merged)
}

/// Union per-sample metadata; a later page replaces a sample entirely.
pub fn merge_samples(pages: &[PageVariables]) -> Map<String, Value> {
    let mut merged = Map::new();

    for samples in pages.iter().filter_map(|page| page.samples.as_ref()) {
        for (name, metadata) in samples {
            merged.insert(name.clone(), metadata.clone());
        }
    }

    merged
}

/// The single minimum contig length shared by all pages.
pub fn resolve_contig_threshold(pages: &[PageVariables]) -> Result<Value, MergeError> {
    let mut distinct: Vec<&Value> = Vec::new();

    for value in pages.iter().filter_map(|page| page.min_contig_size.as_ref()) {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }

    match distinct.as_slice() {
        [] => Err(MergeError::MissingContigThreshold),
        [value] => Ok((*value).clone()),
        _ => Err(MergeError::MultipleContigThresholds {
            values: distinct.iter().map(|value| display(value)).collect(),
        }),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
