//! Merging of plot series across fragments.
//!
//! The first document seen for an assembler is the seed. Each later
//! document for the same assembler is one merge step: its series are
//! recoloured from the start of the palette and its annotation traces are
//! moved onto their own horizontal band, numbered by the merge step, before
//! being appended to the seed.
//!
//! Every series of a scope is merged, named or not: the data arrays of a
//! series both sides hold are concatenated (`contig_size`, `gap_size` and
//! `misassembly` in the `Global` scope, for instance).
//!
//! Merging is best effort and never fails. Missing scopes, series or data
//! arrays are treated as empty; a scope or series the seed lacks is adopted
//! from the incoming document as-is.

use super::palette::{colour_series, ColourTarget, FIRST_INDEX};
use crate::models::{Keyed, PlotDocument, PlotFragment};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Scope holding the cross-species distributions.
pub const GLOBAL_SCOPE: &str = "Global";

/// Per-species series that carry one colour per trace. `completness` is the
/// key the report front-end reads; the corrected spelling is accepted too.
/// `phred` restarts at the first palette index like the others instead of
/// giving every trace the same colour.
const COLOURED_SERIES: [(&str, ColourTarget); 6] = [
    ("completness", ColourTarget::Marker),
    ("completeness", ColourTarget::Marker),
    ("lx", ColourTarget::Line),
    ("nax", ColourTarget::Line),
    ("ngx", ColourTarget::Line),
    ("phred", ColourTarget::Marker),
];

/// Optional per-species annotation series drawn on horizontal bands.
const ANNOTATION_SERIES: [&str; 3] = ["gaps", "snps", "misassembly"];

/// Merge plot fragments whose entries describe the same samples.
pub fn merge_plots(fragments: &[PlotFragment]) -> Keyed<PlotDocument> {
    let mut merged: Keyed<PlotDocument> = Keyed::new();
    let mut steps: HashMap<String, usize> = HashMap::new();

    for fragment in fragments {
        for (assembler, document) in fragment.iter() {
            match merged.get_mut(assembler) {
                Some(acc) => {
                    let step = steps.entry(assembler.to_string()).or_insert(0);
                    *step += 1;
                    debug!("Merging plots for {} (band {})", assembler, step);
                    append_document(acc, document.clone(), *step);
                }
                None => {
                    merged.insert(assembler.to_string(), document.clone());
                }
            }
        }
    }

    merged
}

/// Combine plot fragments that describe different samples.
///
/// A repeated key is replaced by the later fragment's document.
pub fn replace_plots(fragments: &[PlotFragment]) -> Keyed<PlotDocument> {
    fragments
        .iter()
        .flat_map(|fragment| fragment.iter())
        .map(|(key, document)| (key.to_string(), document.clone()))
        .collect()
}

/// Append one merge step's document onto the accumulated one.
fn append_document(acc: &mut PlotDocument, incoming: PlotDocument, band: usize) {
    for (scope, series) in incoming.plot_data {
        let Value::Object(mut series) = series else {
            warn!("Skipping plot scope '{}': not an object", scope);
            continue;
        };

        if scope != GLOBAL_SCOPE {
            prepare_species_scope(&mut series, band);
        }
        append_scope(&mut acc.plot_data, scope, series);
    }
}

/// Recolour the traces and band the annotations of an incoming species scope.
fn prepare_species_scope(scope: &mut Map<String, Value>, band: usize) {
    for (name, target) in COLOURED_SERIES {
        if let Some(items) = series_data(scope, name) {
            colour_series(items, target, FIRST_INDEX);
        }
    }

    for name in ANNOTATION_SERIES {
        if let Some(items) = series_data(scope, name) {
            place_on_band(items, band);
        }
    }
}

/// Set each annotation trace's vertical position pair to `[band, band]`.
fn place_on_band(items: &mut [Value], band: usize) {
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        item.insert("y".to_string(), json!([band, band]));
    }
}

fn series_data<'a>(scope: &'a mut Map<String, Value>, name: &str) -> Option<&'a mut Vec<Value>> {
    scope.get_mut(name)?.get_mut("data")?.as_array_mut()
}

/// Append every series of `incoming` to the accumulated scope.
fn append_scope(plot_data: &mut Map<String, Value>, scope: String, incoming: Map<String, Value>) {
    match plot_data.get_mut(&scope) {
        Some(Value::Object(acc)) => {
            for (name, series) in incoming {
                append_series(acc, &name, series);
            }
        }
        _ => {
            debug!("Adopting plot scope '{}'", scope);
            plot_data.insert(scope, Value::Object(incoming));
        }
    }
}

fn append_series(acc_scope: &mut Map<String, Value>, name: &str, incoming: Value) {
    match acc_scope.get_mut(name) {
        Some(Value::Object(acc)) => {
            let items = take_data(incoming);
            match acc.get_mut("data") {
                Some(Value::Array(data)) => data.extend(items),
                _ => {
                    acc.insert("data".to_string(), Value::Array(items));
                }
            }
        }
        _ => {
            acc_scope.insert(name.to_string(), incoming);
        }
    }
}

fn take_data(series: Value) -> Vec<Value> {
    match series {
        Value::Object(mut series) => match series.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
