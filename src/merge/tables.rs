//! Merging of result tables across fragments.

use crate::error::MergeError;
use crate::models::{Keyed, ResultTable, TableFragment};
use serde_json::Value;
use tracing::debug;

/// Merge table fragments whose entries describe the same samples.
///
/// A repeated assembler gets the incoming global rows appended in fragment
/// order, and every row of every incoming row group for a species appended
/// to the first row group of that species. Both entries must report the
/// same species; any species known to only one side is a mismatch.
pub fn merge_tables(fragments: &[TableFragment]) -> Result<Keyed<ResultTable>, MergeError> {
    let mut merged: Keyed<ResultTable> = Keyed::new();

    for fragment in fragments {
        for (assembler, table) in fragment.iter() {
            match merged.get_mut(assembler) {
                Some(acc) => {
                    debug!("Appending table rows for {}", assembler);
                    append_table(assembler, acc, table)?;
                }
                None => {
                    merged.insert(assembler.to_string(), table.clone());
                }
            }
        }
    }

    Ok(merged)
}

/// Combine table fragments that describe different samples.
///
/// A repeated key is replaced by the later fragment's entry.
pub fn replace_tables(fragments: &[TableFragment]) -> Keyed<ResultTable> {
    fragments
        .iter()
        .flat_map(|fragment| fragment.iter())
        .map(|(key, table)| (key.to_string(), table.clone()))
        .collect()
}

fn append_table(
    assembler: &str,
    acc: &mut ResultTable,
    incoming: &ResultTable,
) -> Result<(), MergeError> {
    let unknown = incoming
        .reference_tables
        .keys()
        .find(|species| !acc.reference_tables.contains_key(species.as_str()));
    let missing = || {
        acc.reference_tables
            .keys()
            .find(|species| !incoming.reference_tables.contains_key(species.as_str()))
    };
    if let Some(species) = unknown.or_else(missing) {
        return Err(MergeError::SpeciesMismatch {
            assembler: assembler.to_string(),
            species: species.clone(),
        });
    }

    acc.global_table.extend(incoming.global_table.iter().cloned());

    for (species, groups) in &incoming.reference_tables {
        let Some(target) = acc.reference_tables.get_mut(species) else {
            continue;
        };

        let rows: Vec<Value> = row_groups(groups)
            .flat_map(|group| row_group_rows(group).iter().cloned())
            .collect();
        append_to_first_group(target, rows);
    }

    Ok(())
}

fn row_groups(value: &Value) -> impl Iterator<Item = &Value> {
    value.as_array().into_iter().flatten()
}

fn row_group_rows(group: &Value) -> &[Value] {
    group.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Append rows to the first row group of a species, creating it if needed.
fn append_to_first_group(groups: &mut Value, rows: Vec<Value>) {
    match groups {
        Value::Array(list) => match list.first_mut() {
            Some(Value::Array(first)) => first.extend(rows),
            _ => list.insert(0, Value::Array(rows)),
        },
        other => *other = Value::Array(vec![Value::Array(rows)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragment(value: Value) -> TableFragment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_fragment_is_copied() {
        let tables = fragment(json!({
            "SPAdes": {
                "GlobalTable": [{"sample": "s1"}],
                "ReferenceTables": {"Ecoli": [[{"contigs": 3}]]}
            }
        }));

        let merged = merge_tables(&[tables.clone()]).unwrap();
        assert_eq!(merged, tables);
    }

    #[test]
    fn test_global_rows_concatenate_in_fragment_order() {
        let first = fragment(json!({
            "SPAdes": {"GlobalTable": [{"row": 1}, {"row": 2}], "ReferenceTables": {}}
        }));
        let second = fragment(json!({
            "SPAdes": {"GlobalTable": [{"row": 3}], "ReferenceTables": {}},
            "MEGAHIT": {"GlobalTable": [{"row": 9}], "ReferenceTables": {}}
        }));
        let third = fragment(json!({
            "SPAdes": {"GlobalTable": [{"row": 4}, {"row": 5}], "ReferenceTables": {}}
        }));

        let merged = merge_tables(&[first, second, third]).unwrap();

        let spades = merged.get("SPAdes").unwrap();
        assert_eq!(
            spades.global_table,
            vec![
                json!({"row": 1}),
                json!({"row": 2}),
                json!({"row": 3}),
                json!({"row": 4}),
                json!({"row": 5})
            ]
        );
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["SPAdes", "MEGAHIT"]);
    }

    #[test]
    fn test_species_rows_append_to_first_group() {
        let first = fragment(json!({
            "SPAdes": {
                "GlobalTable": [],
                "ReferenceTables": {"Ecoli": [[{"r": 1}], [{"other": true}]]}
            }
        }));
        let second = fragment(json!({
            "SPAdes": {
                "GlobalTable": [],
                "ReferenceTables": {"Ecoli": [[{"r": 2}, {"r": 3}], [{"r": 4}]]}
            }
        }));

        let merged = merge_tables(&[first, second]).unwrap();

        assert_eq!(
            merged.get("SPAdes").unwrap().reference_tables["Ecoli"],
            json!([[{"r": 1}, {"r": 2}, {"r": 3}, {"r": 4}], [{"other": true}]])
        );
    }

    #[test]
    fn test_unknown_species_is_a_mismatch() {
        let first = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[]]}}
        }));
        let second = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Saureus": [[{"r": 1}]]}}
        }));

        let err = merge_tables(&[first, second]).unwrap_err();
        match err {
            MergeError::SpeciesMismatch { assembler, species } => {
                assert_eq!(assembler, "SPAdes");
                assert_eq!(species, "Saureus");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_species_is_a_mismatch() {
        let first = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[]], "Saureus": [[]]}}
        }));
        let second = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[{"r": 1}]]}}
        }));

        let err = merge_tables(&[first, second]).unwrap_err();
        assert!(matches!(
            err,
            MergeError::SpeciesMismatch { ref species, .. } if species == "Saureus"
        ));
    }

    #[test]
    fn test_incoming_species_is_reported_first() {
        let first = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[]], "Saureus": [[]]}}
        }));
        let second = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[]], "Bsubtilis": [[]]}}
        }));

        let err = merge_tables(&[first, second]).unwrap_err();
        assert!(matches!(
            err,
            MergeError::SpeciesMismatch { ref species, .. } if species == "Bsubtilis"
        ));
    }

    #[test]
    fn test_mismatch_only_applies_to_repeated_assemblers() {
        let first = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[]]}}
        }));
        let second = fragment(json!({
            "MEGAHIT": {"GlobalTable": [], "ReferenceTables": {"Saureus": [[]]}}
        }));

        let merged = merge_tables(&[first, second]).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_empty_species_group_is_created() {
        let first = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": []}}
        }));
        let second = fragment(json!({
            "SPAdes": {"GlobalTable": [], "ReferenceTables": {"Ecoli": [[{"r": 1}]]}}
        }));

        let merged = merge_tables(&[first, second]).unwrap();
        assert_eq!(
            merged.get("SPAdes").unwrap().reference_tables["Ecoli"],
            json!([[{"r": 1}]])
        );
    }

    #[test]
    fn test_replace_tables_last_write_wins() {
        let first = fragment(json!({
            "sample_a": {"GlobalTable": [1], "ReferenceTables": {}},
            "sample_b": {"GlobalTable": [2], "ReferenceTables": {}}
        }));
        let second = fragment(json!({
            "sample_a": {"GlobalTable": [3], "ReferenceTables": {"Ecoli": []}}
        }));

        let merged = replace_tables(&[first, second]);

        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["sample_a", "sample_b"]);
        assert_eq!(merged.get("sample_a").unwrap().global_table, vec![json!(3)]);
    }
}
