//! Consolidation of per-assembler performance metrics.

use crate::models::{PerformanceEntry, PerformanceRecord};
use serde_json::Number;
use std::collections::HashMap;
use tracing::debug;

/// Merge performance fragments into one record per assembler.
///
/// Repeated assemblers keep the largest value seen for every metric, so the
/// combined report never understates cost. Other columns come from the first
/// fragment that reported the assembler. Ids follow first-seen order.
pub fn merge_performance(fragments: &[Vec<PerformanceEntry>]) -> Vec<PerformanceRecord> {
    let mut merged: Vec<PerformanceEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in fragments.iter().flatten() {
        match index.get(&entry.assembler) {
            Some(&slot) => {
                debug!("Consolidating performance for {}", entry.assembler);
                keep_maximum(&mut merged[slot], entry);
            }
            None => {
                index.insert(entry.assembler.clone(), merged.len());
                merged.push(entry.clone());
            }
        }
    }

    merged
        .into_iter()
        .enumerate()
        .map(|(id, mut entry)| {
            entry.extra.remove("id");
            PerformanceRecord { entry, id }
        })
        .collect()
}

/// Raise every metric of `acc` to the incoming value where that is larger.
fn keep_maximum(acc: &mut PerformanceEntry, incoming: &PerformanceEntry) {
    max_into(&mut acc.avg_time, &incoming.avg_time);
    max_into(&mut acc.cpus, &incoming.cpus);
    max_into(&mut acc.max_rss, &incoming.max_rss);
    max_into(&mut acc.avg_read, &incoming.avg_read);
    max_into(&mut acc.avg_write, &incoming.avg_write);
}

fn max_into(acc: &mut Number, incoming: &Number) {
    if as_f64(incoming) > as_f64(acc) {
        *acc = incoming.clone();
    }
}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NEG_INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn entries(value: Value) -> Vec<PerformanceEntry> {
        serde_json::from_value(value).unwrap()
    }

    fn metrics(record: &PerformanceRecord) -> Value {
        let mut value = serde_json::to_value(record).unwrap();
        value.as_object_mut().unwrap().remove("id");
        value
    }

    #[test]
    fn test_repeated_assembler_keeps_maximum() {
        let first = entries(json!([
            {"assembler": "A", "avgTime": 10, "cpus": 4, "max_rss": 100, "avgRead": 1, "avgWrite": 1}
        ]));
        let second = entries(json!([
            {"assembler": "A", "avgTime": 20, "cpus": 2, "max_rss": 50, "avgRead": 2, "avgWrite": 2}
        ]));

        let merged = merge_performance(&[first, second]);

        assert_eq!(merged.len(), 1);
        assert_eq!(
            serde_json::to_value(&merged[0]).unwrap(),
            json!({
                "assembler": "A", "avgTime": 20, "cpus": 4, "max_rss": 100,
                "avgRead": 2, "avgWrite": 2, "id": 0
            })
        );
    }

    #[test]
    fn test_metrics_do_not_depend_on_fragment_order() {
        let first = entries(json!([
            {"assembler": "A", "avgTime": 10.5, "cpus": 4, "max_rss": 100, "avgRead": 1, "avgWrite": 7},
            {"assembler": "B", "avgTime": 3, "cpus": 1, "max_rss": 10, "avgRead": 1, "avgWrite": 1}
        ]));
        let second = entries(json!([
            {"assembler": "B", "avgTime": 4, "cpus": 8, "max_rss": 5, "avgRead": 0, "avgWrite": 9},
            {"assembler": "A", "avgTime": 2, "cpus": 16, "max_rss": 1, "avgRead": 3, "avgWrite": 1}
        ]));

        let forward = merge_performance(&[first.clone(), second.clone()]);
        let backward = merge_performance(&[second, first]);

        let find = |records: &[PerformanceRecord], name: &str| {
            metrics(records.iter().find(|r| r.entry.assembler == name).unwrap())
        };
        assert_eq!(find(&forward, "A"), find(&backward, "A"));
        assert_eq!(find(&forward, "B"), find(&backward, "B"));
        assert_eq!(find(&forward, "A")["avgTime"], json!(10.5));
        assert_eq!(find(&forward, "B")["cpus"], json!(8));
    }

    #[test]
    fn test_ids_follow_first_seen_order() {
        let first = entries(json!([
            {"assembler": "B", "avgTime": 1, "cpus": 1, "max_rss": 1, "avgRead": 1, "avgWrite": 1}
        ]));
        let second = entries(json!([
            {"assembler": "A", "avgTime": 1, "cpus": 1, "max_rss": 1, "avgRead": 1, "avgWrite": 1},
            {"assembler": "B", "avgTime": 1, "cpus": 1, "max_rss": 1, "avgRead": 1, "avgWrite": 1},
            {"assembler": "C", "avgTime": 1, "cpus": 1, "max_rss": 1, "avgRead": 1, "avgWrite": 1, "id": 7}
        ]));

        let merged = merge_performance(&[first, second]);

        let order: Vec<_> = merged
            .iter()
            .map(|r| (r.entry.assembler.as_str(), r.id))
            .collect();
        assert_eq!(order, vec![("B", 0), ("A", 1), ("C", 2)]);
        assert_eq!(serde_json::to_value(&merged[2]).unwrap()["id"], json!(2));
    }

    #[test]
    fn test_no_fragments_yields_no_records() {
        assert!(merge_performance(&[]).is_empty());
        assert!(merge_performance(&[Vec::new(), Vec::new()]).is_empty());
    }
}
