//! Data models for report fragments and the combined report.
//!
//! Fragment documents are decoded into these types as soon as they are read,
//! so the merge engine only ever sees well-formed records. Parts of the
//! documents the engine does not interpret (table rows, plot traces) stay as
//! raw JSON values and pass through untouched.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::marker::PhantomData;

/// How fragments relate to each other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Fragments are runs over the same samples; repeated assembler entries are merged
    #[default]
    Assemblers,
    /// Fragments cover different samples; repeated entries are replaced
    Samples,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Assemblers => write!(f, "assemblers"),
            MergeMode::Samples => write!(f, "samples"),
        }
    }
}

/// One row of `performance_metadata.json`, before an `id` is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub assembler: String,
    #[serde(rename = "avgTime")]
    pub avg_time: Number,
    pub cpus: Number,
    pub max_rss: Number,
    #[serde(rename = "avgRead")]
    pub avg_read: Number,
    #[serde(rename = "avgWrite")]
    pub avg_write: Number,
    /// Any other columns the pipeline reported.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A consolidated performance row as shown in the combined report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    #[serde(flatten)]
    pub entry: PerformanceEntry,
    pub id: usize,
}

/// Tabular results for one assembler (or sample).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    #[serde(rename = "GlobalTable")]
    pub global_table: Vec<Value>,
    /// Species name to a list of row groups, each a list of rows.
    #[serde(rename = "ReferenceTables")]
    pub reference_tables: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Plot series for one assembler (or sample), keyed by scope.
///
/// The scope is either `Global` or a species name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotDocument {
    #[serde(rename = "PlotData", default)]
    pub plot_data: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entries keyed by assembler or sample name, in first-seen order.
///
/// Inserting an existing key replaces the value in place, so the key keeps
/// its original position.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Keyed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or replace; returns the previous value for the key.
    pub fn insert(&mut self, key: String, value: T) -> Option<T> {
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<T> IntoIterator for Keyed<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T> FromIterator<(String, T)> for Keyed<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut keyed = Keyed::new();
        for (key, value) in iter {
            keyed.insert(key, value);
        }
        keyed
    }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct KeyedVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
    type Value = Keyed<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by assembler or sample name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut keyed = Keyed::new();
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            keyed.insert(key, value);
        }
        Ok(keyed)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(KeyedVisitor(PhantomData))
    }
}

/// Contents of `pipeline_report_tables.json`.
pub type TableFragment = Keyed<ResultTable>;

/// Contents of `pipeline_report_plots.json`.
pub type PlotFragment = Keyed<PlotDocument>;

/// Metadata about a combined report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// When the combined report was produced.
    pub generated_at: DateTime<Utc>,
    /// Merge mode used for tables and plots.
    pub mode: MergeMode,
    /// Fragment directory names, in merge order.
    pub fragments: Vec<String>,
}

/// The combined report: the values injected into the report template.
#[derive(Debug, Clone, Serialize)]
pub struct MergedReport {
    pub performance: Vec<PerformanceRecord>,
    pub references: Map<String, Value>,
    pub samples: Map<String, Value>,
    pub tables: Keyed<ResultTable>,
    pub plots: Keyed<PlotDocument>,
    /// Table keys, in first-seen order.
    pub table_keys: Vec<String>,
    pub min_contig_size: Value,
    /// Caption shown in the report overview.
    pub overview: String,
}
