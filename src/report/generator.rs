//! Combined report generation.
//!
//! The HTML report is a fixed page for the LMAS front-end. Merged values are
//! injected as script constants at numbered placeholders:
//!
//! | Placeholder | Constant                    |
//! |-------------|-----------------------------|
//! | `{0}`       | `_assemblerPerformanceData` |
//! | `{1}`       | `_referenceData`            |
//! | `{2}`       | `_sampleData`               |
//! | `{3}`       | `_mainDataTables`           |
//! | `{4}`       | `_mainDataPlots`            |
//! | `{5}`       | `_sampleList`               |
//! | `{6}`       | `_minContigSize`            |
//! | `{7}`       | `_overviewMD`               |
//!
//! `{title}` and `{script}` are filled from the report settings.

use crate::config::ReportConfig;
use crate::models::{MergedReport, ReportMetadata};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

const DEFAULT_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{title}</title>
  </head>
  <body style="background-color: #666666">
    <div id="root"></div>
    <script> const _assemblerPerformanceData = {0} </script>
    <script> const _referenceData = {1} </script>
    <script> const _sampleData = {2} </script>
    <script> const _mainDataTables = {3} </script>
    <script> const _mainDataPlots = {4} </script>
    <script> const _sampleList = {5} </script>
    <script> const _minContigSize = {6} </script>
    <script> const _overviewMD = {7} </script>
    <script src="{script}"></script>
  </body>
</html>
"#;

/// Generate the combined HTML report.
pub fn generate_html_report(report: &MergedReport, config: &ReportConfig) -> Result<String> {
    let template = match config.template {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report template: {}", path))?,
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let values = [
        ("0", script_json(&report.performance)?),
        ("1", script_json(&report.references)?),
        ("2", script_json(&report.samples)?),
        ("3", script_json(&report.tables)?),
        ("4", script_json(&report.plots)?),
        ("5", script_json(&report.table_keys)?),
        ("6", script_json(&report.min_contig_size)?),
        ("7", report.overview.clone()),
        ("title", config.title.clone()),
        ("script", config.script.clone()),
    ];

    Ok(fill_template(&template, &values))
}

/// Serialize a value for embedding in a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/"))
}

/// Replace `{key}` placeholders in a single pass.
///
/// Unknown keys and lone braces are copied unchanged, and inserted values
/// are never scanned for further placeholders.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (value, close))
        });

        match value {
            Some((value, close)) => {
                output.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                output.push('{');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    #[serde(flatten)]
    report: &'a MergedReport,
}

/// Generate a JSON report.
pub fn generate_json_report(report: &MergedReport, metadata: &ReportMetadata) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport { metadata, report }).map_err(Into::into)
}

/// Write a generated report, creating parent directories as needed.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
