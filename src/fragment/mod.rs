//! Discovery and loading of report fragments.
//!
//! A fragment is one pipeline run's report folder. Each immediate
//! subdirectory of the report directory that holds a rendered page is a
//! fragment; its JSON documents are optional. Fragments are returned sorted
//! by directory name so the merge order is the same on every platform.

mod page;

pub use page::*;

use crate::config::FragmentsConfig;
use crate::error::MergeError;
use crate::models::{PerformanceEntry, PlotFragment, TableFragment};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One run's report data.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Name of the fragment directory.
    pub name: String,
    pub performance: Option<Vec<PerformanceEntry>>,
    pub tables: Option<TableFragment>,
    pub plots: Option<PlotFragment>,
    /// Values recovered from the rendered page.
    pub page: PageVariables,
}

/// Finds and reads fragments below a report directory.
pub struct FragmentScanner {
    root: PathBuf,
    files: FragmentsConfig,
}

impl FragmentScanner {
    /// Create a new fragment scanner.
    pub fn new(root: PathBuf, files: FragmentsConfig) -> Self {
        Self { root, files }
    }

    /// Fragment directories, sorted by name.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.with_context(|| {
                format!("Failed to list report directory: {}", self.root.display())
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                debug!("Skipping hidden directory {}", name);
                continue;
            }

            if entry.path().join(&self.files.page).is_file() {
                dirs.push(entry.into_path());
            } else {
                debug!("Skipping {}: no {}", name, self.files.page);
            }
        }

        if dirs.is_empty() {
            return Err(MergeError::ReportFoldersNotFound {
                dir: self.root.clone(),
            }
            .into());
        }

        info!("Found {} report folders in {}", dirs.len(), self.root.display());
        Ok(dirs)
    }

    /// Discover and read every fragment.
    pub fn load(&self, show_progress: bool) -> Result<Vec<Fragment>> {
        let dirs = self.discover()?;

        let progress = if show_progress {
            let pb = ProgressBar::new(dirs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .context("Invalid progress bar template")?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut fragments = Vec::with_capacity(dirs.len());
        for dir in &dirs {
            progress.set_message(dir_name(dir));
            fragments.push(self.load_fragment(dir)?);
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(fragments)
    }

    /// Read one fragment directory.
    pub fn load_fragment(&self, dir: &Path) -> Result<Fragment> {
        let name = dir_name(dir);

        let page_path = dir.join(&self.files.page);
        let page_text = fs::read_to_string(&page_path)
            .with_context(|| format!("Failed to read {}", page_path.display()))?;
        let page = PageVariables::parse(&page_text)
            .with_context(|| format!("Failed to read values from {}", page_path.display()))?;

        let fragment = Fragment {
            performance: read_json(&dir.join(&self.files.performance))?,
            tables: read_json(&dir.join(&self.files.tables))?,
            plots: read_json(&dir.join(&self.files.plots))?,
            name,
            page,
        };

        if fragment.performance.is_none() {
            warn!("{} has no {}", fragment.name, self.files.performance);
        }
        if fragment.tables.is_none() {
            warn!("{} has no {}", fragment.name, self.files.tables);
        }
        if fragment.plots.is_none() {
            warn!("{} has no {}", fragment.name, self.files.plots);
        }

        Ok(fragment)
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Read a JSON document if the file exists.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = "<script> const _referenceData = {\"ref\": {}} </script>\n\
                        <script> const _minContigSize = 1000 </script>\n";

    fn write_fragment(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.html"), PAGE).unwrap();
        dir
    }

    fn scanner(root: &Path) -> FragmentScanner {
        FragmentScanner::new(root.to_path_buf(), FragmentsConfig::default())
    }

    #[test]
    fn test_discover_sorted_fragments() {
        let temp_dir = TempDir::new().unwrap();
        write_fragment(temp_dir.path(), "run_b");
        write_fragment(temp_dir.path(), "run_a");
        fs::create_dir(temp_dir.path().join("no_page")).unwrap();
        write_fragment(temp_dir.path(), ".hidden");
        fs::write(temp_dir.path().join("index.html"), PAGE).unwrap();

        let dirs = scanner(temp_dir.path()).discover().unwrap();

        let names: Vec<_> = dirs.iter().map(|d| dir_name(d)).collect();
        assert_eq!(names, vec!["run_a", "run_b"]);
    }

    #[test]
    fn test_no_report_folders() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();

        let err = scanner(temp_dir.path()).discover().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MergeError>(),
            Some(MergeError::ReportFoldersNotFound { .. })
        ));
    }

    #[test]
    fn test_load_fragment_with_optional_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = write_fragment(temp_dir.path(), "run_a");
        fs::write(
            dir.join("performance_metadata.json"),
            r#"[{"assembler": "SPAdes", "avgTime": 1, "cpus": 2, "max_rss": 3, "avgRead": 4, "avgWrite": 5}]"#,
        )
        .unwrap();

        let fragment = scanner(temp_dir.path()).load_fragment(&dir).unwrap();

        assert_eq!(fragment.name, "run_a");
        assert_eq!(fragment.performance.unwrap()[0].assembler, "SPAdes");
        assert!(fragment.tables.is_none());
        assert!(fragment.plots.is_none());
        assert_eq!(fragment.page.min_contig_size, Some(serde_json::json!(1000)));
    }

    #[test]
    fn test_malformed_document_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = write_fragment(temp_dir.path(), "run_a");
        fs::write(dir.join("pipeline_report_tables.json"), "{\"SPAdes\": {}}").unwrap();

        let err = scanner(temp_dir.path()).load_fragment(&dir).unwrap_err();
        assert!(err.to_string().contains("pipeline_report_tables.json"));
    }

    #[test]
    fn test_load_all() {
        let temp_dir = TempDir::new().unwrap();
        write_fragment(temp_dir.path(), "one");
        write_fragment(temp_dir.path(), "two");

        let fragments = scanner(temp_dir.path()).load(false).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].name, "one");
    }
}
