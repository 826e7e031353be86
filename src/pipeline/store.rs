// src/pipeline/store.rs
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::data_model::AnalysisSelection;
use crate::error::Result;

pub const RAW_DIR: &str = "raw";
pub const CLEANED_DIR: &str = "cleaned";
pub const ANALYSIS_DIR: &str = "analysis";
pub const MERGED_FILE: &str = "merged.csv";
pub const DEDUPLICATED_FILE: &str = "deduplicated.csv";

/// On-disk layout of one project: `<base>/<key>/{raw,cleaned,analysis}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new<P: AsRef<Path>>(base_path: P, key: &str) -> Self {
        ProjectLayout {
            root: base_path.as_ref().join(key),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.root.join(CLEANED_DIR)
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.root.join(ANALYSIS_DIR)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.analysis_dir().join(MERGED_FILE)
    }

    pub fn deduplicated_path(&self) -> PathBuf {
        self.analysis_dir().join(DEDUPLICATED_FILE)
    }

    /// Cleaned batch written for a raw batch: same file name under `cleaned/`.
    pub fn cleaned_path_for(&self, raw_batch: &Path) -> PathBuf {
        match raw_batch.file_name() {
            Some(name) => self.cleaned_dir().join(name),
            None => self.cleaned_dir().join(raw_batch),
        }
    }

    pub fn raw_batch_path(&self, newest_id: &str) -> PathBuf {
        self.raw_dir().join(format!("{}.csv", newest_id))
    }

    /// `analysis/<stem>_<selection>.<ext>`.
    pub fn analysis_path(&self, stem: &str, selection: &AnalysisSelection, ext: &str) -> PathBuf {
        self.analysis_dir()
            .join(format!("{}_{}.{}", stem, selection.label(), ext))
    }

    /// Creates the project directories. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.raw_dir(), self.cleaned_dir(), self.analysis_dir()] {
            fs::create_dir_all(&dir)?;
        }
        debug!(root = %self.root.display(), "Project layout ready");
        Ok(())
    }

    /// Raw batch files in processing order: numeric stems ascending, then
    /// non-numeric stems by name. Only `*.csv` files are listed.
    pub fn raw_batches(&self) -> Result<Vec<PathBuf>> {
        let raw_dir = self.raw_dir();
        if !raw_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut batches = Vec::new();
        for entry in fs::read_dir(&raw_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                batches.push(path);
            }
        }
        batches.sort_by(|a, b| compare_batches(a, b));
        Ok(batches)
    }

    /// Highest numeric raw batch id, the collection cursor.
    pub fn latest_post_id(&self) -> Result<Option<u64>> {
        Ok(self
            .raw_batches()?
            .iter()
            .filter_map(|p| batch_id(p))
            .max())
    }
}

fn batch_id(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.parse().ok()
}

fn compare_batches(a: &Path, b: &Path) -> Ordering {
    match (batch_id(a), batch_id(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.file_name().cmp(&b.file_name()),
    }
}
