// src/pipeline/writers/csv_writer.rs
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::data_model::Schema;
use crate::error::Result;
use crate::pipeline::writers::BaseWriter;

/// Writes a CSV artifact through a `.partial` sibling that is renamed into
/// place on `close`. Dropping an unclosed writer removes the partial file, so
/// readers never see a truncated artifact.
pub struct CsvWriter {
    final_path: PathBuf,
    partial_path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows: usize,
}

impl CsvWriter {
    /// Opens a writer and writes `header` as the first row.
    pub fn create<P, I, S>(path: P, header: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let final_path = path.as_ref().to_path_buf();
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut partial_name = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        partial_name.push(".partial");
        let partial_path = final_path.with_file_name(partial_name);

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&partial_path)?;
        writer.write_record(header)?;

        Ok(CsvWriter {
            final_path,
            partial_path,
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Opens a writer for a fixed-schema artifact.
    pub fn for_schema<T: Schema, P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create(path, T::COLUMNS)
    }

    pub fn write_row<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_record(fields)?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.serialize(record)?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.final_path
    }

    /// Flushes and moves the artifact into place. Returns its final path.
    pub fn close(mut self) -> Result<PathBuf> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            drop(writer);
            fs::rename(&self.partial_path, &self.final_path)?;
            debug!(path = %self.final_path.display(), rows = self.rows, "Wrote CSV artifact");
        }
        Ok(self.final_path.clone())
    }
}

impl<T: Serialize> BaseWriter<T> for CsvWriter {
    fn write_batch(&mut self, records: &[T]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn close(self) -> Result<()> {
        CsvWriter::close(self).map(|_| ())
    }
}

impl Drop for CsvWriter {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            if let Err(e) = fs::remove_file(&self.partial_path) {
                warn!(path = %self.partial_path.display(), error = %e, "Failed to remove partial output");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn close_moves_partial_into_place() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.csv");
        let mut writer = CsvWriter::create(&target, ["word", "count"]).unwrap();
        writer.write_row(["cat", "2"]).unwrap();
        assert!(!target.exists());
        assert!(dir.path().join("out.csv.partial").exists());
        writer.close().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "word,count\ncat,2\n");
        assert!(!dir.path().join("out.csv.partial").exists());
    }

    #[test]
    fn dropped_writer_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.csv");
        {
            let mut writer = CsvWriter::create(&target, ["word"]).unwrap();
            writer.write_row(["cat"]).unwrap();
        }
        assert!(!target.exists());
        assert!(!dir.path().join("out.csv.partial").exists());
    }

    #[test]
    fn empty_artifact_still_has_header() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("empty.csv");
        CsvWriter::create(&target, ["a", "b"]).unwrap().close().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "a,b\n");
    }
}
