// src/pipeline/dedup.rs
use std::collections::HashSet;
use std::path::PathBuf;

use tracing::info;

use crate::data_model::CleanedRecord;
use crate::error::Result;
use crate::pipeline::readers::{BaseReader, CsvReader};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::{BaseWriter, CsvWriter};

/// Keeps the first record for every id, preserving order.
pub fn deduplicate(records: Vec<CleanedRecord>) -> Vec<CleanedRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    pub records_in: usize,
    pub records_out: usize,
    pub artifact: PathBuf,
}

/// Merged corpus → deduplicated corpus.
pub fn deduplicate_project(layout: &ProjectLayout) -> Result<DedupOutcome> {
    let records = CsvReader::<CleanedRecord>::new(layout.merged_path()).read_all()?;
    let records_in = records.len();
    let unique = deduplicate(records);

    let mut writer = CsvWriter::for_schema::<CleanedRecord, _>(layout.deduplicated_path())?;
    writer.write_batch(&unique)?;
    let artifact = writer.close()?;

    info!(
        records_in,
        records_out = unique.len(),
        removed = records_in - unique.len(),
        "Deduplication finished"
    );
    Ok(DedupOutcome {
        records_in,
        records_out: unique.len(),
        artifact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str) -> CleanedRecord {
        CleanedRecord {
            id: id.to_string(),
            created_at: "2020-01-01 00:00:00+00:00".to_string(),
            text: text.to_string(),
            words: vec![],
            stopwords_removed: vec![],
            lemmas: vec![],
        }
    }

    #[test]
    fn keeps_first_occurrence_in_order() {
        let out = deduplicate(vec![record("2", "a"), record("1", "b"), record("2", "c")]);
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(out[0].text, "a");
    }

    #[test]
    fn is_idempotent() {
        let once = deduplicate(vec![record("3", "x"), record("3", "y"), record("4", "z")]);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }
}
