// src/pipeline/analytics/mod.rs

pub mod embeddings;
pub mod sentiment;
pub mod shift;
pub mod tfidf;
pub mod tokenize;
pub mod wordcount;

use tracing::{info, warn};

use crate::data_model::{AnalysisSelection, CleanedRecord};
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::{BaseReader, CsvReader};
use crate::pipeline::store::ProjectLayout;

/// Loads the deduplicated corpus and keeps the records matching `selection`.
///
/// A missing corpus or one without records is an error; an empty selection is not.
pub fn load_corpus(
    layout: &ProjectLayout,
    selection: &AnalysisSelection,
) -> Result<Vec<CleanedRecord>> {
    let path = layout.deduplicated_path();
    let records = CsvReader::<CleanedRecord>::new(&path).read_all()?;
    if records.is_empty() {
        return Err(PipelineError::EmptyCorpus { path });
    }
    let total = records.len();
    let selected: Vec<CleanedRecord> = records
        .into_iter()
        .filter(|r| selection.matches(&r.created_at))
        .collect();
    if selected.is_empty() {
        warn!(%selection, total, "No records match the date selection");
    } else {
        info!(%selection, total, selected = selected.len(), "Loaded corpus");
    }
    Ok(selected)
}

/// Records in analysis order: by `created_at` (stable) when `chronological`, else file order.
pub fn analysis_order(records: &[CleanedRecord], chronological: bool) -> Vec<&CleanedRecord> {
    let mut ordered: Vec<&CleanedRecord> = records.iter().collect();
    if chronological {
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
    ordered
}

/// Records oldest-first. Without timestamps to sort on, the collected
/// newest-first file order is reversed.
pub fn oldest_first(records: &[CleanedRecord], chronological: bool) -> Vec<&CleanedRecord> {
    if chronological {
        analysis_order(records, true)
    } else {
        records.iter().rev().collect()
    }
}

/// Formats an optional score, undefined as an empty field.
pub(crate) fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, created_at: &str) -> CleanedRecord {
        CleanedRecord {
            id: id.to_string(),
            created_at: created_at.to_string(),
            text: String::new(),
            words: vec![],
            stopwords_removed: vec![],
            lemmas: vec![],
        }
    }

    #[test]
    fn ordering_modes() {
        let records = vec![
            record("3", "2020-01-03 00:00:00+00:00"),
            record("1", "2020-01-01 00:00:00+00:00"),
            record("2", "2020-01-02 00:00:00+00:00"),
        ];
        let ids = |v: Vec<&CleanedRecord>| v.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(analysis_order(&records, true)), vec!["1", "2", "3"]);
        assert_eq!(ids(analysis_order(&records, false)), vec!["3", "1", "2"]);
        assert_eq!(ids(oldest_first(&records, false)), vec!["2", "1", "3"]);
    }
}
