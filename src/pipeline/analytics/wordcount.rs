// src/pipeline/analytics/wordcount.rs
use std::collections::HashMap;
use std::path::PathBuf;

use itertools::Itertools;
use tracing::info;

use crate::config::WordcountParams;
use crate::data_model::{AnalysisSelection, CleanedRecord};
use crate::error::Result;
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::CsvWriter;

/// Lemma frequencies, most frequent first, ties by word.
pub fn count_lemmas(records: &[CleanedRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for lemma in records.iter().flat_map(|r| r.lemmas.iter()) {
        *counts.entry(lemma.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(w, c)| (w.to_string(), c))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}

/// The `limit` most frequent terms with weights relative to the most frequent one.
pub fn cloud_terms(counts: &[(String, usize)], limit: usize) -> Vec<(String, usize, f64)> {
    let max = counts.first().map(|(_, c)| *c).unwrap_or(0);
    counts
        .iter()
        .take(limit)
        .map(|(w, c)| (w.clone(), *c, *c as f64 / max as f64))
        .collect()
}

pub fn run_wordcount(
    layout: &ProjectLayout,
    records: &[CleanedRecord],
    selection: &AnalysisSelection,
    params: &WordcountParams,
) -> Result<Vec<PathBuf>> {
    let counts = count_lemmas(records);

    let mut table = CsvWriter::create(
        layout.analysis_path("wordcount", selection, "csv"),
        ["word", "count"],
    )?;
    for (word, count) in &counts {
        table.write_row([word.clone(), count.to_string()])?;
    }

    let mut cloud = CsvWriter::create(
        layout.analysis_path("wordcloud", selection, "csv"),
        ["word", "count", "weight"],
    )?;
    for (word, count, weight) in cloud_terms(&counts, params.cloud_terms) {
        cloud.write_row([word, count.to_string(), format!("{:.4}", weight)])?;
    }

    info!(
        distinct = counts.len(),
        tokens = counts.iter().map(|(_, c)| c).sum::<usize>(),
        "Word count finished"
    );
    Ok(vec![table.close()?, cloud.close()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lemmas: &[&str]) -> CleanedRecord {
        CleanedRecord {
            id: "1".to_string(),
            created_at: "2020-01-01 00:00:00+00:00".to_string(),
            text: String::new(),
            words: lemmas.iter().map(|s| s.to_string()).collect(),
            stopwords_removed: lemmas.iter().map(|s| s.to_string()).collect(),
            lemmas: lemmas.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn counts_sum_to_token_total() {
        let records = vec![record(&["cat", "dog", "cat"]), record(&["bird", "cat"]), record(&[])];
        let counts = count_lemmas(&records);
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 5);
        assert_eq!(counts[0], ("cat".to_string(), 3));
        assert_eq!(counts[1], ("bird".to_string(), 1));
        assert_eq!(counts[2], ("dog".to_string(), 1));
    }

    #[test]
    fn cloud_weights_are_relative_to_top_term() {
        let counts = vec![("a".to_string(), 4), ("b".to_string(), 2), ("c".to_string(), 1)];
        let cloud = cloud_terms(&counts, 2);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0].2, 1.0);
        assert_eq!(cloud[1].2, 0.5);
        assert!(cloud_terms(&[], 30).is_empty());
    }
}
