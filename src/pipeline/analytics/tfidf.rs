// src/pipeline/analytics/tfidf.rs
use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::TfidfParams;
use crate::data_model::{AnalysisSelection, CleanedRecord};
use crate::error::{PipelineError, Result};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::CsvWriter;
use crate::utils::text::TFIDF_TOKEN;
use crate::utils::ENGLISH_STOP_WORD_SET;

/// Document-term matrix with terms in alphabetical order and L2-normalized rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    pub terms: Vec<String>,
    pub idf: Vec<f64>,
    pub rows: Vec<Vec<f64>>,
}

fn tokenize(doc: &str) -> Vec<String> {
    let lowered = doc.to_lowercase();
    TFIDF_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !ENGLISH_STOP_WORD_SET.contains(*t))
        .map(str::to_string)
        .collect()
}

/// Term frequency–inverse document frequency with smoothed idf
/// `ln((1 + n) / (1 + df)) + 1`.
pub fn compute_tfidf(docs: &[&str], params: &TfidfParams) -> Result<TfidfMatrix> {
    let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();
    let n_docs = tokenized.len();

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    let mut term_freq: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokenized {
        let mut seen: Vec<&str> = Vec::new();
        for token in tokens {
            *term_freq.entry(token.as_str()).or_insert(0) += 1;
            if !seen.contains(&token.as_str()) {
                seen.push(token.as_str());
            }
        }
        for term in seen {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let max_doc_count = params.max_df * n_docs as f64;
    let mut kept: Vec<&str> = doc_freq
        .iter()
        .filter(|&(_, &df)| df >= params.min_df && df as f64 <= max_doc_count)
        .map(|(term, _)| *term)
        .collect();
    kept.sort_by(|a, b| term_freq[b].cmp(&term_freq[a]).then_with(|| a.cmp(b)));
    kept.truncate(params.max_features);
    kept.sort_unstable();

    if kept.is_empty() {
        return Err(PipelineError::AnalysisError(format!(
            "TF-IDF pruning left no terms ({} documents, min_df {}, max_df {})",
            n_docs, params.min_df, params.max_df
        )));
    }

    let column: HashMap<&str, usize> = kept.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    let idf: Vec<f64> = kept
        .iter()
        .map(|t| ((1.0 + n_docs as f64) / (1.0 + doc_freq[t] as f64)).ln() + 1.0)
        .collect();

    let rows = tokenized
        .iter()
        .map(|tokens| {
            let mut row = vec![0.0; kept.len()];
            for token in tokens {
                if let Some(&i) = column.get(token.as_str()) {
                    row[i] += 1.0;
                }
            }
            for (value, weight) in row.iter_mut().zip(&idf) {
                *value *= weight;
            }
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|v| *v /= norm);
            }
            row
        })
        .collect();

    Ok(TfidfMatrix {
        terms: kept.into_iter().map(str::to_string).collect(),
        idf,
        rows,
    })
}

pub fn run_tfidf(
    layout: &ProjectLayout,
    records: &[CleanedRecord],
    selection: &AnalysisSelection,
    params: &TfidfParams,
) -> Result<Vec<PathBuf>> {
    let docs: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let matrix = compute_tfidf(&docs, params)?;

    let header = std::iter::once("id").chain(matrix.terms.iter().map(String::as_str));
    let mut writer = CsvWriter::create(layout.analysis_path("tfidf", selection, "csv"), header)?;
    for (record, row) in records.iter().zip(&matrix.rows) {
        let fields = std::iter::once(record.id.clone()).chain(row.iter().map(|v| v.to_string()));
        writer.write_row(fields)?;
    }
    info!(
        documents = records.len(),
        terms = matrix.terms.len(),
        "TF-IDF finished"
    );
    Ok(vec![writer.close()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_df: usize, max_df: f64, max_features: usize) -> TfidfParams {
        TfidfParams {
            max_features,
            min_df,
            max_df,
        }
    }

    #[test]
    fn smooth_idf_and_normalized_rows() {
        let docs = ["apple banana", "apple cherry", "banana banana"];
        let matrix = compute_tfidf(&docs, &params(1, 1.0, 10)).unwrap();
        assert_eq!(matrix.terms, vec!["apple", "banana", "cherry"]);
        let expected_idf = (4.0f64 / 3.0).ln() + 1.0;
        assert!((matrix.idf[0] - expected_idf).abs() < 1e-12);
        for row in &matrix.rows {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
        assert_eq!(matrix.rows[2][0], 0.0);
        assert!((matrix.rows[2][1] - 1.0).abs() < 1e-12);
        assert_eq!(matrix.rows[2][2], 0.0);
    }

    #[test]
    fn document_frequency_bounds_prune_terms() {
        let docs = ["common rare", "common other", "common other", "common"];
        // "common" appears in every document and exceeds max_df; "rare" is below min_df.
        let matrix = compute_tfidf(&docs, &params(2, 0.7, 10)).unwrap();
        assert_eq!(matrix.terms, vec!["other"]);
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let docs = ["alpha alpha beta", "gamma beta alpha", "delta"];
        let matrix = compute_tfidf(&docs, &params(1, 1.0, 2)).unwrap();
        assert_eq!(matrix.terms, vec!["alpha", "beta"]);
    }

    #[test]
    fn pruning_everything_is_an_error() {
        let docs = ["one", "two"];
        assert!(matches!(
            compute_tfidf(&docs, &params(5, 0.7, 2000)),
            Err(PipelineError::AnalysisError(_))
        ));
    }
}
