// src/pipeline/analytics/shift.rs
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::ShiftParams;
use crate::data_model::AnalysisSelection;
use crate::error::{PipelineError, Result};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::CsvWriter;
use crate::utils::Lexicon;

/// Type frequencies of a tokenized corpus.
pub fn frequencies(tokens: &[String]) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for token in tokens {
        *freq.entry(token.clone()).or_insert(0) += 1;
    }
    freq
}

fn relative(freq: &HashMap<String, usize>, keep: impl Fn(&str) -> bool) -> HashMap<&str, f64> {
    let total: usize = freq
        .iter()
        .filter(|(w, _)| keep(w))
        .map(|(_, c)| *c)
        .sum();
    freq.iter()
        .filter(|(w, _)| keep(w))
        .map(|(w, c)| (w.as_str(), *c as f64 / total.max(1) as f64))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftEntry {
    pub word: String,
    pub p_reference: f64,
    pub p_comparison: f64,
    /// Lexicon score; `None` for the proportion shift.
    pub score: Option<f64>,
    pub contribution: f64,
    /// Contribution divided by the sum of absolute contributions.
    pub normalized: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordShift {
    pub entries: Vec<ShiftEntry>,
    /// Weighted averages of the reference and comparison corpora (sentiment shift only).
    pub averages: Option<(f64, f64)>,
}

impl WordShift {
    /// Entries ranked by absolute contribution, ties by word.
    pub fn top(&self, n: usize) -> Vec<&ShiftEntry> {
        let mut ranked: Vec<&ShiftEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .total_cmp(&a.contribution.abs())
                .then_with(|| a.word.cmp(&b.word))
        });
        ranked.truncate(n);
        ranked
    }
}

fn normalize(entries: &mut [ShiftEntry]) {
    let total: f64 = entries.iter().map(|e| e.contribution.abs()).sum();
    for entry in entries.iter_mut() {
        entry.normalized = if total > 0.0 {
            entry.contribution / total
        } else {
            0.0
        };
    }
}

/// Change in relative frequency of every type: `p_comparison - p_reference`.
pub fn proportion_shift(
    reference: &HashMap<String, usize>,
    comparison: &HashMap<String, usize>,
) -> WordShift {
    let p_ref = relative(reference, |_| true);
    let p_cmp = relative(comparison, |_| true);
    let types: BTreeSet<&str> = p_ref.keys().chain(p_cmp.keys()).copied().collect();
    let mut entries: Vec<ShiftEntry> = types
        .into_iter()
        .map(|w| {
            let (r, c) = (
                p_ref.get(w).copied().unwrap_or(0.0),
                p_cmp.get(w).copied().unwrap_or(0.0),
            );
            ShiftEntry {
                word: w.to_string(),
                p_reference: r,
                p_comparison: c,
                score: None,
                contribution: c - r,
                normalized: 0.0,
            }
        })
        .collect();
    normalize(&mut entries);
    WordShift {
        entries,
        averages: None,
    }
}

/// Weighted-average shift over types with a lexicon score outside the stop
/// lens: contribution `(p_comparison - p_reference) * (score - reference_value)`,
/// with relative frequencies renormalized over the scored types.
pub fn sentiment_shift(
    reference: &HashMap<String, usize>,
    comparison: &HashMap<String, usize>,
    lexicon: &Lexicon,
    params: &ShiftParams,
) -> WordShift {
    let (low, high) = params.stop_lens;
    let scored = |w: &str| {
        lexicon
            .score(w, 0)
            .is_some_and(|s| !(low..=high).contains(&s))
    };
    let p_ref = relative(reference, scored);
    let p_cmp = relative(comparison, scored);
    let types: BTreeSet<&str> = p_ref.keys().chain(p_cmp.keys()).copied().collect();

    let mut avg_ref = 0.0;
    let mut avg_cmp = 0.0;
    let mut entries = Vec::with_capacity(types.len());
    for w in types {
        let Some(score) = lexicon.score(w, 0) else { continue };
        let (r, c) = (
            p_ref.get(w).copied().unwrap_or(0.0),
            p_cmp.get(w).copied().unwrap_or(0.0),
        );
        avg_ref += r * score;
        avg_cmp += c * score;
        entries.push(ShiftEntry {
            word: w.to_string(),
            p_reference: r,
            p_comparison: c,
            score: Some(score),
            contribution: (c - r) * (score - params.reference_value),
            normalized: 0.0,
        });
    }
    normalize(&mut entries);
    WordShift {
        entries,
        averages: Some((avg_ref, avg_cmp)),
    }
}

fn write_shift(path: PathBuf, shift: &WordShift, top_n: usize, with_score: bool) -> Result<PathBuf> {
    let mut header = vec!["rank", "word", "p_reference", "p_comparison"];
    if with_score {
        header.push("score");
    }
    header.extend(["contribution", "normalized"]);
    let mut writer = CsvWriter::create(path, header)?;
    for (rank, e) in shift.top(top_n).into_iter().enumerate() {
        let mut row = vec![
            (rank + 1).to_string(),
            e.word.clone(),
            e.p_reference.to_string(),
            e.p_comparison.to_string(),
        ];
        if with_score {
            row.push(e.score.map(|s| s.to_string()).unwrap_or_default());
        }
        row.push(e.contribution.to_string());
        row.push(e.normalized.to_string());
        writer.write_row(row)?;
    }
    writer.close()
}

/// Compares two tokenized corpora and writes both shift tables into each project.
pub fn run_compare(
    reference: (&str, &ProjectLayout, &[String]),
    comparison: (&str, &ProjectLayout, &[String]),
    selection: &AnalysisSelection,
    params: &ShiftParams,
    lexicon: &Lexicon,
) -> Result<Vec<PathBuf>> {
    let (ref_key, ref_layout, ref_tokens) = reference;
    let (cmp_key, cmp_layout, cmp_tokens) = comparison;
    for (key, tokens) in [(ref_key, ref_tokens), (cmp_key, cmp_tokens)] {
        if tokens.is_empty() {
            return Err(PipelineError::AnalysisError(format!(
                "corpus of '{}' has no tokens for selection {}",
                key, selection
            )));
        }
    }

    let ref_freq = frequencies(ref_tokens);
    let cmp_freq = frequencies(cmp_tokens);
    let proportion = proportion_shift(&ref_freq, &cmp_freq);
    let sentiment = sentiment_shift(&ref_freq, &cmp_freq, lexicon, params);
    if sentiment.entries.is_empty() {
        warn!("No scored types outside the stop lens, sentiment shift is empty");
    }
    if let Some((avg_ref, avg_cmp)) = sentiment.averages {
        info!(
            reference = ref_key,
            comparison = cmp_key,
            avg_reference = avg_ref,
            avg_comparison = avg_cmp,
            "Weighted average happiness"
        );
    }

    let mut artifacts = Vec::new();
    for layout in [ref_layout, cmp_layout] {
        let stem = format!("{}_{}", ref_key, cmp_key);
        artifacts.push(write_shift(
            layout.analysis_path(&format!("{}_proportion", stem), selection, "csv"),
            &proportion,
            params.top_n,
            false,
        )?);
        artifacts.push(write_shift(
            layout.analysis_path(&format!("{}_sentiment", stem), selection, "csv"),
            &sentiment,
            params.top_n,
            true,
        )?);
    }
    info!(
        types_reference = ref_freq.len(),
        types_comparison = cmp_freq.len(),
        "Corpus comparison finished"
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn proportion_shift_sums_to_zero() {
        let a = freq(&[("cat", 2), ("dog", 2)]);
        let b = freq(&[("cat", 1), ("bird", 3)]);
        let shift = proportion_shift(&a, &b);
        let total: f64 = shift.entries.iter().map(|e| e.contribution).sum();
        assert!(total.abs() < 1e-12);
        let top = shift.top(1);
        assert_eq!(top[0].word, "bird");
        assert!((top[0].contribution - 0.75).abs() < 1e-12);
        let norm: f64 = shift.entries.iter().map(|e| e.normalized.abs()).sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sentiment_shift_excludes_stop_lens_and_unscored_types() {
        let lexicon = Lexicon::from_entries(
            1,
            [
                ("love", vec![8.0]),
                ("hate", vec![2.0]),
                ("table", vec![5.0]),
            ],
        );
        let a = freq(&[("love", 1), ("hate", 3), ("table", 10), ("zzz", 5)]);
        let b = freq(&[("love", 3), ("hate", 1), ("table", 10)]);
        let shift = sentiment_shift(&a, &b, &lexicon, &ShiftParams::default());
        let words: Vec<&str> = shift.entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["hate", "love"]);
        let love = &shift.entries[1];
        assert!((love.p_reference - 0.25).abs() < 1e-12);
        assert!((love.contribution - 0.5 * 3.0).abs() < 1e-12);
        let (avg_ref, avg_cmp) = shift.averages.unwrap();
        assert!((avg_ref - 3.5).abs() < 1e-12);
        assert!((avg_cmp - 6.5).abs() < 1e-12);
    }
}
