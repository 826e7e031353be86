// src/pipeline/analytics/sentiment.rs
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::SentimentParams;
use crate::data_model::{AnalysisSelection, CleanedRecord, Metric, Schema};
use crate::error::Result;
use crate::pipeline::analytics::tokenize::tokenize_corpus;
use crate::pipeline::analytics::{analysis_order, format_optional, oldest_first};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::CsvWriter;
use crate::utils::{Lemmatizer, Lexicon};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean lexicon score of the matched tokens, or `None` when nothing matched.
pub fn mean_score<S: AsRef<str>>(tokens: &[S], lexicon: &Lexicon, column: usize) -> Option<f64> {
    let (sum, count) = tokens
        .iter()
        .filter_map(|t| lexicon.score(t.as_ref(), column))
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Per-record score rounded to two decimals.
pub fn average_score(lemmas: &[String], lexicon: &Lexicon, metric: Metric) -> Option<f64> {
    mean_score(lemmas, lexicon, metric.index()).map(round2)
}

/// Trailing rolling mean. A window that is incomplete or contains an
/// undefined value is undefined.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            slice
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|s| s / window as f64)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub window: usize,
    /// Position of the window through the corpus, in percent.
    pub progress: f64,
    pub average: Option<f64>,
}

/// Average score over windows of `width` tokens starting every `step` tokens.
/// A trailing window shorter than `width` is skipped.
pub fn sliding_series(
    tokens: &[String],
    lexicon: &Lexicon,
    metric: Metric,
    width: usize,
    step: usize,
) -> Vec<SeriesPoint> {
    if width == 0 || step == 0 {
        return Vec::new();
    }
    let averages: Vec<Option<f64>> = (0..tokens.len())
        .step_by(step)
        .filter(|start| start + width <= tokens.len())
        .map(|start| mean_score(&tokens[start..start + width], lexicon, metric.index()))
        .collect();
    let n = averages.len();
    averages
        .into_iter()
        .enumerate()
        .map(|(i, average)| SeriesPoint {
            window: i,
            progress: (i + 1) as f64 / n as f64 * 100.0,
            average,
        })
        .collect()
}

fn rolling_columns(params: &SentimentParams) -> Vec<String> {
    Metric::ALL
        .iter()
        .flat_map(|m| {
            params
                .rolling_windows
                .iter()
                .map(move |w| format!("{}_rolling_{}", m.name(), w))
        })
        .collect()
}

pub fn run_sentiment(
    layout: &ProjectLayout,
    records: &[CleanedRecord],
    selection: &AnalysisSelection,
    metric: Metric,
    params: &SentimentParams,
    lexicon: &Lexicon,
    lemmatizer: &dyn Lemmatizer,
) -> Result<Vec<PathBuf>> {
    if records.is_empty() {
        warn!(%selection, "Sentiment outputs will be empty");
    }
    let ordered = analysis_order(records, params.chronological);

    // scores[metric][record]
    let scores: Vec<Vec<Option<f64>>> = Metric::ALL
        .iter()
        .map(|m| {
            ordered
                .iter()
                .map(|r| average_score(&r.lemmas, lexicon, *m))
                .collect()
        })
        .collect();
    let rolling: Vec<Vec<Option<f64>>> = scores
        .iter()
        .flat_map(|series| {
            params
                .rolling_windows
                .iter()
                .map(move |w| rolling_mean(series, *w))
        })
        .collect();

    let header = CleanedRecord::COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(Metric::ALL.iter().map(|m| m.name().to_string()))
        .chain(rolling_columns(params));
    let mut table = CsvWriter::create(layout.analysis_path("sentiment", selection, "csv"), header)?;
    for (i, record) in ordered.iter().enumerate() {
        let fields = vec![
            record.id.clone(),
            record.created_at.clone(),
            record.text.clone(),
            serde_json::to_string(&record.words)?,
            serde_json::to_string(&record.stopwords_removed)?,
            serde_json::to_string(&record.lemmas)?,
        ]
        .into_iter()
        .chain(scores.iter().map(|s| format_optional(s[i])))
        .chain(rolling.iter().map(|s| format_optional(s[i])));
        table.write_row(fields)?;
    }
    let mut artifacts = vec![table.close()?];

    let corpus = oldest_first(records, params.chronological);
    let tokens = tokenize_corpus(corpus.iter().map(|r| r.text.as_str()), lemmatizer);
    debug!(tokens = tokens.len(), "Tokenized corpus for time series");

    let series = sliding_series(&tokens, lexicon, metric, params.series_width, params.series_step);
    let mut writer = CsvWriter::create(
        layout.analysis_path(&format!("{}_timeseries", metric), selection, "csv"),
        ["window", "progress", "average"],
    )?;
    for point in &series {
        writer.write_row([
            point.window.to_string(),
            format!("{:.4}", point.progress),
            format_optional(point.average),
        ])?;
    }
    artifacts.push(writer.close()?);

    let mut grid = CsvWriter::create(
        layout.analysis_path(&format!("{}_timeseries_sensitivity", metric), selection, "csv"),
        ["step", "width", "window", "progress", "average"],
    )?;
    for &step in &params.sensitivity_steps {
        for &width in &params.sensitivity_widths {
            let points = sliding_series(&tokens, lexicon, metric, width, step);
            debug!(step, width, windows = points.len(), "Sensitivity series");
            for point in points {
                grid.write_row([
                    step.to_string(),
                    width.to_string(),
                    point.window.to_string(),
                    format!("{:.4}", point.progress),
                    format_optional(point.average),
                ])?;
            }
        }
    }
    artifacts.push(grid.close()?);

    info!(
        records = records.len(),
        %metric,
        windows = series.len(),
        "Sentiment analysis finished"
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::from_entries(
            3,
            [
                ("happy", vec![8.0, 6.0, 7.0]),
                ("sad", vec![2.0, 3.0, 3.0]),
                ("okay", vec![5.5, 4.0, 5.0]),
            ],
        )
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rolling_window_of_three() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        assert_eq!(
            rolling_mean(&values, 3),
            vec![None, None, Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn undefined_values_propagate_through_windows() {
        let values = [Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        assert_eq!(
            rolling_mean(&values, 2),
            vec![None, None, None, Some(3.5), Some(4.5)]
        );
    }

    #[test]
    fn average_score_rounds_and_handles_no_match() {
        let lex = lexicon();
        assert_eq!(
            average_score(&words(&["happy", "okay", "sad", "zebra"]), &lex, Metric::Valence),
            Some(5.17)
        );
        assert_eq!(average_score(&words(&["zebra"]), &lex, Metric::Valence), None);
        assert_eq!(average_score(&[], &lex, Metric::Arousal), None);
    }

    #[test]
    fn series_skips_partial_windows() {
        let lex = lexicon();
        let tokens = words(&["happy", "sad", "happy", "sad", "happy"]);
        let series = sliding_series(&tokens, &lex, Metric::Valence, 2, 2);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].average, Some(5.0));
        assert_eq!(series[1].progress, 100.0);
        assert_eq!(series[0].progress, 50.0);
        assert!(sliding_series(&tokens, &lex, Metric::Valence, 10, 1).is_empty());
    }
}
