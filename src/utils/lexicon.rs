// src/utils/lexicon.rs
use crate::config::LexiconSource;
use crate::error::{PipelineError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{debug, info, warn};

/// Word → scores table. Every entry has one score per configured score column.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    scores: HashMap<String, Vec<f64>>,
    columns: usize,
}

impl Lexicon {
    /// Reads a delimited lexicon file. Rows whose scores do not parse are skipped.
    pub fn load(source: &LexiconSource) -> Result<Self> {
        let path = &source.path;
        if !path.exists() {
            return Err(PipelineError::MissingInput { path: path.clone() });
        }
        let mut reader = BufReader::new(File::open(path)?);
        let mut preamble = String::new();
        for _ in 0..source.skip_lines {
            preamble.clear();
            reader.read_line(&mut preamble)?;
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(source.delimiter as u8)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let column_index = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PipelineError::MalformedRecord {
                    path: path.clone(),
                    reason: format!("lexicon has no '{}' column", name),
                })
        };
        let word_idx = column_index(&source.word_column)?;
        let score_idx = source
            .score_columns
            .iter()
            .map(|c| column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut scores = HashMap::new();
        let mut skipped = 0usize;
        for row in csv_reader.records() {
            let row = row?;
            let Some(word) = row.get(word_idx).map(|w| w.trim().to_lowercase()) else {
                skipped += 1;
                continue;
            };
            let parsed: Option<Vec<f64>> = score_idx
                .iter()
                .map(|&i| row.get(i).and_then(|v| v.trim().parse::<f64>().ok()))
                .collect();
            match parsed {
                Some(values) if !word.is_empty() => {
                    scores.entry(word).or_insert(values);
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "Skipped lexicon rows without usable scores");
        }
        info!(path = %path.display(), entries = scores.len(), "Loaded lexicon");
        debug!(columns = ?source.score_columns, "Lexicon score columns");
        Ok(Lexicon {
            scores,
            columns: source.score_columns.len(),
        })
    }

    /// Builds a lexicon from in-memory entries.
    pub fn from_entries<I, S>(columns: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let scores = entries
            .into_iter()
            .map(|(w, v)| (w.into(), v))
            .filter(|(_, v): &(String, Vec<f64>)| v.len() == columns)
            .collect();
        Lexicon { scores, columns }
    }

    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.scores.get(word).map(|v| v.as_slice())
    }

    /// Score of `word` in the given column.
    pub fn score(&self, word: &str, column: usize) -> Option<f64> {
        self.get(word).and_then(|v| v.get(column).copied())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
