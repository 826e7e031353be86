// src/config/analysis.rs
use crate::error::{PipelineError, Result};
use serde::Deserialize;

/// Parameters of the analytics stages. Every section is optional in YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub wordcount: WordcountParams,
    pub tfidf: TfidfParams,
    pub sentiment: SentimentParams,
    pub embeds: EmbedsParams,
    pub shift: ShiftParams,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.wordcount.validate()?;
        self.tfidf.validate()?;
        self.sentiment.validate()?;
        self.embeds.validate()?;
        self.shift.validate()?;
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WordcountParams {
    /// Number of terms kept in the word-cloud table.
    pub cloud_terms: usize,
}

impl Default for WordcountParams {
    fn default() -> Self {
        WordcountParams { cloud_terms: 30 }
    }
}

impl WordcountParams {
    pub fn validate(&self) -> Result<()> {
        if self.cloud_terms == 0 {
            return Err(PipelineError::ConfigValidationError(
                "WordcountParams: cloud_terms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TfidfParams {
    pub max_features: usize,
    /// Absolute minimum document frequency.
    pub min_df: usize,
    /// Maximum document frequency as a proportion of documents.
    pub max_df: f64,
}

impl Default for TfidfParams {
    fn default() -> Self {
        TfidfParams {
            max_features: 2000,
            min_df: 5,
            max_df: 0.7,
        }
    }
}

impl TfidfParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(PipelineError::ConfigValidationError(
                "TfidfParams: max_features must be greater than 0".to_string(),
            ));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(PipelineError::ConfigValidationError(format!(
                "TfidfParams: max_df must be in (0.0, 1.0], got {}",
                self.max_df
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SentimentParams {
    pub rolling_windows: Vec<usize>,
    pub series_width: usize,
    pub series_step: usize,
    pub sensitivity_steps: Vec<usize>,
    pub sensitivity_widths: Vec<usize>,
    /// Sort records by `created_at` before windowed analyses. When false the
    /// rolling means follow file order and the series reads the corpus in
    /// reverse file order.
    pub chronological: bool,
}

impl Default for SentimentParams {
    fn default() -> Self {
        SentimentParams {
            rolling_windows: vec![3, 5, 10],
            series_width: 500,
            series_step: 100,
            sensitivity_steps: vec![10, 100, 1000],
            sensitivity_widths: vec![500, 1000, 2000, 5000],
            chronological: true,
        }
    }
}

impl SentimentParams {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("rolling_windows", &self.rolling_windows),
            ("sensitivity_steps", &self.sensitivity_steps),
            ("sensitivity_widths", &self.sensitivity_widths),
        ];
        for (name, values) in sizes.iter() {
            if let Some(idx) = values.iter().position(|v| *v == 0) {
                return Err(PipelineError::ConfigValidationError(format!(
                    "SentimentParams: {} at index {} must be greater than 0",
                    name, idx
                )));
            }
        }
        if self.series_width == 0 || self.series_step == 0 {
            return Err(PipelineError::ConfigValidationError(
                "SentimentParams: series_width and series_step must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EmbedsParams {
    /// Rows kept in the most/least similar extracts.
    pub extract_size: usize,
}

impl Default for EmbedsParams {
    fn default() -> Self {
        EmbedsParams { extract_size: 25 }
    }
}

impl EmbedsParams {
    pub fn validate(&self) -> Result<()> {
        if self.extract_size == 0 {
            return Err(PipelineError::ConfigValidationError(
                "EmbedsParams: extract_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ShiftParams {
    pub top_n: usize,
    /// Score subtracted from each type's happiness in the sentiment shift.
    pub reference_value: f64,
    /// Scores inside this closed interval are excluded from the sentiment shift.
    pub stop_lens: (f64, f64),
    /// Concatenate each corpus by `created_at` rather than reversed file order.
    pub chronological: bool,
}

impl Default for ShiftParams {
    fn default() -> Self {
        ShiftParams {
            top_n: 50,
            reference_value: 5.0,
            stop_lens: (4.0, 6.0),
            chronological: true,
        }
    }
}

impl ShiftParams {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(PipelineError::ConfigValidationError(
                "ShiftParams: top_n must be greater than 0".to_string(),
            ));
        }
        let (low, high) = self.stop_lens;
        if low > high {
            return Err(PipelineError::ConfigValidationError(format!(
                "ShiftParams: stop_lens lower bound ({}) cannot be greater than upper bound ({})",
                low, high
            )));
        }
        Ok(())
    }
}
