// src/data_model.rs
use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed header of a CSV artifact. Readers reject files whose header differs.
pub trait Schema {
    const COLUMNS: &'static [&'static str];
}

/// A post as returned by the timeline source. Never mutated after collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub favorite_count: u64,
    pub retweet_count: u64,
    /// UTC, `YYYY-MM-DD HH:MM:SS+00:00`.
    pub created_at: String,
    pub source: String,
    pub in_reply_to_id: Option<String>,
    pub in_reply_to_user: Option<String>,
}

impl Schema for Post {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "text",
        "favorite_count",
        "retweet_count",
        "created_at",
        "source",
        "in_reply_to_id",
        "in_reply_to_user",
    ];
}

impl Post {
    /// Numeric value of the id, used for cursors and paging bounds.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

/// Output of the cleanser for one post.
///
/// `lemmas.len() == stopwords_removed.len() <= words.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub id: String,
    pub created_at: String,
    pub text: String,
    #[serde(with = "list_column")]
    pub words: Vec<String>,
    #[serde(with = "list_column")]
    pub stopwords_removed: Vec<String>,
    #[serde(with = "list_column")]
    pub lemmas: Vec<String>,
}

impl Schema for CleanedRecord {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "created_at",
        "text",
        "words",
        "stopwords_removed",
        "lemmas",
    ];
}

/// List-valued CSV cells are stored as JSON arrays of strings.
pub mod list_column {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = serde_json::to_string(items).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        serde_json::from_str(&raw)
            .map_err(|e| D::Error::custom(format!("invalid list cell {:?}: {}", raw, e)))
    }
}

/// A configured project: its directory key, the timeline it follows and its extra stopwords.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub key: String,
    pub query: String,
    pub stopwords: Vec<String>,
}

static SELECTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}(-(0[1-9]|1[0-2]))?$").expect("valid selection regex"));

/// A `YYYY` or `YYYY-MM` prefix restricting analytics to matching records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisSelection(String);

impl AnalysisSelection {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if !SELECTION_PATTERN.is_match(value) {
            return Err(PipelineError::InvalidArgument(format!(
                "date selection '{}' must be YYYY or YYYY-MM",
                value
            )));
        }
        Ok(AnalysisSelection(value.to_string()))
    }

    pub fn matches(&self, created_at: &str) -> bool {
        created_at.starts_with(&self.0)
    }

    /// Used in analytics artifact names.
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl FromStr for AnalysisSelection {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        AnalysisSelection::parse(s)
    }
}

impl fmt::Display for AnalysisSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Affective dimension of the VAD lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Valence,
    Arousal,
    Dominance,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Valence, Metric::Arousal, Metric::Dominance];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Valence => "valence",
            Metric::Arousal => "arousal",
            Metric::Dominance => "dominance",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Metric::Valence => 0,
            Metric::Arousal => 1,
            Metric::Dominance => 2,
        }
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    // Accepts the full name or any abbreviation, keyed on the first letter.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('v') => Ok(Metric::Valence),
            Some('a') => Ok(Metric::Arousal),
            Some('d') => Ok(Metric::Dominance),
            _ => Err(PipelineError::InvalidArgument(format!(
                "metric '{}' must be one of valence, arousal, dominance",
                s
            ))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_accepts_year_and_month() {
        assert!(AnalysisSelection::parse("2020").is_ok());
        assert!(AnalysisSelection::parse("2020-03").is_ok());
        assert!(AnalysisSelection::parse("2020-13").is_err());
        assert!(AnalysisSelection::parse("20").is_err());
        assert!(AnalysisSelection::parse("2020-3").is_err());
    }

    #[test]
    fn month_selection_refines_year_selection() {
        let year = AnalysisSelection::parse("2020").unwrap();
        let month = AnalysisSelection::parse("2020-03").unwrap();
        let dates = [
            "2020-03-01 10:00:00+00:00",
            "2020-04-01 10:00:00+00:00",
            "2019-03-01 10:00:00+00:00",
        ];
        for date in dates {
            if month.matches(date) {
                assert!(year.matches(date));
            }
        }
        assert!(month.matches(dates[0]));
        assert!(!month.matches(dates[1]));
        assert!(!year.matches(dates[2]));
    }

    #[test]
    fn metric_parses_by_first_letter() {
        assert_eq!("valence".parse::<Metric>().unwrap(), Metric::Valence);
        assert_eq!("Arousal".parse::<Metric>().unwrap(), Metric::Arousal);
        assert_eq!("d".parse::<Metric>().unwrap(), Metric::Dominance);
        assert!("happiness".parse::<Metric>().is_err());
    }
}
