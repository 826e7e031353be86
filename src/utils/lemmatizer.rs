// src/utils/lemmatizer.rs
use crate::config::{CleaningConfig, LemmatizerKind};
use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Maps a surface token to its base form.
pub trait Lemmatizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn lemmatize(&self, word: &str) -> String;
}

/// Builds the lemmatizer selected in the cleaning configuration.
pub fn build_lemmatizer(config: &CleaningConfig) -> Result<Box<dyn Lemmatizer>> {
    match config.lemmatizer {
        LemmatizerKind::Morphy => match &config.wordlist {
            Some(path) => Ok(Box::new(MorphyLemmatizer::load(path)?)),
            None => {
                warn!("cleaning.wordlist is not set; morphy only applies its exception table");
                Ok(Box::new(MorphyLemmatizer::default()))
            }
        },
        LemmatizerKind::Porter => Ok(Box::new(PorterLemmatizer)),
    }
}

static IRREGULAR_NOUNS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("lice", "louse"),
        ("oxen", "ox"),
        ("data", "datum"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("analyses", "analysis"),
        ("crises", "crisis"),
        ("theses", "thesis"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("wolves", "wolf"),
        ("halves", "half"),
        ("selves", "self"),
        ("shelves", "shelf"),
        ("thieves", "thief"),
        ("loaves", "loaf"),
        ("calves", "calf"),
        ("elves", "elf"),
        ("quizzes", "quiz"),
        ("movies", "movie"),
        ("cookies", "cookie"),
        ("zombies", "zombie"),
        ("rookies", "rookie"),
        ("selfies", "selfie"),
        ("calories", "calorie"),
        ("brownies", "brownie"),
    ]
    .into_iter()
    .collect()
});

static INVARIANT_NOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "news", "series", "species", "means", "physics", "economics", "politics", "mathematics",
        "people",
    ]
    .into_iter()
    .collect()
});

// WordNet noun detachments, tried in this order.
const NOUN_SUFFIX_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// WordNet-style noun morphology: an exception table, then suffix
/// detachments that are only accepted when the result is a dictionary word.
/// The shortest accepted form wins; with no accepted form the word is kept.
#[derive(Debug, Clone, Default)]
pub struct MorphyLemmatizer {
    dictionary: HashSet<String>,
}

impl MorphyLemmatizer {
    pub fn with_dictionary<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        MorphyLemmatizer {
            dictionary: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Reads a word list: the first field of every line, so plain lists and
    /// WordNet `index.*` files both work. Lines starting with whitespace
    /// (the WordNet license preamble) are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let mut words = Vec::new();
        for line in BufReader::new(File::open(path)?).lines() {
            let line = line?;
            if line.starts_with(char::is_whitespace) {
                continue;
            }
            if let Some(word) = line.split_whitespace().next() {
                words.push(word.to_string());
            }
        }
        let lemmatizer = Self::with_dictionary(words);
        info!(path = %path.display(), words = lemmatizer.dictionary.len(), "Loaded lemma dictionary");
        Ok(lemmatizer)
    }

    pub fn dictionary_len(&self) -> usize {
        self.dictionary.len()
    }

    fn is_known(&self, word: &str) -> bool {
        self.dictionary.contains(word)
    }
}

impl Lemmatizer for MorphyLemmatizer {
    fn name(&self) -> &'static str {
        "morphy"
    }

    fn lemmatize(&self, word: &str) -> String {
        if let Some(base) = IRREGULAR_NOUNS.get(word) {
            return (*base).to_string();
        }
        if word.len() <= 3 || INVARIANT_NOUNS.contains(word) {
            return word.to_string();
        }
        let detached = NOUN_SUFFIX_RULES.iter().filter_map(|(suffix, replacement)| {
            word.strip_suffix(suffix)
                .map(|stem| format!("{}{}", stem, replacement))
        });
        std::iter::once(word.to_string())
            .chain(detached)
            .filter(|candidate| !candidate.is_empty() && self.is_known(candidate))
            .min_by_key(|candidate| candidate.len())
            .unwrap_or_else(|| word.to_string())
    }
}

/// Porter stemmer from `rnltk`. Words the stemmer rejects are kept as-is.
pub struct PorterLemmatizer;

impl Lemmatizer for PorterLemmatizer {
    fn name(&self) -> &'static str {
        "porter"
    }

    fn lemmatize(&self, word: &str) -> String {
        rnltk::stem::get(word).unwrap_or_else(|_| word.to_string())
    }
}
