// src/pipeline/cleanser.rs
use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{info, info_span, warn};

use crate::data_model::{CleanedRecord, Post, Project};
use crate::error::Result;
use crate::pipeline::readers::{BaseReader, CsvReader};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::{BaseWriter, CsvWriter};
use crate::utils::text::{collapse_whitespace, DIGIT_RUN, URL_OR_SYMBOL};
use crate::utils::{create_progress_bar, Lemmatizer, ENGLISH_STOP_WORDS};

/// Removes URLs and symbols, collapses whitespace, drops digit runs and lowercases.
pub fn normalize_text(text: &str) -> String {
    let stripped = URL_OR_SYMBOL.replace_all(text, "");
    let collapsed = collapse_whitespace(&stripped);
    DIGIT_RUN.replace_all(&collapsed, "").to_lowercase()
}

/// Turns posts into cleaned records. Pure with respect to its stopwords and lemmatizer.
pub struct TextCleaner {
    stopwords: HashSet<String>,
    lemmatizer: Box<dyn Lemmatizer>,
}

impl TextCleaner {
    /// English stopwords plus `extra` (the project's own).
    pub fn new(extra: &[String], lemmatizer: Box<dyn Lemmatizer>) -> Self {
        let stopwords = ENGLISH_STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(extra.iter().map(|w| w.to_lowercase()))
            .collect();
        TextCleaner {
            stopwords,
            lemmatizer,
        }
    }

    pub fn for_project(project: &Project, lemmatizer: Box<dyn Lemmatizer>) -> Self {
        Self::new(&project.stopwords, lemmatizer)
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn clean(&self, post: &Post) -> CleanedRecord {
        let text = normalize_text(&post.text);
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let stopwords_removed: Vec<String> = words
            .iter()
            .filter(|w| !self.is_stopword(w))
            .cloned()
            .collect();
        let lemmas = stopwords_removed
            .iter()
            .map(|w| self.lemmatizer.lemmatize(w))
            .collect();
        CleanedRecord {
            id: post.id.clone(),
            created_at: post.created_at.clone(),
            text,
            words,
            stopwords_removed,
            lemmas,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningOutcome {
    pub batches: usize,
    pub records: usize,
    pub artifacts: Vec<PathBuf>,
}

/// Cleans every raw batch into `cleaned/` and rewrites the merged corpus.
pub fn clean_project(layout: &ProjectLayout, cleaner: &TextCleaner) -> Result<CleaningOutcome> {
    let span = info_span!("clean_project", root = %layout.root().display());
    let _enter = span.enter();

    layout.ensure()?;
    let batches = layout.raw_batches()?;
    if batches.is_empty() {
        warn!("No raw batches to clean");
    }

    let mut merged = CsvWriter::for_schema::<CleanedRecord, _>(layout.merged_path())?;
    let mut artifacts = Vec::with_capacity(batches.len() + 1);
    let mut total = 0usize;
    let pb = create_progress_bar(batches.len() as u64, "Cleaning raw batches");

    for raw_path in &batches {
        let posts = CsvReader::<Post>::new(raw_path).read_all()?;
        let cleaned: Vec<CleanedRecord> = posts.iter().map(|p| cleaner.clean(p)).collect();

        let mut writer = CsvWriter::for_schema::<CleanedRecord, _>(layout.cleaned_path_for(raw_path))?;
        writer.write_batch(&cleaned)?;
        artifacts.push(writer.close()?);
        merged.write_batch(&cleaned)?;

        total += cleaned.len();
        pb.inc(1);
    }
    pb.finish_and_clear();

    artifacts.push(merged.close()?);
    info!(batches = batches.len(), records = total, "Cleaning finished");
    Ok(CleaningOutcome {
        batches: batches.len(),
        records: total,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MorphyLemmatizer;

    fn post(id: &str, text: &str) -> Post {
        Post {
            id: id.to_string(),
            text: text.to_string(),
            favorite_count: 0,
            retweet_count: 0,
            created_at: "2020-03-01 10:00:00+00:00".to_string(),
            source: "web".to_string(),
            in_reply_to_id: None,
            in_reply_to_user: None,
        }
    }

    #[test]
    fn normalize_strips_links_symbols_and_digits() {
        assert_eq!(
            normalize_text("Check this out! http://x.co #cool"),
            "check this out cool"
        );
        assert_eq!(normalize_text("COVID19 cases: 1,024"), "covid cases ");
        assert_eq!(normalize_text("!!!"), "");
    }

    fn lemmatizer() -> Box<MorphyLemmatizer> {
        Box::new(MorphyLemmatizer::with_dictionary(["check", "cool", "dog", "cat"]))
    }

    #[test]
    fn clean_removes_nltk_stopwords_without_project_stopwords() {
        let cleaner = TextCleaner::new(&[], lemmatizer());
        let record = cleaner.clean(&post("1", "Check this out! http://x.co #cool"));
        assert_eq!(record.text, "check this out cool");
        assert_eq!(record.words, vec!["check", "this", "out", "cool"]);
        assert_eq!(record.stopwords_removed, vec!["check", "cool"]);
        assert_eq!(record.lemmas, vec!["check", "cool"]);
    }

    #[test]
    fn clean_keeps_length_invariant() {
        let cleaner = TextCleaner::new(&["cool".to_string()], lemmatizer());
        let record = cleaner.clean(&post("1", "Check this out! http://x.co #cool"));
        assert_eq!(record.words, vec!["check", "this", "out", "cool"]);
        assert_eq!(record.stopwords_removed, vec!["check"]);
        assert_eq!(record.lemmas.len(), record.stopwords_removed.len());
        assert!(record.lemmas.len() <= record.words.len());
    }

    #[test]
    fn clean_is_deterministic() {
        let cleaner = TextCleaner::new(&[], lemmatizer());
        let p = post("7", "Dogs and cats, 24/7!");
        assert_eq!(cleaner.clean(&p), cleaner.clean(&p));
        assert_eq!(cleaner.clean(&p).lemmas, vec!["dog", "cat"]);
    }

    #[test]
    fn empty_text_yields_empty_lists() {
        let cleaner = TextCleaner::new(&[], lemmatizer());
        let record = cleaner.clean(&post("2", "https://t.co/xyz 😀"));
        assert!(record.words.is_empty());
        assert!(record.lemmas.is_empty());
    }
}
