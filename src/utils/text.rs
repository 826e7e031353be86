// src/utils/text.rs
use icu::segmenter::WordSegmenter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

// English stopwords (NLTK list)
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

pub static ENGLISH_STOP_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// URLs and every character that is neither ASCII alphanumeric nor whitespace.
pub static URL_OR_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+://\S+|[^0-9A-Za-z\s]").expect("valid regex"));

pub static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

pub static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid regex"));

/// Same token pattern as scikit-learn's default: two or more word characters.
pub static TFIDF_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into word-like segments with the ICU word segmenter.
/// Whitespace and punctuation segments are dropped.
pub fn split_into_words(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let segmenter = WordSegmenter::new_auto();
    let mut breaks = segmenter.segment_str(text);
    let mut words = Vec::new();
    let mut prev_break = 0;
    while let Some(current_break) = breaks.next() {
        if current_break > prev_break && breaks.is_word_like() {
            words.push(&text[prev_break..current_break]);
        }
        prev_break = current_break;
    }
    words
}
