// src/pipeline/analytics/tokenize.rs
use crate::utils::text::NON_WORD_RUN;
use crate::utils::{split_into_words, Lemmatizer, ENGLISH_STOP_WORD_SET};

/// Tokenizes a whole corpus read as one document: non-word runs become spaces,
/// text is lowercased and segmented, stopwords and single-character tokens
/// are dropped and the rest lemmatized.
pub fn tokenize_corpus<'a, I>(texts: I, lemmatizer: &dyn Lemmatizer) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ");
    let spaced = NON_WORD_RUN.replace_all(&joined, " ").to_lowercase();
    split_into_words(&spaced)
        .into_iter()
        .filter(|w| w.chars().count() > 1 && !ENGLISH_STOP_WORD_SET.contains(*w))
        .map(|w| lemmatizer.lemmatize(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MorphyLemmatizer;

    #[test]
    fn tokenizes_across_documents() {
        let lemmatizer = MorphyLemmatizer::with_dictionary(["cat", "mat"]);
        let tokens = tokenize_corpus(["The cats", "sat on-the mats, a b"], &lemmatizer);
        assert_eq!(tokens, vec!["cat", "sat", "mat"]);
    }

    #[test]
    fn empty_corpus_has_no_tokens() {
        assert!(tokenize_corpus(Vec::<&str>::new(), &MorphyLemmatizer::default()).is_empty());
    }
}
