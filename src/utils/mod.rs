// Utils

pub mod lemmatizer;
pub mod lexicon;
pub mod logging;
pub mod progress;
pub mod text;

pub use lemmatizer::{build_lemmatizer, Lemmatizer, MorphyLemmatizer, PorterLemmatizer};
pub use lexicon::Lexicon;
pub use progress::create_progress_bar;
pub use text::{split_into_words, ENGLISH_STOP_WORDS, ENGLISH_STOP_WORD_SET};
