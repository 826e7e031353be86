// src/config/settings.rs
use crate::action::ActionKind;
use crate::config::analysis::AnalysisConfig;
use crate::data_model::Project;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration read from `tweetlens.yaml`.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Directory holding one subdirectory per project.
    pub base_path: PathBuf,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub lexicons: LexiconsConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    pub projects: BTreeMap<String, ProjectConfig>,
    #[serde(default)]
    pub recipes: BTreeMap<String, RecipeConfig>,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "Settings: at least one project must be configured".to_string(),
            ));
        }
        for (key, project) in &self.projects {
            project.validate(key)?;
        }
        self.api.validate()?;
        self.analysis.validate()?;
        if let Some(vad) = &self.lexicons.vad {
            vad.validate("vad", 3)?;
        }
        if let Some(happiness) = &self.lexicons.happiness {
            happiness.validate("happiness", 1)?;
        }
        for (name, recipe) in &self.recipes {
            recipe.validate(name, self)?;
        }
        Ok(())
    }

    /// Looks up a configured project by key.
    pub fn project(&self, key: &str) -> Result<Project> {
        let config = self.projects.get(key).ok_or_else(|| {
            PipelineError::InvalidArgument(format!(
                "project '{}' is not configured (known: {})",
                key,
                self.projects.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(Project {
            key: key.to_string(),
            query: config.query.clone(),
            stopwords: config.stopwords.clone(),
        })
    }

    /// Makes every relative path in the settings relative to `dir`.
    pub(crate) fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        resolve(&mut self.base_path);
        if let Some(vad) = self.lexicons.vad.as_mut() {
            resolve(&mut vad.path);
        }
        if let Some(happiness) = self.lexicons.happiness.as_mut() {
            resolve(&mut happiness.path);
        }
        if let Some(vectors) = self.embeddings.vectors_path.as_mut() {
            resolve(vectors);
        }
        if let Some(wordlist) = self.cleaning.wordlist.as_mut() {
            resolve(wordlist);
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    pub bearer_token_env: String,
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://api.twitter.com/1.1".to_string(),
            bearer_token_env: "TWITTER_BEARER_TOKEN".to_string(),
            page_size: 200,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=200).contains(&self.page_size) {
            return Err(PipelineError::ConfigValidationError(format!(
                "ApiConfig: page_size must be between 1 and 200, got {}",
                self.page_size
            )));
        }
        if self.bearer_token_env.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "ApiConfig: bearer_token_env cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LemmatizerKind {
    #[default]
    Morphy,
    Porter,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CleaningConfig {
    pub lemmatizer: LemmatizerKind,
    /// Dictionary of base forms (one word per line, or a WordNet `index.noun`)
    /// that `morphy` checks suffix detachments against.
    pub wordlist: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LexiconsConfig {
    /// Valence/arousal/dominance norms used by the sentiment stage.
    pub vad: Option<LexiconSource>,
    /// Happiness scores used by the corpus-shift stage.
    pub happiness: Option<LexiconSource>,
}

/// Where and how to read a delimited word-score table.
#[derive(Deserialize, Debug, Clone)]
pub struct LexiconSource {
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Preamble lines before the header row.
    #[serde(default)]
    pub skip_lines: usize,
    pub word_column: String,
    pub score_columns: Vec<String>,
}

fn default_delimiter() -> char {
    ','
}

impl LexiconSource {
    pub fn validate(&self, name: &str, expected_columns: usize) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(PipelineError::ConfigValidationError(format!(
                "Lexicon '{}': delimiter must be a single ASCII character, got {:?}",
                name, self.delimiter
            )));
        }
        if self.score_columns.len() != expected_columns {
            return Err(PipelineError::ConfigValidationError(format!(
                "Lexicon '{}': expected {} score column(s), got {}",
                name,
                expected_columns,
                self.score_columns.len()
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Word vectors in word2vec/GloVe text format.
    pub vectors_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProjectConfig {
    /// Screen name of the followed timeline.
    pub query: String,
    #[serde(default)]
    pub stopwords: Vec<String>,
}

impl ProjectConfig {
    pub fn validate(&self, key: &str) -> Result<()> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(PipelineError::ConfigValidationError(format!(
                "Project key '{}' must be a plain directory name",
                key
            )));
        }
        if self.query.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(format!(
                "Project '{}': query cannot be empty",
                key
            )));
        }
        Ok(())
    }
}

/// A named, ordered list of actions with preset parameters.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeConfig {
    pub project: String,
    pub actions: Vec<ActionKind>,
    pub dates: Option<String>,
    pub threshold: Option<f64>,
    pub metric: Option<String>,
    pub project2: Option<String>,
}

impl RecipeConfig {
    pub fn validate(&self, name: &str, settings: &Settings) -> Result<()> {
        let invalid = |msg: String| PipelineError::ConfigValidationError(format!("Recipe '{}': {}", name, msg));
        if self.actions.is_empty() {
            return Err(invalid("actions cannot be empty".to_string()));
        }
        if !settings.projects.contains_key(&self.project) {
            return Err(invalid(format!("unknown project '{}'", self.project)));
        }
        if let Some(other) = &self.project2 {
            if !settings.projects.contains_key(other) {
                return Err(invalid(format!("unknown project2 '{}'", other)));
            }
        }
        self.resolve_actions().map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}
