// src/config.rs
pub mod analysis;
pub mod settings;

use crate::error::{PipelineError, Result};
use std::fs;
use std::path::Path;

pub use analysis::{
    AnalysisConfig, EmbedsParams, SentimentParams, ShiftParams, TfidfParams, WordcountParams,
};
pub use settings::{
    ApiConfig, CleaningConfig, EmbeddingsConfig, LemmatizerKind, LexiconSource, LexiconsConfig,
    ProjectConfig, RecipeConfig, Settings,
};

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "tweetlens.yaml";

/// Loads, path-resolves and validates the settings file.
///
/// Relative paths inside the file are taken relative to the file's directory.
pub fn load_settings<P: AsRef<Path>>(config_path: P) -> Result<Settings> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read settings file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let mut settings: Settings = serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse settings YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    if let Some(dir) = path_ref.parent() {
        settings.resolve_paths(dir);
    }
    settings.validate()?;
    Ok(settings)
}
