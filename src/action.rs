// src/action.rs
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::info;

use crate::config::{LexiconSource, RecipeConfig, Settings};
use crate::data_model::{AnalysisSelection, CleanedRecord, Metric};
use crate::error::{PipelineError, Result};
use crate::executor::{PipelineExecutor, Stage, StageContext, StageReport};
use crate::pipeline::analytics::{self, embeddings, sentiment, shift, tfidf, wordcount};
use crate::pipeline::analytics::tokenize::tokenize_corpus;
use crate::pipeline::cleanser::{clean_project, TextCleaner};
use crate::pipeline::collector::{self, CollectionOutcome, TimelineSource};
use crate::pipeline::dedup::deduplicate_project;
use crate::utils::{build_lemmatizer, Lexicon};

/// Action names as they appear on the command line and in recipes.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Init,
    Scrape,
    Clean,
    Dedup,
    Wordcount,
    Tfidf,
    Sentiment,
    Compare,
    Embeds,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Init,
        ActionKind::Scrape,
        ActionKind::Clean,
        ActionKind::Dedup,
        ActionKind::Wordcount,
        ActionKind::Tfidf,
        ActionKind::Sentiment,
        ActionKind::Compare,
        ActionKind::Embeds,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Init => "init",
            ActionKind::Scrape => "scrape",
            ActionKind::Clean => "clean",
            ActionKind::Dedup => "dedup",
            ActionKind::Wordcount => "wordcount",
            ActionKind::Tfidf => "tfidf",
            ActionKind::Sentiment => "sentiment",
            ActionKind::Compare => "compare",
            ActionKind::Embeds => "embeds",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::Init => "Initialise new project and download posts",
            ActionKind::Scrape => "Collect new posts",
            ActionKind::Clean => "Preprocess collected posts",
            ActionKind::Dedup => "Deduplicate the cleaned corpus",
            ActionKind::Wordcount => "Wordcount analysis",
            ActionKind::Tfidf => "TF-IDF analysis",
            ActionKind::Sentiment => "Sentiment analysis",
            ActionKind::Compare => "Compare the corpora of two projects",
            ActionKind::Embeds => "Word embedding analysis",
        }
    }

    /// Analytics actions operate on a date selection.
    pub fn needs_selection(&self) -> bool {
        matches!(
            self,
            ActionKind::Wordcount
                | ActionKind::Tfidf
                | ActionKind::Sentiment
                | ActionKind::Compare
                | ActionKind::Embeds
        )
    }
}

impl FromStr for ActionKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s.trim())
            .ok_or_else(|| PipelineError::InvalidArgument(format!("unknown action '{}'", s)))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loose parameters as collected from a recipe, the command line or a prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionParams {
    pub dates: Option<String>,
    pub metric: Option<String>,
    pub threshold: Option<f64>,
    pub other_project: Option<String>,
}

/// A fully parameterised action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Init,
    Scrape,
    Clean,
    Dedup,
    Wordcount {
        selection: AnalysisSelection,
    },
    Tfidf {
        selection: AnalysisSelection,
    },
    Sentiment {
        selection: AnalysisSelection,
        metric: Metric,
    },
    Compare {
        selection: AnalysisSelection,
        other_project: String,
    },
    Embeds {
        selection: AnalysisSelection,
        threshold: f64,
    },
}

fn required<T: Clone>(value: &Option<T>, kind: ActionKind, what: &str) -> Result<T> {
    value.clone().ok_or_else(|| {
        PipelineError::InvalidArgument(format!("action '{}' requires {}", kind, what))
    })
}

impl Action {
    pub fn from_kind(kind: ActionKind, params: &ActionParams) -> Result<Action> {
        let selection = || -> Result<AnalysisSelection> {
            AnalysisSelection::parse(&required(&params.dates, kind, "dates (YYYY or YYYY-MM)")?)
        };
        Ok(match kind {
            ActionKind::Init => Action::Init,
            ActionKind::Scrape => Action::Scrape,
            ActionKind::Clean => Action::Clean,
            ActionKind::Dedup => Action::Dedup,
            ActionKind::Wordcount => Action::Wordcount {
                selection: selection()?,
            },
            ActionKind::Tfidf => Action::Tfidf {
                selection: selection()?,
            },
            ActionKind::Sentiment => Action::Sentiment {
                selection: selection()?,
                metric: required(&params.metric, kind, "a metric")?.parse()?,
            },
            ActionKind::Compare => Action::Compare {
                selection: selection()?,
                other_project: required(&params.other_project, kind, "a second project")?,
            },
            ActionKind::Embeds => {
                let threshold = required(&params.threshold, kind, "a threshold")?;
                if !threshold.is_finite() {
                    return Err(PipelineError::InvalidArgument(format!(
                        "threshold must be a finite number, got {}",
                        threshold
                    )));
                }
                Action::Embeds {
                    selection: selection()?,
                    threshold,
                }
            }
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Init => ActionKind::Init,
            Action::Scrape => ActionKind::Scrape,
            Action::Clean => ActionKind::Clean,
            Action::Dedup => ActionKind::Dedup,
            Action::Wordcount { .. } => ActionKind::Wordcount,
            Action::Tfidf { .. } => ActionKind::Tfidf,
            Action::Sentiment { .. } => ActionKind::Sentiment,
            Action::Compare { .. } => ActionKind::Compare,
            Action::Embeds { .. } => ActionKind::Embeds,
        }
    }
}

impl RecipeConfig {
    pub fn params(&self) -> ActionParams {
        ActionParams {
            dates: self.dates.clone(),
            metric: self.metric.clone(),
            threshold: self.threshold,
            other_project: self.project2.clone(),
        }
    }

    /// Binds every listed action to the recipe's preset parameters.
    pub fn resolve_actions(&self) -> Result<Vec<Action>> {
        let params = self.params();
        self.actions
            .iter()
            .map(|kind| Action::from_kind(*kind, &params))
            .collect()
    }
}

/// Ordered actions against one project.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub project: String,
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn single(project: impl Into<String>, action: Action) -> Self {
        Plan {
            project: project.into(),
            actions: vec![action],
        }
    }

    pub fn from_recipe(settings: &Settings, name: &str) -> Result<Self> {
        let recipe = settings.recipes.get(name).ok_or_else(|| {
            PipelineError::InvalidArgument(format!(
                "recipe '{}' is not configured (known: {})",
                name,
                settings.recipes.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(Plan {
            project: recipe.project.clone(),
            actions: recipe.resolve_actions()?,
        })
    }

    pub fn execute(self, settings: &Settings, timeline: &dyn TimelineSource) -> Result<Vec<StageReport>> {
        let project = settings.project(&self.project)?;
        let stages: Vec<Box<dyn Stage>> = self
            .actions
            .into_iter()
            .map(|a| Box::new(a) as Box<dyn Stage>)
            .collect();
        let ctx = StageContext::new(settings, project, timeline);
        PipelineExecutor::new(stages).run(&ctx)
    }
}

fn load_lexicon(source: Option<&LexiconSource>, name: &str) -> Result<Lexicon> {
    let source = source.ok_or_else(|| {
        PipelineError::ConfigError(format!("lexicons.{} is not configured", name))
    })?;
    Lexicon::load(source)
}

fn collection_report(action: &'static str, outcome: CollectionOutcome) -> StageReport {
    StageReport {
        action,
        records_in: None,
        records_out: Some(outcome.posts),
        artifacts: outcome.batch.into_iter().collect(),
    }
}

impl Stage for Action {
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageReport> {
        let settings = ctx.settings;
        let layout = ctx.layout();
        let analysis = &settings.analysis;
        let page_size = settings.api.page_size;
        let query = ctx.project.query.as_str();

        let analytics_report = |records: usize, artifacts: Vec<std::path::PathBuf>| StageReport {
            action: self.name(),
            records_in: Some(records),
            records_out: None,
            artifacts,
        };

        match self {
            Action::Init => {
                let outcome = collector::initialise(&layout, ctx.timeline, query, page_size)?;
                Ok(collection_report(self.name(), outcome))
            }
            Action::Scrape => {
                let outcome = collector::collect(&layout, ctx.timeline, query, page_size)?;
                Ok(collection_report(self.name(), outcome))
            }
            Action::Clean => {
                let cleaner =
                    TextCleaner::for_project(&ctx.project, build_lemmatizer(&settings.cleaning)?);
                let outcome = clean_project(&layout, &cleaner)?;
                Ok(StageReport {
                    action: self.name(),
                    records_in: Some(outcome.batches),
                    records_out: Some(outcome.records),
                    artifacts: outcome.artifacts,
                })
            }
            Action::Dedup => {
                let outcome = deduplicate_project(&layout)?;
                Ok(StageReport {
                    action: self.name(),
                    records_in: Some(outcome.records_in),
                    records_out: Some(outcome.records_out),
                    artifacts: vec![outcome.artifact],
                })
            }
            Action::Wordcount { selection } => {
                let records = analytics::load_corpus(&layout, selection)?;
                let artifacts =
                    wordcount::run_wordcount(&layout, &records, selection, &analysis.wordcount)?;
                Ok(analytics_report(records.len(), artifacts))
            }
            Action::Tfidf { selection } => {
                let records = analytics::load_corpus(&layout, selection)?;
                let artifacts = tfidf::run_tfidf(&layout, &records, selection, &analysis.tfidf)?;
                Ok(analytics_report(records.len(), artifacts))
            }
            Action::Sentiment { selection, metric } => {
                let lexicon = load_lexicon(settings.lexicons.vad.as_ref(), "vad")?;
                let lemmatizer = build_lemmatizer(&settings.cleaning)?;
                let records = analytics::load_corpus(&layout, selection)?;
                let artifacts = sentiment::run_sentiment(
                    &layout,
                    &records,
                    selection,
                    *metric,
                    &analysis.sentiment,
                    &lexicon,
                    lemmatizer.as_ref(),
                )?;
                Ok(analytics_report(records.len(), artifacts))
            }
            Action::Compare {
                selection,
                other_project,
            } => {
                let other = settings.project(other_project)?;
                let other_layout = ctx.layout_for(&other.key);
                let lexicon = load_lexicon(settings.lexicons.happiness.as_ref(), "happiness")?;
                let lemmatizer = build_lemmatizer(&settings.cleaning)?;
                let chronological = analysis.shift.chronological;

                let reference = analytics::load_corpus(&layout, selection)?;
                let comparison = analytics::load_corpus(&other_layout, selection)?;
                let tokens = |records: &[CleanedRecord]| {
                    tokenize_corpus(
                        analytics::oldest_first(records, chronological)
                            .into_iter()
                            .map(|r| r.text.as_str()),
                        lemmatizer.as_ref(),
                    )
                };
                let ref_tokens = tokens(&reference);
                let cmp_tokens = tokens(&comparison);
                info!(
                    reference = ref_tokens.len(),
                    comparison = cmp_tokens.len(),
                    "Tokenized corpora for comparison"
                );
                let artifacts = shift::run_compare(
                    (ctx.project.key.as_str(), &layout, ref_tokens.as_slice()),
                    (other.key.as_str(), &other_layout, cmp_tokens.as_slice()),
                    selection,
                    &analysis.shift,
                    &lexicon,
                )?;
                Ok(analytics_report(reference.len() + comparison.len(), artifacts))
            }
            Action::Embeds {
                selection,
                threshold,
            } => {
                let records = analytics::load_corpus(&layout, selection)?;
                let artifacts = embeddings::run_embeds(
                    &layout,
                    &records,
                    selection,
                    *threshold,
                    &analysis.embeds,
                    settings.embeddings.vectors_path.as_deref(),
                )?;
                Ok(analytics_report(records.len(), artifacts))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(dates: Option<&str>, metric: Option<&str>, threshold: Option<f64>) -> ActionParams {
        ActionParams {
            dates: dates.map(str::to_string),
            metric: metric.map(str::to_string),
            threshold,
            other_project: None,
        }
    }

    #[test]
    fn action_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.name().parse::<ActionKind>().unwrap(), kind);
        }
        assert!("plot".parse::<ActionKind>().is_err());
    }

    #[test]
    fn analytics_actions_require_dates() {
        let err = Action::from_kind(ActionKind::Wordcount, &ActionParams::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
        assert_eq!(
            Action::from_kind(ActionKind::Clean, &ActionParams::default()).unwrap(),
            Action::Clean
        );
    }

    #[test]
    fn sentiment_and_embeds_bind_their_parameters() {
        let action =
            Action::from_kind(ActionKind::Sentiment, &params(Some("2021-04"), Some("dominance"), None))
                .unwrap();
        assert_eq!(
            action,
            Action::Sentiment {
                selection: AnalysisSelection::parse("2021-04").unwrap(),
                metric: Metric::Dominance,
            }
        );
        assert!(Action::from_kind(ActionKind::Embeds, &params(Some("2021"), None, None)).is_err());
        let embeds = Action::from_kind(ActionKind::Embeds, &params(Some("2021"), None, Some(0.4)));
        assert_eq!(embeds.unwrap().name(), "embeds");
    }

    #[test]
    fn recipe_resolves_in_order() {
        let recipe = RecipeConfig {
            project: "sample_project".to_string(),
            actions: vec![ActionKind::Scrape, ActionKind::Clean, ActionKind::Wordcount],
            dates: Some("2021-04".to_string()),
            threshold: None,
            metric: None,
            project2: None,
        };
        let actions = recipe.resolve_actions().unwrap();
        let kinds: Vec<ActionKind> = actions.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Scrape, ActionKind::Clean, ActionKind::Wordcount]
        );
    }
}
