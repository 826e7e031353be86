// src/bin/tweetlens.rs

//! # TweetLens command line
//!
//! Runs one action against a configured project, a named recipe, or an
//! interactive prompt session. Every action reads the artifacts of the
//! previous stage from the project directory and writes its own:
//!
//! `init`/`scrape` → `raw/`, `clean` → `cleaned/` + `analysis/merged.csv`,
//! `dedup` → `analysis/deduplicated.csv`, analytics → `analysis/*_<dates>.*`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use TweetLens::action::{Action, ActionKind, ActionParams, Plan};
use TweetLens::config::{load_settings, DEFAULT_CONFIG_PATH};
use TweetLens::executor::StageReport;
use TweetLens::interactive::run_interactive;
use TweetLens::pipeline::collector::TwitterTimelineClient;
use TweetLens::utils::logging::{init_tracing, LogFormat};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Also write JSON logs to a daily-rolling file in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialise a project and download its timeline
    Init { project: String },
    /// Collect posts newer than the last stored batch
    Scrape { project: String },
    /// Clean every raw batch and rebuild the merged corpus
    Clean { project: String },
    /// Deduplicate the merged corpus
    Dedup { project: String },
    /// Lemma frequencies for a YYYY or YYYY-MM selection
    Wordcount { project: String, dates: String },
    /// TF-IDF matrix for a selection
    Tfidf { project: String, dates: String },
    /// Lexicon sentiment and a time series of one metric
    Sentiment {
        project: String,
        dates: String,
        /// valence, arousal or dominance
        metric: String,
    },
    /// Word-shift comparison against a second project
    Compare {
        project: String,
        dates: String,
        project2: String,
    },
    /// Embedding similarities and a network graph above a threshold
    Embeds {
        project: String,
        dates: String,
        threshold: f64,
    },
    /// Run a named recipe from the settings file
    Recipe { name: String },
    /// Choose a recipe or an action through prompts
    Interactive,
    /// Load and validate the settings file, then exit
    ValidateConfig,
}

impl Command {
    fn into_plan(self) -> TweetLens::Result<Option<Plan>> {
        let single = |project: String, kind: ActionKind, params: ActionParams| {
            Action::from_kind(kind, &params).map(|a| Some(Plan::single(project, a)))
        };
        let dated = |dates: String| ActionParams {
            dates: Some(dates),
            ..ActionParams::default()
        };
        match self {
            Command::Init { project } => single(project, ActionKind::Init, ActionParams::default()),
            Command::Scrape { project } => single(project, ActionKind::Scrape, ActionParams::default()),
            Command::Clean { project } => single(project, ActionKind::Clean, ActionParams::default()),
            Command::Dedup { project } => single(project, ActionKind::Dedup, ActionParams::default()),
            Command::Wordcount { project, dates } => single(project, ActionKind::Wordcount, dated(dates)),
            Command::Tfidf { project, dates } => single(project, ActionKind::Tfidf, dated(dates)),
            Command::Sentiment {
                project,
                dates,
                metric,
            } => single(
                project,
                ActionKind::Sentiment,
                ActionParams {
                    metric: Some(metric),
                    ..dated(dates)
                },
            ),
            Command::Compare {
                project,
                dates,
                project2,
            } => single(
                project,
                ActionKind::Compare,
                ActionParams {
                    other_project: Some(project2),
                    ..dated(dates)
                },
            ),
            Command::Embeds {
                project,
                dates,
                threshold,
            } => single(
                project,
                ActionKind::Embeds,
                ActionParams {
                    threshold: Some(threshold),
                    ..dated(dates)
                },
            ),
            Command::Recipe { .. } | Command::Interactive | Command::ValidateConfig => Ok(None),
        }
    }
}

fn summarize(reports: &[StageReport]) {
    for report in reports {
        info!(
            action = report.action,
            records_in = ?report.records_in,
            records_out = ?report.records_out,
            artifacts = report.artifacts.len(),
            "Action summary"
        );
        for path in &report.artifacts {
            println!("{}", path.display());
        }
    }
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args.config)
        .with_context(|| format!("Could not load settings from {}", args.config.display()))?;

    let plan = match args.command {
        Command::ValidateConfig => {
            println!(
                "{} is valid: {} project(s), {} recipe(s)",
                args.config.display(),
                settings.projects.len(),
                settings.recipes.len()
            );
            return Ok(());
        }
        Command::Recipe { name } => {
            Plan::from_recipe(&settings, &name).with_context(|| format!("Invalid recipe '{}'", name))?
        }
        Command::Interactive => {
            let stdin = std::io::stdin();
            run_interactive(&settings, stdin.lock(), std::io::stdout()).context("Interactive selection failed")?
        }
        command => command
            .into_plan()
            .context("Invalid action arguments")?
            .context("Command does not map to an action")?,
    };

    let timeline = TwitterTimelineClient::new(&settings.api).context("Could not create the timeline client")?;
    info!(project = %plan.project, actions = plan.actions.len(), "Starting run");
    let project = plan.project.clone();
    let reports = plan
        .execute(&settings, &timeline)
        .with_context(|| format!("Run for project '{}' failed", project))?;
    summarize(&reports);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(args.log_format, args.log_dir.as_deref());

    if let Err(e) = run(args) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
