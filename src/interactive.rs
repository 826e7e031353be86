// src/interactive.rs
use std::io::{BufRead, Write};

use crate::action::{Action, ActionKind, ActionParams, Plan};
use crate::config::Settings;
use crate::data_model::Metric;
use crate::error::{PipelineError, Result};

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{} ", question)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PipelineError::InvalidArgument(format!(
            "no answer given to '{}'",
            question
        )));
    }
    writeln!(output)?;
    Ok(line.trim().to_string())
}

fn list<'a, W: Write>(output: &mut W, heading: &str, items: impl IntoIterator<Item = &'a String>) -> Result<()> {
    writeln!(output, "{}", heading)?;
    writeln!(output)?;
    for item in items {
        writeln!(output, "{}", item)?;
    }
    writeln!(output)?;
    Ok(())
}

/// Prompts for a recipe, or for a project, an action and its parameters.
pub fn run_interactive<R: BufRead, W: Write>(settings: &Settings, mut input: R, mut output: W) -> Result<Plan> {
    writeln!(output)?;
    let use_recipe = ask(&mut input, &mut output, "Do you want to use a recipe (Y or N)?")?;
    if use_recipe.eq_ignore_ascii_case("y") {
        list(&mut output, "Choose a recipe:", settings.recipes.keys())?;
        let name = ask(&mut input, &mut output, "Which recipe do you want to use?")?;
        return Plan::from_recipe(settings, &name);
    }

    list(&mut output, "Choose a project:", settings.projects.keys())?;
    let project = ask(&mut input, &mut output, "Which project do you want to use?")?;
    settings.project(&project)?;

    writeln!(output, "Choose an action:")?;
    writeln!(output)?;
    for kind in ActionKind::ALL {
        writeln!(output, "\"{}\": {}", kind, kind.description())?;
    }
    writeln!(output)?;
    let kind: ActionKind = ask(&mut input, &mut output, "Which action do you want to perform?")?.parse()?;

    let mut params = ActionParams::default();
    if kind == ActionKind::Compare {
        list(
            &mut output,
            &format!("Choose a project to compare {} with:", project),
            settings.projects.keys().filter(|k| **k != project),
        )?;
        params.other_project = Some(ask(
            &mut input,
            &mut output,
            "Which project do you want to use for comparison?",
        )?);
    }
    if kind.needs_selection() {
        params.dates = Some(ask(
            &mut input,
            &mut output,
            "What year (or year-month) do you want to analyse (YYYY or YYYY-MM)?",
        )?);
    }
    if kind == ActionKind::Embeds {
        let answer = ask(
            &mut input,
            &mut output,
            "What threshold do you want to use to restrict nodes in the network graph?",
        )?;
        let threshold = answer.parse::<f64>().map_err(|_| {
            PipelineError::InvalidArgument(format!("threshold '{}' is not a number", answer))
        })?;
        params.threshold = Some(threshold);
    }
    if kind == ActionKind::Sentiment {
        writeln!(output, "In addition to rolling averages of valence, arousal and dominance, a timeseries analysis is")?;
        writeln!(output, "performed on one of the following:")?;
        writeln!(output)?;
        for metric in Metric::ALL {
            writeln!(output, "\"{}\"", metric)?;
        }
        writeln!(output)?;
        params.metric = Some(ask(
            &mut input,
            &mut output,
            "Which timeseries analysis do you wish to perform?",
        )?);
    }

    let action = Action::from_kind(kind, &params)?;
    Ok(Plan::single(project, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectConfig, RecipeConfig};
    use crate::data_model::AnalysisSelection;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn settings() -> Settings {
        let mut projects = BTreeMap::new();
        for key in ["alpha", "beta"] {
            projects.insert(
                key.to_string(),
                ProjectConfig {
                    query: format!("{}_user", key),
                    stopwords: vec![],
                },
            );
        }
        let mut recipes = BTreeMap::new();
        recipes.insert(
            "refresh".to_string(),
            RecipeConfig {
                project: "alpha".to_string(),
                actions: vec![ActionKind::Scrape, ActionKind::Clean, ActionKind::Dedup],
                dates: None,
                threshold: None,
                metric: None,
                project2: None,
            },
        );
        Settings {
            base_path: "data".into(),
            api: Default::default(),
            cleaning: Default::default(),
            analysis: Default::default(),
            lexicons: Default::default(),
            embeddings: Default::default(),
            projects,
            recipes,
        }
    }

    #[test]
    fn recipe_branch_returns_recipe_plan() {
        let mut out = Vec::new();
        let plan = run_interactive(&settings(), Cursor::new("Y\nrefresh\n"), &mut out).unwrap();
        assert_eq!(plan.project, "alpha");
        assert_eq!(plan.actions, vec![Action::Scrape, Action::Clean, Action::Dedup]);
        assert!(String::from_utf8(out).unwrap().contains("refresh"));
    }

    #[test]
    fn compare_prompts_for_second_project_and_dates() {
        let mut out = Vec::new();
        let plan = run_interactive(
            &settings(),
            Cursor::new("n\nalpha\ncompare\nbeta\n2021-04\n"),
            &mut out,
        )
        .unwrap();
        assert_eq!(
            plan.actions,
            vec![Action::Compare {
                selection: AnalysisSelection::parse("2021-04").unwrap(),
                other_project: "beta".to_string(),
            }]
        );
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Choose a project to compare alpha with:"));
    }

    #[test]
    fn unknown_project_and_early_eof_are_errors() {
        let mut out = Vec::new();
        assert!(run_interactive(&settings(), Cursor::new("N\ngamma\n"), &mut out).is_err());
        assert!(run_interactive(&settings(), Cursor::new("N\nalpha\nembeds\n2021\n"), &mut out).is_err());
    }
}
