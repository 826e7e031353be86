use std::path::PathBuf;

use tracing::{debug, info, info_span, warn};

use crate::config::Settings;
use crate::data_model::Project;
use crate::error::{PipelineError, Result};
use crate::pipeline::collector::TimelineSource;
use crate::pipeline::store::ProjectLayout;

/// Everything a stage may touch. Passed explicitly to every stage.
pub struct StageContext<'a> {
    pub settings: &'a Settings,
    pub project: Project,
    pub timeline: &'a dyn TimelineSource,
}

impl<'a> StageContext<'a> {
    pub fn new(settings: &'a Settings, project: Project, timeline: &'a dyn TimelineSource) -> Self {
        StageContext {
            settings,
            project,
            timeline,
        }
    }

    pub fn layout(&self) -> ProjectLayout {
        self.layout_for(&self.project.key)
    }

    pub fn layout_for(&self, key: &str) -> ProjectLayout {
        ProjectLayout::new(&self.settings.base_path, key)
    }
}

/// What a stage did, for the run summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    pub action: &'static str,
    pub records_in: Option<usize>,
    pub records_out: Option<usize>,
    pub artifacts: Vec<PathBuf>,
}

pub trait Stage {
    fn name(&self) -> &'static str; // For logging/error reporting

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageReport>;
}

/// Runs stages one after another, stopping at the first failure.
pub struct PipelineExecutor {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineExecutor {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        if stages.is_empty() {
            warn!("Pipeline created with no stages.");
        }
        PipelineExecutor { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, ctx: &StageContext<'_>) -> Result<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let span = info_span!("stage", action = stage.name(), project = %ctx.project.key);
            let _enter = span.enter();
            info!("Perform {} on {}", stage.name(), ctx.project.key);

            let report = stage.run(ctx).map_err(|e| PipelineError::StepError {
                step_name: stage.name().to_string(),
                source: Box::new(e),
            })?;
            debug!(artifacts = report.artifacts.len(), "Stage finished");
            reports.push(report);
        }
        Ok(reports)
    }
}
