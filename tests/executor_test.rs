use std::cell::RefCell;
use std::rc::Rc;
use std::collections::BTreeMap;
use std::path::PathBuf;

use TweetLens::config::{ProjectConfig, Settings};
use TweetLens::data_model::{Post, Project};
use TweetLens::error::{PipelineError, Result};
use TweetLens::executor::{PipelineExecutor, Stage, StageContext, StageReport};
use TweetLens::pipeline::collector::{PageRequest, TimelineSource};

struct NoTimeline;

impl TimelineSource for NoTimeline {
    fn fetch_page(&self, _query: &str, _request: &PageRequest) -> Result<Vec<Post>> {
        Ok(Vec::new())
    }
}

fn test_settings() -> Settings {
    let mut projects = BTreeMap::new();
    projects.insert(
        "p".to_string(),
        ProjectConfig {
            query: "someone".to_string(),
            stopwords: vec![],
        },
    );
    Settings {
        base_path: PathBuf::from("unused"),
        api: Default::default(),
        cleaning: Default::default(),
        analysis: Default::default(),
        lexicons: Default::default(),
        embeddings: Default::default(),
        projects,
        recipes: BTreeMap::new(),
    }
}

fn test_project() -> Project {
    Project {
        key: "p".to_string(),
        query: "someone".to_string(),
        stopwords: vec![],
    }
}

// Records its name into a shared log when run.
struct MockStage {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
    fail: bool,
}

impl Stage for MockStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageReport> {
        self.log.borrow_mut().push(self.name);
        if self.fail {
            return Err(PipelineError::AnalysisError("mock failure".to_string()));
        }
        Ok(StageReport {
            action: self.name,
            records_in: Some(1),
            records_out: Some(1),
            artifacts: vec![ctx.layout().analysis_dir().join(format!("{}.csv", self.name))],
        })
    }
}

#[test]
fn test_new_executor_with_empty_stages() {
    let executor = PipelineExecutor::new(vec![]);
    assert!(executor.is_empty());
    let settings = test_settings();
    let ctx = StageContext::new(&settings, test_project(), &NoTimeline);
    assert!(executor.run(&ctx).unwrap().is_empty());
}

#[test]
fn test_stages_run_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(MockStage { name: "first", log: log.clone(), fail: false }),
        Box::new(MockStage { name: "second", log: log.clone(), fail: false }),
    ];
    let executor = PipelineExecutor::new(stages);
    assert_eq!(executor.len(), 2);
    assert_eq!(executor.stage_names(), vec!["first", "second"]);

    let settings = test_settings();
    let ctx = StageContext::new(&settings, test_project(), &NoTimeline);
    let reports = executor.run(&ctx).unwrap();

    assert_eq!(*log.borrow(), vec!["first", "second"]);
    assert_eq!(reports.len(), 2);
    assert_eq!(
        reports[1].artifacts,
        vec![PathBuf::from("unused/p/analysis/second.csv")]
    );
}

#[test]
fn test_failure_stops_the_run_and_names_the_stage() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(MockStage { name: "ok", log: log.clone(), fail: false }),
        Box::new(MockStage { name: "broken", log: log.clone(), fail: true }),
        Box::new(MockStage { name: "never", log: log.clone(), fail: false }),
    ];
    let executor = PipelineExecutor::new(stages);
    let settings = test_settings();
    let ctx = StageContext::new(&settings, test_project(), &NoTimeline);

    match executor.run(&ctx) {
        Err(PipelineError::StepError { step_name, source }) => {
            assert_eq!(step_name, "broken");
            assert!(matches!(*source, PipelineError::AnalysisError(_)));
        }
        other => panic!("Expected StepError, got {:?}", other),
    }
    assert_eq!(*log.borrow(), vec!["ok", "broken"]);
}
