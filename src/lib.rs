#![allow(non_snake_case)]
#![allow(clippy::too_many_arguments)]

pub mod action;
pub mod config;
pub mod data_model;
pub mod error;
pub mod executor;
pub mod interactive;
pub mod pipeline;
pub mod utils;

pub use action::{Action, ActionKind, ActionParams, Plan};
pub use error::{PipelineError, Result};
pub use executor::{PipelineExecutor, Stage, StageContext, StageReport};
