pub mod compute;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod nodes;
pub mod observability;
pub mod registry;
pub mod source;

pub use crate::core::{ProcessingStage, Record, StageKind};
pub use engine::StagePipeline;
pub use nodes::{BeamformingMvStage, ImageInferenceStage, Stage};
