pub mod pipeline;
pub mod state;

pub use pipeline::StagePipeline;
pub use state::PipelineStatus;
