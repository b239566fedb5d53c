use serde::{Deserialize, Serialize};

/// Lifecycle of a [`StagePipeline`](super::StagePipeline)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    Idle,
    Running,
    Stopped,
}

impl PipelineStatus {
    /// Check if transition from current status to target status is valid
    pub fn can_transition_to(&self, target: &PipelineStatus) -> bool {
        use PipelineStatus::*;

        matches!(
            (self, target),
            (Idle, Running) |
            (Running, Stopped) |
            // Stages are kept, so a stopped pipeline can be started again
            (Stopped, Running)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        }
    }
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self::Idle
    }
}
