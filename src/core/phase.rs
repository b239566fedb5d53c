use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Where a stage is in handling a record or a configuration change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StagePhase {
    Idle,
    Validating,
    Dispatching,
    Computing,
    Annotating,
    Reconfiguring,
}

impl StagePhase {
    /// Check if transition from current phase to target phase is valid
    pub fn can_transition_to(&self, target: &StagePhase) -> bool {
        use StagePhase::*;

        matches!(
            (self, target),
            // Record path
            (Idle, Validating) |
            (Validating, Dispatching) |
            (Dispatching, Computing) |
            (Computing, Annotating) |

            // Completion, or early exit on a failed record
            (Validating, Idle) |
            (Dispatching, Idle) |
            (Computing, Idle) |
            (Annotating, Idle) |

            // Only entered between records
            (Idle, Reconfiguring) |
            (Reconfiguring, Idle)
        )
    }

    /// Get human-readable phase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Validating => "Validating",
            Self::Dispatching => "Dispatching",
            Self::Computing => "Computing",
            Self::Annotating => "Annotating",
            Self::Reconfiguring => "Reconfiguring",
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Validating,
            2 => Self::Dispatching,
            3 => Self::Computing,
            4 => Self::Annotating,
            5 => Self::Reconfiguring,
            _ => Self::Idle,
        }
    }
}

impl Default for StagePhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Lock-free readable phase. Written only by the holder of the stage lock.
#[derive(Debug, Default)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> StagePhase {
        StagePhase::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn transition(&self, target: StagePhase) {
        let current = self.get();
        debug_assert!(
            current.can_transition_to(&target),
            "invalid stage transition: {} -> {}",
            current.name(),
            target.name()
        );
        self.0.store(target.to_u8(), Ordering::Release);
    }

    /// Force `Idle` without checking the transition
    pub fn reset(&self) {
        self.0.store(StagePhase::Idle.to_u8(), Ordering::Release);
    }
}
