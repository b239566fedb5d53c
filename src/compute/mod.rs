//! Computation collaborator boundary.
//!
//! A stage never implements numerics itself. It hands working-precision
//! samples to a [`ComputeBackend`] it owns exclusively, and treats the call as
//! blocking until the backend returns.

pub mod reference;
pub mod routine;

pub use reference::{DelayAndSumBackend, ScaleBackend};
pub use routine::{transform, Routine, RoutineCall, RoutineOutput};

use thiserror::Error;

use crate::config::ParameterSnapshot;
use crate::core::{Shape, WorkType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("device error: {0}")]
    Device(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend returned {samples} samples for shape {shape:?}")]
    ShapeMismatch { shape: Shape, samples: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Input handed to a backend for one record
#[derive(Debug)]
pub struct ComputeRequest<'a> {
    pub samples: &'a [WorkType],
    pub shape: Shape,
    /// Execution stream of the input payload
    pub stream: u32,
    pub parameters: &'a ParameterSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputeOutput {
    pub samples: Vec<WorkType>,
    pub shape: Shape,
}

/// External numerical or inference engine driven by one stage.
///
/// Owned by exactly one stage for its whole lifetime and only called while
/// that stage holds its lock.
pub trait ComputeBackend: Send {
    fn name(&self) -> &str;

    /// Acquire device resources. Called once while the owning stage is built.
    fn open(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Block until all previously queued device work has completed
    fn synchronize(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn compute(&mut self, request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError>;

    /// Release device resources. Called when the owning stage is dropped.
    fn close(&mut self) {}
}
