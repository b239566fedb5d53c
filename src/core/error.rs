use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::Shape;
use crate::compute::BackendError;
use crate::config::ConfigError;
use crate::dispatch::DispatchError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("payload holds {elements} elements but shape {shape:?} needs {}", .shape.volume())]
    ShapeMismatch { shape: Shape, elements: usize },

    #[error("shape {shape:?} holds more elements than fit in memory")]
    ShapeOverflow { shape: Shape },
}

/// Category of a per-record failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    TypeMismatch,
    UnsupportedDispatch,
    ConfigurationRejected,
    BackendFailure,
}

/// Failure while a stage handles one record or one configuration change.
/// Never crosses the stage boundary; stages turn it into a report.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unsupported dispatch: {0}")]
    UnsupportedDispatch(#[from] DispatchError),

    #[error("configuration rejected: {0}")]
    ConfigurationRejected(#[from] ConfigError),

    #[error("backend failure: {0}")]
    BackendFailure(#[from] BackendError),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::UnsupportedDispatch(_) => ErrorKind::UnsupportedDispatch,
            Self::ConfigurationRejected(_) => ErrorKind::ConfigurationRejected,
            Self::BackendFailure(_) => ErrorKind::BackendFailure,
        }
    }
}
