//! Error-reporting collaborator.
//!
//! Stages never raise per-record failures to their caller. They hand a
//! [`Report`] to an [`ErrorReporter`], which must neither panic nor block.

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::core::{ErrorKind, StageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub severity: Severity,
    pub stage: String,
    pub message: String,
    /// Set when the report stems from a classified failure
    pub kind: Option<ErrorKind>,
}

impl Report {
    pub fn new(severity: Severity, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            stage: stage.into(),
            message: message.into(),
            kind: None,
        }
    }

    pub fn from_error(severity: Severity, stage: impl Into<String>, error: &StageError) -> Self {
        Self {
            severity,
            stage: stage.into(),
            message: error.to_string(),
            kind: Some(error.kind()),
        }
    }
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: Report);
}

/// Forwards reports to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: Report) {
        let Report {
            severity,
            stage,
            message,
            kind,
        } = report;

        match severity {
            Severity::Error => tracing::error!(stage = %stage, kind = ?kind, "{}: {}", stage, message),
            Severity::Warning => tracing::warn!(stage = %stage, kind = ?kind, "{}: {}", stage, message),
            Severity::Info => tracing::info!(stage = %stage, kind = ?kind, "{}: {}", stage, message),
        }
    }
}

/// Pushes reports onto an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<Report>,
}

impl ChannelReporter {
    pub fn new() -> (Self, Receiver<Report>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl ErrorReporter for ChannelReporter {
    fn report(&self, report: Report) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.tx.send(report);
    }
}
