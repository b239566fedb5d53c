use serde_json::Value;
use std::sync::Arc;

use super::error::StageError;
use super::metadata::ImageState;
use super::phase::StagePhase;
use super::record::{Record, RecordKind};
use super::ElementType;
use crate::compute::Routine;
use crate::config::{ConfigError, ParameterSpec, ParameterValue, StageParams};
use crate::dispatch::DispatchTable;
use crate::observability::NodeMetrics;

/// Contract between a stage and the scheduler / configuration collaborators.
///
/// All methods take `&self`; a stage serialises its own work internally, so
/// one instance can be shared between the worker feeding it records and
/// whoever changes its configuration.
pub trait ProcessingStage: Send + Sync {
    fn id(&self) -> &str;

    /// Process one upstream record. `None` means "no record produced", which
    /// covers every per-record failure; those are reported, never returned.
    fn receive(&self, record: Arc<Record>) -> Option<Arc<Record>>;

    /// Validate and store one parameter. The cached configuration is not
    /// touched until `on_configuration_changed(key)`.
    fn apply_change(&self, key: &str, raw: &Value) -> Result<ParameterValue, ConfigError>;

    /// Re-read `key` into the cached configuration and invalidate cached
    /// output metadata
    fn on_configuration_changed(&self, key: &str);

    /// `apply_change` followed by its notification
    fn reconfigure(&self, key: &str, raw: &Value) -> Result<ParameterValue, ConfigError> {
        let accepted = self.apply_change(key, raw)?;
        self.on_configuration_changed(key);
        Ok(accepted)
    }

    fn parameters(&self) -> Vec<ParameterSpec>;

    fn parameter(&self, key: &str) -> Result<ParameterValue, ConfigError>;

    fn phase(&self) -> StagePhase;

    fn metrics(&self) -> Arc<NodeMetrics>;
}

/// Static definition of a stage type: what it accepts, what it produces and
/// which element-type pairs it supports.
pub trait StageKind: Send + Sync + 'static {
    type Params: StageParams;

    const NAME: &'static str;
    /// Prefix of the parameter keys this stage records into metadata
    const QUALIFIER: &'static str = Self::NAME;
    const OUTPUT_KIND: RecordKind;
    /// State the output metadata is advanced to
    const POST_STATE: ImageState;
    /// Whether input must be host-resident before computing
    const HOST_ONLY: bool = false;

    /// Precondition on record kind and state
    fn check_input(record: &Record) -> Result<(), StageError>;

    fn output_type(params: &Self::Params) -> ElementType;

    fn dispatch_table() -> DispatchTable<Routine>;
}
