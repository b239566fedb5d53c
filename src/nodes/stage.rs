use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::compute::{BackendError, ComputeBackend, Routine, RoutineCall, RoutineOutput};
use crate::config::{ConfigError, ConfigurationStore, ParameterSnapshot, ParameterSpec, ParameterValue, StageParams};
use crate::core::{
    ElementType, MetadataCache, PhaseCell, ProcessingStage, Record, RecordError, StageError, StageKind,
    StagePhase,
};
use crate::dispatch::DispatchTable;
use crate::observability::{ErrorReporter, NodeMetrics, Report, Severity, TracingReporter};

/// Everything guarded by the stage lock
struct StageState<K: StageKind> {
    store: ConfigurationStore,
    params: K::Params,
    snapshot: ParameterSnapshot,
    table: DispatchTable<Routine>,
    backend: Box<dyn ComputeBackend>,
    metadata: MetadataCache,
}

/// A processing stage of kind `K`.
///
/// One lock serialises record processing, configuration changes and every
/// backend call, so an in-flight record sees either the whole configuration
/// before a change or the whole configuration after it.
pub struct Stage<K: StageKind> {
    id: String,
    state: Mutex<StageState<K>>,
    phase: PhaseCell,
    metrics: Arc<NodeMetrics>,
    reporter: Arc<dyn ErrorReporter>,
}

impl<K: StageKind> Stage<K> {
    /// Build a stage reporting through `tracing`
    pub fn new(id: impl Into<String>, backend: impl ComputeBackend + 'static) -> Result<Self> {
        Self::with_reporter(id, backend, Arc::new(TracingReporter))
    }

    /// Build a stage owning `backend`. The backend is opened here and closed
    /// when the stage is dropped.
    pub fn with_reporter(
        id: impl Into<String>,
        backend: impl ComputeBackend + 'static,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let id = id.into();

        let store = K::Params::declare_defaults()
            .with_context(|| format!("Failed to declare parameters of stage {}", id))?;
        let params = K::Params::load(&store)
            .with_context(|| format!("Failed to load parameters of stage {}", id))?;
        let snapshot = params.snapshot();

        let mut backend: Box<dyn ComputeBackend> = Box::new(backend);
        backend
            .open()
            .with_context(|| format!("Failed to open backend '{}' for stage {}", backend.name(), id))?;

        tracing::debug!(stage = %id, kind = K::NAME, backend = backend.name(), "stage created");

        Ok(Self {
            metrics: Arc::new(NodeMetrics::new(&id)),
            id,
            state: Mutex::new(StageState {
                store,
                params,
                snapshot,
                table: K::dispatch_table(),
                backend,
                metadata: MetadataCache::new(),
            }),
            phase: PhaseCell::new(),
            reporter,
        })
    }

    /// Apply every key of a JSON object as a configuration change
    pub fn configure(&self, config: &Value) -> Result<(), ConfigError> {
        let entries = config
            .as_object()
            .ok_or_else(|| ConfigError::NotAnObject(config.clone()))?;
        for (key, raw) in entries {
            self.reconfigure(key, raw)?;
        }
        Ok(())
    }

    /// Restore all parameters to their defaults and reload the cached
    /// configuration
    pub fn reset_configuration(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        self.phase.transition(StagePhase::Reconfiguring);

        state.store.reset();
        match K::Params::load(&state.store) {
            Ok(params) => {
                state.params = params;
                state.snapshot = state.params.snapshot();
            }
            Err(e) => self.report(Report::from_error(Severity::Error, &self.id, &e.into())),
        }
        state.metadata.invalidate();

        self.phase.transition(StagePhase::Idle);
    }

    /// Element type records will be produced in
    pub fn output_type(&self) -> ElementType {
        K::output_type(&self.lock().params)
    }

    /// Every `(input, output)` pair this stage can process
    pub fn supported_pairs(&self) -> Vec<(ElementType, ElementType)> {
        self.lock().table.pairs()
    }

    /// How many times output metadata was actually derived
    pub fn metadata_derivations(&self) -> u64 {
        self.lock().metadata.derivations()
    }

    pub fn backend_name(&self) -> String {
        self.lock().backend.name().to_string()
    }

    fn lock(&self) -> MutexGuard<'_, StageState<K>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            // A backend panicked mid-record; the phase it left behind is stale
            self.phase.reset();
            poisoned.into_inner()
        })
    }

    fn report(&self, report: Report) {
        self.reporter.report(report);
    }

    fn process(&self, state: &mut StageState<K>, record: &Record) -> Result<Arc<Record>, StageError> {
        K::check_input(record)?;

        self.phase.transition(StagePhase::Dispatching);
        let output_type = K::output_type(&state.params);
        let routine = state.table.resolve(record.element_type(), output_type)?;

        self.phase.transition(StagePhase::Computing);
        let start = self.metrics.start_processing();
        let computed = Self::compute(state, routine, record);
        self.metrics.finish_processing(start);
        let computed = computed?;

        self.phase.transition(StagePhase::Annotating);
        let snapshot = &state.snapshot;
        let metadata = state
            .metadata
            .resolve(record.metadata(), |input| input.derive(K::QUALIFIER, K::POST_STATE, snapshot));

        let output = Record::new(
            K::OUTPUT_KIND,
            computed.payload,
            computed.shape,
            metadata,
            record.timestamps(),
            record.sequence_id(),
        )
        .map_err(|e| match e {
            RecordError::ShapeMismatch { shape, elements } => BackendError::ShapeMismatch {
                shape,
                samples: elements,
            },
            RecordError::ShapeOverflow { shape } => BackendError::InvalidInput(format!(
                "backend returned overflowing shape {:?}",
                shape
            )),
        })?;

        Ok(Arc::new(output))
    }

    /// Device barriers on both sides so timing and buffer reuse are safe
    /// across stage boundaries
    fn compute(state: &mut StageState<K>, routine: Routine, record: &Record) -> Result<RoutineOutput, StageError> {
        state.backend.synchronize()?;
        let output = routine(RoutineCall {
            backend: state.backend.as_mut(),
            payload: record.payload(),
            shape: record.shape(),
            parameters: &state.snapshot,
            host_only: K::HOST_ONLY,
        })?;
        state.backend.synchronize()?;
        Ok(output)
    }
}

impl<K: StageKind> ProcessingStage for Stage<K> {
    fn id(&self) -> &str {
        &self.id
    }

    fn receive(&self, record: Arc<Record>) -> Option<Arc<Record>> {
        let mut guard = self.lock();
        self.phase.transition(StagePhase::Validating);
        let result = self.process(&mut guard, &record);
        self.phase.transition(StagePhase::Idle);
        drop(guard);

        match result {
            Ok(output) => {
                self.metrics.record_processed();
                tracing::debug!(
                    stage = %self.id,
                    sequence_id = output.sequence_id(),
                    element_type = %output.element_type(),
                    "record processed"
                );
                Some(output)
            }
            Err(e) => {
                self.metrics.record_error();
                self.report(Report::from_error(Severity::Error, &self.id, &e));
                None
            }
        }
    }

    fn apply_change(&self, key: &str, raw: &Value) -> Result<ParameterValue, ConfigError> {
        let mut guard = self.lock();
        self.phase.transition(StagePhase::Reconfiguring);
        let result = guard.store.apply_change(key, raw);
        self.phase.transition(StagePhase::Idle);
        drop(guard);

        match result {
            Ok(change) => {
                tracing::info!(
                    stage = %self.id,
                    key,
                    previous = %change.previous,
                    current = %change.current,
                    "parameter changed"
                );
                Ok(change.current)
            }
            Err(e) => {
                let error = StageError::ConfigurationRejected(e.clone());
                self.report(Report::from_error(Severity::Warning, &self.id, &error));
                Err(e)
            }
        }
    }

    fn on_configuration_changed(&self, key: &str) {
        let mut guard = self.lock();
        let state = &mut *guard;
        self.phase.transition(StagePhase::Reconfiguring);

        match state.params.reload(key, &state.store) {
            Ok(true) => {}
            Ok(false) => self.report(Report::new(
                Severity::Warning,
                &self.id,
                format!("change notification for undeclared parameter '{}'", key),
            )),
            Err(e) => self.report(Report::from_error(Severity::Error, &self.id, &e.into())),
        }
        state.snapshot = state.params.snapshot();
        state.metadata.invalidate();

        self.phase.transition(StagePhase::Idle);
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        self.lock().store.specs()
    }

    fn parameter(&self, key: &str) -> Result<ParameterValue, ConfigError> {
        self.lock().store.get(key).cloned()
    }

    fn phase(&self) -> StagePhase {
        self.phase.get()
    }

    fn metrics(&self) -> Arc<NodeMetrics> {
        self.metrics.clone()
    }
}

impl<K: StageKind> Drop for Stage<K> {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.backend.close();
        tracing::debug!(stage = %self.id, "stage dropped, backend closed");
    }
}

impl<K: StageKind> std::fmt::Debug for Stage<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("kind", &K::NAME)
            .field("phase", &self.phase.get())
            .finish()
    }
}
