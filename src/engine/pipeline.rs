use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::PipelineStatus;
use crate::config::{ConfigError, ParameterValue};
use crate::core::{ProcessingStage, Record};
use crate::observability::{MetricsCollector, PipelineMonitor};

/// What travels between stage workers. Configuration changes share the
/// record queue, so a change lands after every record triggered before it.
enum StageMessage {
    Record(Arc<Record>),
    Reconfigure(ReconfigureRequest),
}

struct ReconfigureRequest {
    stage_id: String,
    key: String,
    value: Value,
    reply: oneshot::Sender<Result<ParameterValue, ConfigError>>,
}

/// Where a worker sends what it does not consume
enum Outlet {
    Stage(mpsc::Sender<StageMessage>),
    Output(mpsc::Sender<Arc<Record>>),
}

impl Outlet {
    fn send_record(&self, record: Arc<Record>) -> bool {
        match self {
            Outlet::Stage(tx) => tx.blocking_send(StageMessage::Record(record)).is_ok(),
            Outlet::Output(tx) => tx.blocking_send(record).is_ok(),
        }
    }

    fn send_request(&self, request: ReconfigureRequest) -> bool {
        match self {
            Outlet::Stage(tx) => tx.blocking_send(StageMessage::Reconfigure(request)).is_ok(),
            Outlet::Output(_) => {
                // Dropping the reply sender fails the waiting caller
                tracing::warn!(stage = %request.stage_id, key = %request.key, "reconfigure reached the end of the pipeline");
                true
            }
        }
    }
}

/// Linear chain of stages, one blocking worker per stage.
///
/// Records enter through [`trigger`](Self::trigger) and leave through the
/// receiver returned by [`start`](Self::start). A stage returning `None`
/// drops the record; nothing downstream sees it.
pub struct StagePipeline {
    stages: Vec<Arc<dyn ProcessingStage>>,
    input: Option<mpsc::Sender<StageMessage>>,
    handles: Vec<JoinHandle<()>>,
    channel_capacity: usize,
    collector: MetricsCollector,
    status: PipelineStatus,
}

impl StagePipeline {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            stages: Vec::new(),
            input: None,
            handles: Vec::new(),
            channel_capacity: channel_capacity.max(1),
            collector: MetricsCollector::new(),
            status: PipelineStatus::Idle,
        }
    }

    /// Append a stage to the end of the chain
    pub fn add_stage(&mut self, stage: Arc<dyn ProcessingStage>) -> Result<()> {
        if self.status == PipelineStatus::Running {
            return Err(anyhow!("Cannot add stage {} to a running pipeline", stage.id()));
        }
        if self.stage(stage.id()).is_some() {
            return Err(anyhow!("Duplicate stage id: {}", stage.id()));
        }

        self.collector.register(stage.id(), stage.metrics());
        self.stages.push(stage);
        Ok(())
    }

    pub fn stage(&self, stage_id: &str) -> Option<Arc<dyn ProcessingStage>> {
        self.stages.iter().find(|s| s.id() == stage_id).cloned()
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    fn transition_to(&mut self, target: PipelineStatus) -> Result<()> {
        if !self.status.can_transition_to(&target) {
            return Err(anyhow!(
                "Invalid pipeline transition: {} -> {}",
                self.status.name(),
                target.name()
            ));
        }
        self.status = target;
        Ok(())
    }

    /// Spawn the stage workers and return the receiver for the last stage's
    /// output. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<mpsc::Receiver<Arc<Record>>> {
        if self.stages.is_empty() {
            return Err(anyhow!("Pipeline has no stages"));
        }
        self.transition_to(PipelineStatus::Running)?;

        let (input_tx, mut upstream) = mpsc::channel::<StageMessage>(self.channel_capacity);
        let (output_tx, output_rx) = mpsc::channel::<Arc<Record>>(self.channel_capacity);

        let mut workers = Vec::with_capacity(self.stages.len());
        if let Some((last, init)) = self.stages.split_last() {
            for stage in init {
                let (tx, rx) = mpsc::channel::<StageMessage>(self.channel_capacity);
                let inbox = std::mem::replace(&mut upstream, rx);
                workers.push((stage.clone(), inbox, Outlet::Stage(tx)));
            }
            workers.push((last.clone(), upstream, Outlet::Output(output_tx)));
        }

        for (stage, inbox, outlet) in workers {
            // receive() blocks on the stage lock and the backend, so it runs
            // off the async workers
            let handle = tokio::task::spawn_blocking(move || run_worker(stage, inbox, outlet));
            self.handles.push(handle);
        }

        self.input = Some(input_tx);
        tracing::info!(stages = self.stages.len(), "pipeline started");
        Ok(output_rx)
    }

    /// Feed one record to the first stage
    pub async fn trigger(&self, record: Arc<Record>) -> Result<()> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| anyhow!("Pipeline is not running"))?;
        input
            .send(StageMessage::Record(record))
            .await
            .map_err(|_| anyhow!("Failed to send record to pipeline"))
    }

    /// Apply a configuration change to one stage, followed by its change
    /// notification.
    ///
    /// While running, the change is queued behind every record already
    /// triggered and the call returns once the stage has applied it, so the
    /// output must keep being drained if more records are in flight than
    /// the channels hold. Otherwise it is applied immediately.
    pub async fn reconfigure(&self, stage_id: &str, key: &str, value: &Value) -> Result<ParameterValue> {
        let stage = self
            .stage(stage_id)
            .ok_or_else(|| anyhow!("Unknown stage: {}", stage_id))?;

        let result = match &self.input {
            Some(input) => {
                let (reply, accepted) = oneshot::channel();
                let request = ReconfigureRequest {
                    stage_id: stage_id.to_string(),
                    key: key.to_string(),
                    value: value.clone(),
                    reply,
                };
                input
                    .send(StageMessage::Reconfigure(request))
                    .await
                    .map_err(|_| anyhow!("Failed to send reconfigure of {} to pipeline", stage_id))?;
                accepted
                    .await
                    .map_err(|_| anyhow!("Stage {} stopped before applying {}", stage_id, key))?
            }
            None => stage.reconfigure(key, value),
        };

        result.with_context(|| format!("Stage {} rejected {} = {}", stage_id, key, value))
    }

    /// Close the input and wait until every worker has drained.
    ///
    /// Records and changes still queued are processed first. The output
    /// receiver must be drained concurrently, or dropped, if more records are
    /// in flight than the channels hold.
    pub async fn stop(&mut self) -> Result<()> {
        self.transition_to(PipelineStatus::Stopped)?;

        drop(self.input.take());

        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            handle.await.context("Stage worker panicked")?;
        }

        tracing::info!("pipeline stopped");
        Ok(())
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.collector.clone())
    }
}

fn run_worker(stage: Arc<dyn ProcessingStage>, mut inbox: mpsc::Receiver<StageMessage>, outlet: Outlet) {
    while let Some(message) = inbox.blocking_recv() {
        let delivered = match message {
            StageMessage::Record(record) => match stage.receive(record) {
                Some(output) => outlet.send_record(output),
                None => true,
            },
            StageMessage::Reconfigure(request) if request.stage_id == stage.id() => {
                let result = stage.reconfigure(&request.key, &request.value);
                // The caller may have given up waiting
                let _ = request.reply.send(result);
                true
            }
            StageMessage::Reconfigure(request) => outlet.send_request(request),
        };
        if !delivered {
            break;
        }
    }
    tracing::debug!(stage = %stage.id(), "stage worker finished");
}
