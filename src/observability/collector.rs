use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use super::NodeMetrics;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub stage_id: String,
    pub records_processed: u64,
    pub errors_count: u64,
    pub avg_latency_us: u64,
    pub call_frequency_hz: f64,
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: BTreeMap<String, Arc<NodeMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage_id: impl Into<String>, metrics: Arc<NodeMetrics>) {
        self.metrics.insert(stage_id.into(), metrics);
    }

    pub fn snapshot(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metrics)| {
                (
                    id.clone(),
                    MetricsSnapshot {
                        stage_id: metrics.stage_id().to_string(),
                        records_processed: metrics.records_processed(),
                        errors_count: metrics.errors_count(),
                        avg_latency_us: metrics.avg_latency_us(),
                        call_frequency_hz: metrics.call_frequency_hz(),
                    },
                )
            })
            .collect()
    }

    pub fn get_stage_metrics(&self, stage_id: &str) -> Option<Arc<NodeMetrics>> {
        self.metrics.get(stage_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
