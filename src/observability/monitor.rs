use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No stages registered".to_string();
        }

        let mut report = String::from("=== Stage Metrics ===\n");

        for (stage_id, metrics) in snapshot.iter() {
            report.push_str(&format!(
                "\n[{}]\n  Records: {} processed\n  Errors: {}\n  Avg Latency: {}μs\n  Call Rate: {:.1} Hz\n",
                stage_id,
                metrics.records_processed,
                match metrics.errors_count {
                    0 => "0 errors".to_string(),
                    1 => "1 error".to_string(),
                    n => format!("{} errors", n),
                },
                metrics.avg_latency_us,
                metrics.call_frequency_hz,
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
