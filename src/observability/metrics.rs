use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Per-stage throughput and latency counters
pub struct NodeMetrics {
    stage_id: String,
    origin: Instant,
    records_processed: AtomicU64,
    errors_count: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
    /// Offset from `origin` of the previous computation start, plus one; 0 if none
    last_start_us: AtomicU64,
    total_interval_us: AtomicU64,
    interval_samples: AtomicU64,
}

impl NodeMetrics {
    pub fn new(stage_id: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            origin: Instant::now(),
            records_processed: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
            last_start_us: AtomicU64::new(0),
            total_interval_us: AtomicU64::new(0),
            interval_samples: AtomicU64::new(0),
        }
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn records_processed(&self) -> u64 {
        self.records_processed.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn record_processed(&self) {
        self.records_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks the start of a computation; also feeds the call-frequency estimate
    pub fn start_processing(&self) -> Instant {
        let now = Instant::now();
        let offset = now.duration_since(self.origin).as_micros() as u64 + 1;
        let previous = self.last_start_us.swap(offset, Ordering::Relaxed);
        if previous != 0 {
            self.total_interval_us
                .fetch_add(offset.saturating_sub(previous), Ordering::Relaxed);
            self.interval_samples.fetch_add(1, Ordering::Relaxed);
        }
        now
    }

    pub fn finish_processing(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn computations(&self) -> u64 {
        self.latency_samples.load(Ordering::Relaxed)
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }

    pub fn avg_interval_us(&self) -> u64 {
        let samples = self.interval_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_interval_us.load(Ordering::Relaxed) / samples
    }

    /// Computations per second, 0 until two have started
    pub fn call_frequency_hz(&self) -> f64 {
        match self.avg_interval_us() {
            0 => 0.0,
            interval => 1_000_000.0 / interval as f64,
        }
    }
}

impl std::fmt::Debug for NodeMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMetrics")
            .field("stage_id", &self.stage_id)
            .field("records_processed", &self.records_processed())
            .field("errors_count", &self.errors_count())
            .field("avg_latency_us", &self.avg_latency_us())
            .finish()
    }
}
