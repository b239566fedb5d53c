pub mod collector;
pub mod metrics;
pub mod monitor;
pub mod report;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use metrics::NodeMetrics;
pub use monitor::PipelineMonitor;
pub use report::{ChannelReporter, ErrorReporter, Report, Severity, TracingReporter};
