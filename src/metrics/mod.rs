use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_gauge_with_registry,
};
use lazy_static::lazy_static;
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,

    // Gauge metrics
    pub sheep_live: Gauge,

    // Counter metrics
    pub operations: CounterVec,
    pub launch_failures: Counter,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let sheep_live = register_gauge_with_registry!(
            Opts::new("shepherd_sheep_live", "Number of tool processes currently registered"),
            registry
        ).unwrap();

        let operations = register_counter_vec_with_registry!(
            Opts::new("shepherd_operations_total", "Operations handled, by op and result"),
            &["op", "result"],
            registry
        ).unwrap();

        let launch_failures = register_counter_with_registry!(
            Opts::new("shepherd_launch_failures_total", "Tool launches that exited within the startup window"),
            registry
        ).unwrap();

        Self {
            registry,
            sheep_live,
            operations,
            launch_failures,
        }
    }

    pub fn render(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// 记录一次操作结果
    pub fn record(&self, op: &str, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.operations.with_label_values(&[op, result]).inc();
    }
}

lazy_static! {
    pub static ref METRICS: Arc<MetricsRegistry> = Arc::new(MetricsRegistry::new());
}
