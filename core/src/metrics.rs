use once_cell::sync::Lazy;
use prometheus::{IntCounter, Opts, Registry};

/// Ingestion counters, mirrored onto a prometheus registry so an
/// embedding service can scrape discard rates.
pub struct Metrics {
    registry: Registry,
    pub sessions_processed: IntCounter,
    pub discarded_stale: IntCounter,
    pub discarded_short: IntCounter,
    pub discarded_irregular: IntCounter,
}

pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();
        let sessions_processed = counter(
            &registry,
            "sessions_processed_total",
            "Sessions that survived every ingestion filter",
        );
        let discarded_stale = counter(
            &registry,
            "sessions_discarded_stale_total",
            "Sessions discarded for being older than the ingestion window",
        );
        let discarded_short = counter(
            &registry,
            "sessions_discarded_short_total",
            "Sessions discarded for covering less than the minimum distance",
        );
        let discarded_irregular = counter(
            &registry,
            "sessions_discarded_irregular_total",
            "Sessions discarded for irregular sampling",
        );
        Self {
            registry,
            sessions_processed,
            discarded_stale,
            discarded_short,
            discarded_irregular,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let c = IntCounter::with_opts(Opts::new(name, help)).expect("valid counter opts");
    registry
        .register(Box::new(c.clone()))
        .expect("counter registered once");
    c
}
