//! Prometheus counters for fetch handling.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::worker::strategy::{FetchOutcome, Strategy};

pub struct Metrics {
    registry: Registry,
    responses: IntCounterVec,
    failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let responses = IntCounterVec::new(
            Opts::new(
                "offline_worker_responses_total",
                "Fetch events answered, by strategy and response source",
            ),
            &["strategy", "source"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "offline_worker_fetch_failures_total",
                "Fetch events that produced no response, by strategy",
            ),
            &["strategy"],
        )?;

        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            responses,
            failures,
        })
    }

    pub fn record(&self, outcome: &FetchOutcome) {
        self.responses
            .with_label_values(&[outcome.strategy.as_str(), outcome.source.as_str()])
            .inc();
    }

    pub fn record_failure(&self, strategy: Strategy) {
        self.failures.with_label_values(&[strategy.as_str()]).inc();
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::request::Response;
    use crate::worker::strategy::ResponseSource;

    #[test]
    fn test_render_counts() {
        let metrics = Metrics::new().unwrap();
        let outcome = FetchOutcome {
            response: Response::ok("x"),
            source: ResponseSource::Cache,
            strategy: Strategy::ImageCacheFirst,
        };
        metrics.record(&outcome);
        metrics.record(&outcome);
        metrics.record_failure(Strategy::NetworkFirst);

        let text = metrics.render();
        assert!(text.contains(
            r#"offline_worker_responses_total{source="cache",strategy="image_cache_first"} 2"#
        ));
        assert!(text.contains(r#"offline_worker_fetch_failures_total{strategy="network_first"} 1"#));
    }
}
