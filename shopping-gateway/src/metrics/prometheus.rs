use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus metrics for the submission endpoint.
///
/// Thread-safe registry tracking submission outcomes and webhook delivery.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Submission counter: shopping_submissions_total{outcome}
    submissions_total: CounterVec,

    /// Rate limit rejections: shopping_rate_limited_total{client}
    rate_limited_total: CounterVec,

    /// Webhook deliveries: shopping_webhook_deliveries_total{outcome}
    webhook_deliveries_total: CounterVec,

    /// Webhook latency: shopping_webhook_duration_seconds{outcome}
    webhook_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions_total = CounterVec::new(
            Opts::new("shopping_submissions_total", "Submissions by outcome"),
            &["outcome"],
        )?;

        let rate_limited_total = CounterVec::new(
            Opts::new(
                "shopping_rate_limited_total",
                "Submissions rejected by the rate limiter",
            ),
            &["client"],
        )?;

        let webhook_deliveries_total = CounterVec::new(
            Opts::new(
                "shopping_webhook_deliveries_total",
                "Webhook delivery attempts by outcome",
            ),
            &["outcome"],
        )?;

        // Buckets from 10ms up to the 10s delivery timeout
        let webhook_duration = HistogramVec::new(
            HistogramOpts::new(
                "shopping_webhook_duration_seconds",
                "Webhook delivery duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["outcome"],
        )?;

        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(webhook_deliveries_total.clone()))?;
        registry.register(Box::new(webhook_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            submissions_total,
            rate_limited_total,
            webhook_deliveries_total,
            webhook_duration,
        })
    }

    /// Record the final outcome of a submission.
    pub fn record_submission(&self, outcome: &str) {
        self.submissions_total.with_label_values(&[outcome]).inc();
    }

    /// Record a rate limit rejection.
    ///
    /// `anonymous` marks callers that shared the fallback bucket.
    pub fn record_rate_limited(&self, anonymous: bool) {
        let client = if anonymous { "unknown" } else { "identified" };
        self.rate_limited_total.with_label_values(&[client]).inc();
    }

    /// Record a webhook delivery attempt.
    pub fn record_delivery(&self, outcome: &str, duration: Duration) {
        self.webhook_deliveries_total
            .with_label_values(&[outcome])
            .inc();
        self.webhook_duration
            .with_label_values(&[outcome])
            .observe(duration.as_secs_f64());
    }

    /// Current value of a submission counter.
    #[cfg(test)]
    pub fn submissions(&self, outcome: &str) -> u64 {
        self.submissions_total.with_label_values(&[outcome]).get() as u64
    }

    /// Current value of a delivery counter.
    #[cfg(test)]
    pub fn deliveries(&self, outcome: &str) -> u64 {
        self.webhook_deliveries_total
            .with_label_values(&[outcome])
            .get() as u64
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
