use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub booking_transitions_total: IntCounterVec,
    pub dispatch_search_latency_seconds: HistogramVec,
    pub location_broadcasts_total: IntCounter,
    pub location_listeners: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let booking_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_transitions_total",
                "Booking transitions by name and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid booking_transitions_total metric");

        let dispatch_search_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "dispatch_search_latency_seconds",
                "Latency of nearby driver searches in seconds",
            ),
            &["variant"],
        )
        .expect("valid dispatch_search_latency_seconds metric");

        let location_broadcasts_total = IntCounter::new(
            "location_broadcasts_total",
            "Location updates fanned out to rooms",
        )
        .expect("valid location_broadcasts_total metric");

        let location_listeners = IntGauge::new(
            "location_listeners",
            "Currently joined location channel connections",
        )
        .expect("valid location_listeners metric");

        registry
            .register(Box::new(booking_transitions_total.clone()))
            .expect("register booking_transitions_total");
        registry
            .register(Box::new(dispatch_search_latency_seconds.clone()))
            .expect("register dispatch_search_latency_seconds");
        registry
            .register(Box::new(location_broadcasts_total.clone()))
            .expect("register location_broadcasts_total");
        registry
            .register(Box::new(location_listeners.clone()))
            .expect("register location_listeners");

        Self {
            registry,
            booking_transitions_total,
            dispatch_search_latency_seconds,
            location_broadcasts_total,
            location_listeners,
        }
    }

    pub fn record_transition(&self, transition: &str, ok: bool) {
        let outcome = if ok { "success" } else { "error" };
        self.booking_transitions_total
            .with_label_values(&[transition, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
