use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

pub struct HandshakeMetrics {
    open: Counter<u64>,
    attempts: Counter<u64>,
    failures: Counter<u64>,
    events: Counter<u64>,
    duration: Histogram<u64>,
}

impl HandshakeMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            open: meter.u64_counter("honeypot_socket_open_total").build(),
            attempts: meter.u64_counter("honeypot_handshake_total").build(),
            failures: meter.u64_counter("honeypot_handshake_fail_total").build(),
            events: meter.u64_counter("honeypot_notify_total").build(),
            duration: meter.u64_histogram("honeypot_session_time_ms").build(),
        }
    }

    pub fn record_open(&self) {
        self.open.add(1, &[]);
    }

    pub fn record_attempt(&self, state: &'static str) {
        self.attempts.add(1, &[KeyValue::new("state", state)]);
    }

    pub fn record_failure(&self, state: &'static str, kind: &'static str) {
        self.failures.add(
            1,
            &[KeyValue::new("state", state), KeyValue::new("kind", kind)],
        );
    }

    pub fn record_event(&self, kind: &'static str) {
        self.events.add(1, &[KeyValue::new("kind", kind)]);
    }

    pub fn record_duration(&self, elapsed_ms: u64, state: &'static str) {
        self.duration
            .record(elapsed_ms, &[KeyValue::new("state", state)]);
    }
}
