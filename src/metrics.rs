use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

pub struct HandshakeMetrics {
    open: Counter<u64>,
    attempts: Counter<u64>,
    failures: Counter<u64>,
    duration: Histogram<u64>,
}

impl HandshakeMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            open: meter.u64_counter("lure_session_socket_open_total").build(),
            attempts: meter.u64_counter("lure_session_handshake_total").build(),
            failures: meter.u64_counter("lure_session_handshake_fail_total").build(),
            duration: meter.u64_histogram("lure_session_handshake_time_ms").build(),
        }
    }

    pub fn record_open(&self) {
        self.open.add(1, &[]);
    }

    pub fn record_attempt(&self, state: &str) {
        self.attempts
            .add(1, &[KeyValue::new("state", state.to_string())]);
    }

    pub fn record_failure(&self, state: &str) {
        self.failures
            .add(1, &[KeyValue::new("state", state.to_string())]);
    }

    pub fn record_duration(&self, elapsed_ms: u64, state: &str) {
        self.duration
            .record(elapsed_ms, &[KeyValue::new("state", state.to_string())]);
    }
}

pub struct CodecMetrics {
    decoded: Counter<u64>,
    passthrough: Counter<u64>,
    failures: Counter<u64>,
}

impl CodecMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            decoded: meter.u64_counter("lure_session_packets_decoded").build(),
            passthrough: meter.u64_counter("lure_session_packets_passthrough").build(),
            failures: meter.u64_counter("lure_session_decode_fail_total").build(),
        }
    }

    pub fn record_decoded(&self, phase: &'static str) {
        self.decoded.add(1, &[KeyValue::new("phase", phase)]);
    }

    pub fn record_passthrough(&self, phase: &'static str) {
        self.passthrough.add(1, &[KeyValue::new("phase", phase)]);
    }

    pub fn record_failure(&self, phase: &'static str) {
        self.failures.add(1, &[KeyValue::new("phase", phase)]);
    }
}

pub struct PluginMetrics {
    requests: Counter<u64>,
    responses: Counter<u64>,
}

impl PluginMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            requests: meter.u64_counter("lure_session_plugin_requests").build(),
            responses: meter.u64_counter("lure_session_plugin_responses").build(),
        }
    }

    pub fn record_request(&self, namespace: &str) {
        self.requests
            .add(1, &[KeyValue::new("namespace", namespace.to_string())]);
    }

    pub fn record_response(&self, success: bool) {
        self.responses.add(1, &[KeyValue::new("success", success)]);
    }
}

pub struct BossBarMetrics {
    replays: Counter<u64>,
    replayed_bars: Counter<u64>,
}

impl BossBarMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            replays: meter.u64_counter("lure_session_bossbar_replays").build(),
            replayed_bars: meter.u64_counter("lure_session_bossbar_replayed").build(),
        }
    }

    pub fn record_replay(&self, bars: u64) {
        self.replays.add(1, &[]);
        self.replayed_bars.add(bars, &[]);
    }
}
