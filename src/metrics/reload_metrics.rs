//! Refresh metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for reloader refreshes.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reload::metrics::ReloadMetrics;
/// use opentelemetry::global;
///
/// let metrics = ReloadMetrics::new(global::meter("hotswap-reload"));
///
/// let timer = metrics.start_refresh();
/// // ... perform refresh ...
/// metrics.record_refresh_success(timer, true);
/// ```
#[derive(Clone)]
pub struct ReloadMetrics {
    refresh_attempts: Counter<u64>,
    refresh_success: Counter<u64>,
    refresh_failures: Counter<u64>,
    refresh_changes: Counter<u64>,
    refresh_duration: Histogram<f64>,
    listener_failures: Counter<u64>,
    data_age_seconds: Gauge<i64>,
    active_listeners: Gauge<i64>,
    last_change: Arc<parking_lot::Mutex<Instant>>,
}

impl ReloadMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let refresh_attempts = meter
            .u64_counter("hotswap_reload.refresh.attempts")
            .with_description("Total number of refresh attempts")
            .build();

        let refresh_success = meter
            .u64_counter("hotswap_reload.refresh.success")
            .with_description("Number of successful refreshes")
            .build();

        let refresh_failures = meter
            .u64_counter("hotswap_reload.refresh.failures")
            .with_description("Number of failed refreshes")
            .build();

        let refresh_changes = meter
            .u64_counter("hotswap_reload.refresh.changes")
            .with_description("Number of refreshes that committed new content")
            .build();

        let refresh_duration = meter
            .f64_histogram("hotswap_reload.refresh.duration")
            .with_description("Duration of refresh attempts in seconds")
            .with_unit("s")
            .build();

        let listener_failures = meter
            .u64_counter("hotswap_reload.listener.failures")
            .with_description("Number of fan-outs aborted by a listener")
            .build();

        let data_age_seconds = meter
            .i64_gauge("hotswap_reload.age")
            .with_description("Time since the content last changed in seconds")
            .with_unit("s")
            .build();

        let active_listeners = meter
            .i64_gauge("hotswap_reload.listeners.active")
            .with_description("Number of registered listeners")
            .build();

        Self {
            refresh_attempts,
            refresh_success,
            refresh_failures,
            refresh_changes,
            refresh_duration,
            listener_failures,
            data_age_seconds,
            active_listeners,
            last_change: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Start a refresh timer.
    ///
    /// Pass the returned `Instant` to `record_refresh_success` or
    /// `record_refresh_failure` when the attempt completes.
    pub fn start_refresh(&self) -> Instant {
        self.refresh_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a successful refresh. `changed` is true if new content was committed.
    pub fn record_refresh_success(&self, start: Instant, changed: bool) {
        self.refresh_success.add(1, &[]);
        self.refresh_duration.record(start.elapsed().as_secs_f64(), &[]);

        if changed {
            self.refresh_changes.add(1, &[]);
            *self.last_change.lock() = Instant::now();
        }
    }

    /// Record a failed refresh.
    pub fn record_refresh_failure(&self, start: Instant) {
        self.refresh_failures.add(1, &[]);
        self.refresh_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a fan-out aborted by a listener error.
    pub fn record_listener_failure(&self) {
        self.listener_failures.add(1, &[]);
    }

    /// Update the number of registered listeners.
    pub fn update_listener_count(&self, count: i64) {
        self.active_listeners.record(count, &[]);
    }

    /// Update the content age metric.
    ///
    /// Called after every refresh attempt so the gauge tracks staleness.
    pub fn update_data_age(&self) {
        let age_secs = self.last_change.lock().elapsed().as_secs() as i64;
        self.data_age_seconds.record(age_secs, &[]);
    }
}
