//! Prometheus metrics for the channel filter.
//!
//! - `chanfilter_lines_suppressed_total{direction}` - lines dropped, inbound or outbound
//! - `chanfilter_line_duration_seconds{direction}` - time spent deciding per line
//! - `chanfilter_visibility_changes_total{kind}` - hide/show transitions
//! - `chanfilter_pending_hides_total{outcome}` - deferred hides applied, superseded, dropped
//! - `chanfilter_store_errors_total{error}` - failed store writes
//!
//! Recording is a no-op until [`init`] has run, so library users that do
//! not export metrics pay nothing.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Lines suppressed by direction.
pub static LINES_SUPPRESSED: OnceLock<IntCounterVec> = OnceLock::new();

/// Per-line decision latency by direction.
pub static LINE_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Visibility transitions by kind (hide/show).
pub static VISIBILITY_CHANGES: OnceLock<IntCounterVec> = OnceLock::new();

/// Deferred hides by outcome.
pub static PENDING_HIDES: OnceLock<IntCounterVec> = OnceLock::new();

/// Store write failures by error code.
pub static STORE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Identifiers known to the visibility store.
pub static KNOWN_IDENTIFIERS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    if LINES_SUPPRESSED.get().is_some() {
        return;
    }

    register!(LINES_SUPPRESSED, IntCounterVec::new(Opts::new("chanfilter_lines_suppressed_total", "Lines suppressed by direction"), &["direction"]));
    register!(LINE_LATENCY, HistogramVec::new(
        HistogramOpts::new("chanfilter_line_duration_seconds", "Filter decision latency by direction")
            .buckets(vec![0.000005, 0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01]),
        &["direction"]));
    register!(VISIBILITY_CHANGES, IntCounterVec::new(Opts::new("chanfilter_visibility_changes_total", "Visibility transitions by kind"), &["kind"]));
    register!(PENDING_HIDES, IntCounterVec::new(Opts::new("chanfilter_pending_hides_total", "Deferred hides by outcome"), &["outcome"]));
    register!(STORE_ERRORS, IntCounterVec::new(Opts::new("chanfilter_store_errors_total", "Visibility store write failures"), &["error"]));
    register!(KNOWN_IDENTIFIERS, IntGauge::new("chanfilter_known_identifiers", "Identifiers in the visibility store"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
pub fn record_suppressed(direction: &str) {
    if let Some(c) = LINES_SUPPRESSED.get() {
        c.with_label_values(&[direction]).inc();
    }
}

#[inline]
pub fn record_line(direction: &str, duration_secs: f64) {
    if let Some(h) = LINE_LATENCY.get() {
        h.with_label_values(&[direction]).observe(duration_secs);
    }
}

#[inline]
pub fn record_visibility_change(kind: &str) {
    if let Some(c) = VISIBILITY_CHANGES.get() {
        c.with_label_values(&[kind]).inc();
    }
}

#[inline]
pub fn record_pending_hide(outcome: &str) {
    if let Some(c) = PENDING_HIDES.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_store_error(error: &str) {
    if let Some(c) = STORE_ERRORS.get() {
        c.with_label_values(&[error]).inc();
    }
}

#[inline]
pub fn set_known_identifiers(count: usize) {
    if let Some(g) = KNOWN_IDENTIFIERS.get() {
        g.set(count as i64);
    }
}
