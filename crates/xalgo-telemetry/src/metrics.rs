//! Prometheus metrics for order execution.
//!
//! Covers the submission pipeline end to end:
//! - Orders submitted and orders abandoned before submission
//! - Tick size fallbacks (limit prices left off the grid)
//! - Quote wait latency
//! - Re-prices and final order states
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which must crash at startup rather than fail
//! silently. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge,
};

/// Broker orders handed to the gateway and accepted.
/// Labels: instrument, order_type (market/limit/stop_loss)
pub static ORDERS_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xalgo_orders_submitted_total",
        "Broker orders accepted by the gateway",
        &["instrument", "order_type"]
    )
    .unwrap()
});

/// Submission attempts that ended without a live order.
/// Labels: reason (no_market_data/submission_rejected)
pub static ORDERS_NOT_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xalgo_orders_not_submitted_total",
        "Submission attempts that produced no order",
        &["reason"]
    )
    .unwrap()
});

/// Limit prices submitted unrounded because the tick size was unknown.
pub static TICK_SIZE_FALLBACK_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xalgo_tick_size_fallback_total",
        "Limit prices left unrounded for lack of a tick size",
        &["instrument"]
    )
    .unwrap()
});

/// Final state of managed orders.
/// Labels: state (filled/cancelled/rejected/unresolved)
pub static ORDERS_COMPLETED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xalgo_orders_completed_total",
        "Managed orders by final state",
        &["state"]
    )
    .unwrap()
});

/// Cancel/replace re-prices issued by algorithms.
pub static REPRICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xalgo_reprices_total",
        "Limit price modifications issued by algorithms",
        &["algo"]
    )
    .unwrap()
});

/// Time spent waiting for a two-sided quote before pricing.
pub static QUOTE_WAIT_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "xalgo_quote_wait_ms",
        "Wait for a valid quote in milliseconds",
        &["instrument"],
        vec![0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Orders currently under active management.
pub static ORDERS_MANAGED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "xalgo_orders_managed",
        "Orders currently under active management"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a broker order accepted by the gateway.
    pub fn order_submitted(instrument: &str, order_type: &str) {
        ORDERS_SUBMITTED_TOTAL
            .with_label_values(&[instrument, order_type])
            .inc();
    }

    /// Record a submission attempt that produced no order.
    pub fn order_not_submitted(reason: &str) {
        ORDERS_NOT_SUBMITTED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record an unrounded limit price.
    pub fn tick_size_fallback(instrument: &str) {
        TICK_SIZE_FALLBACK_TOTAL
            .with_label_values(&[instrument])
            .inc();
    }

    /// Record the final state of a managed order.
    pub fn order_completed(state: &str) {
        ORDERS_COMPLETED_TOTAL.with_label_values(&[state]).inc();
    }

    /// Record a re-price.
    pub fn reprice(algo: &str) {
        REPRICES_TOTAL.with_label_values(&[algo]).inc();
    }

    /// Record quote wait latency.
    pub fn quote_wait(instrument: &str, waited_ms: f64) {
        QUOTE_WAIT_MS
            .with_label_values(&[instrument])
            .observe(waited_ms);
    }

    pub fn management_started() {
        ORDERS_MANAGED.inc();
    }

    pub fn management_finished() {
        ORDERS_MANAGED.dec();
    }

    /// Text exposition of every registered metric.
    pub fn gather_text() -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buf = Vec::new();
        if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
