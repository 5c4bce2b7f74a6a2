// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the MetalLB operator.
//!
//! This module provides metrics collection with the namespace prefix
//! `metallb_operator_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation operations and their outcomes
//! - **Configuration Metrics** - Track the config artifact's reconcile outcomes
//! - **Error Metrics** - Track error conditions and types
//!
//! # Example
//!
//! ```rust,no_run
//! use metallb_operator::metrics::record_reconciliation_success;
//!
//! // Record a successful reconciliation
//! record_reconciliation_success("MetalLB", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

use crate::reconcilers::ConfigMapOutcome;

/// Namespace prefix for all operator metrics
const METRICS_NAMESPACE: &str = "metallb_operator";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the `/metrics`
/// endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `MetalLB`)
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `MetalLB`)
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Outcomes of configuration configmap reconciliation
///
/// Labels:
/// - `outcome`: `created`, `updated`, `unchanged` or `no_owner`
pub static CONFIGMAP_SYNC_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_configmap_sync_total"),
        "Outcomes of configuration configmap reconciliation",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record a successful reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - How long the reconciliation took
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - How long the reconciliation took before failing
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of one configuration configmap pass
pub fn record_configmap_outcome(outcome: ConfigMapOutcome) {
    CONFIGMAP_SYNC_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        let resource_type = "TestResource";
        record_reconciliation_success(resource_type, Duration::from_millis(500));

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&[resource_type]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_reconciliation_error() {
        let resource_type = "TestResourceError";
        record_reconciliation_error(resource_type, Duration::from_millis(250));

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "error"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_configmap_outcomes() {
        record_configmap_outcome(ConfigMapOutcome::NoOwner);
        let counter = CONFIGMAP_SYNC_TOTAL.with_label_values(&["no_owner"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_reconciliation_success("GatherTest", Duration::from_millis(100));

        let metrics_text = gather_metrics().unwrap();
        assert!(
            metrics_text.contains("metallb_operator"),
            "Metrics should contain namespace prefix"
        );
        assert!(
            metrics_text.contains("reconciliations_total"),
            "Metrics should contain reconciliation counter"
        );
    }
}
