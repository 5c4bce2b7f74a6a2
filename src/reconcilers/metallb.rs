// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of the `MetalLB` custom resource.
//!
//! One pass: load the per-pass chart configuration from the environment and
//! the capability probe, render and patch the chart, apply every rendered
//! object, then reconcile the aggregated configuration artifact. Everything
//! is synchronous with respect to the pass; there is no internal parallelism
//! and the invoking controller serializes passes per resource.

use anyhow::{Context as _, Result};
use kube::ResourceExt;
use serde_json::Map;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chart::config::ChartConfig;
use crate::chart::MetalLBChart;
use crate::constants::{DEFAULT_METALLB_CR_NAME, FIELD_MANAGER, OPERATOR_NAMESPACE};
use crate::context::Context;
use crate::crd::MetalLB;
use crate::metrics::record_configmap_outcome;
use crate::reconcilers::configmap::reconcile_config_map;
use crate::reconcilers::resources::create_or_update_dynamic;

/// Reconcile one `MetalLB` resource.
///
/// Resources not named `metallb` are ignored with a warning; a second
/// installation in the same cluster is not supported and acting on it would
/// fight the governed one.
///
/// # Errors
///
/// Returns an error when configuration loading, rendering, patching, or any
/// store operation fails; the controller's error policy requeues the pass.
pub async fn reconcile_metallb(ctx: Arc<Context>, metallb: Arc<MetalLB>) -> Result<()> {
    let name = metallb.name_any();
    if name != DEFAULT_METALLB_CR_NAME {
        warn!(
            name = %name,
            "Ignoring MetalLB resource; only the resource named {} is reconciled",
            DEFAULT_METALLB_CR_NAME
        );
        return Ok(());
    }

    let namespace = metallb
        .namespace()
        .unwrap_or_else(|| OPERATOR_NAMESPACE.to_string());
    debug!(namespace = %namespace, "Reconciling MetalLB resource");

    let chart_config = ChartConfig::load(&ctx.client, ctx.platform.is_openshift())
        .await
        .context("failed to load chart configuration")?;
    let chart = MetalLBChart::new(&namespace, chart_config).context("failed to load chart")?;

    let objects = chart
        .get_objects(&metallb, &Map::new())
        .context("failed to render chart objects")?;
    info!(
        namespace = %namespace,
        objects = objects.len(),
        "Applying rendered chart objects"
    );

    // All patching happened above; from here on each object is a single
    // atomic store call.
    for obj in &objects {
        create_or_update_dynamic(&ctx.client, obj, FIELD_MANAGER).await?;
    }

    let outcome = reconcile_config_map(&ctx.client, &namespace).await?;
    record_configmap_outcome(outcome);
    debug!(outcome = outcome.as_str(), "Configuration configmap reconciled");

    Ok(())
}
