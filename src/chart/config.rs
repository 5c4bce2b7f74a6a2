// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment-derived chart configuration.
//!
//! One [`ChartConfig`] is built per reconciliation pass from process
//! environment variables plus a capability probe against the cluster, and is
//! immutable afterwards. Everything the chart needs that is not carried on
//! the `MetalLB` custom resource comes through here.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{Api, Client};
use tracing::debug;

use crate::constants::{
    BGP_TYPE_FRR, DEFAULT_FRR_METRICS_PORT, DEFAULT_MEMBER_LIST_BIND_PORT, DEFAULT_METRICS_PORT,
    ENV_CONTROLLER_IMAGE, ENV_DEPLOY_PODMONITORS, ENV_FRR_IMAGE, ENV_FRR_METRICS_PORT,
    ENV_MEMBER_LIST_BIND_PORT, ENV_METALLB_BGP_TYPE, ENV_METRICS_PORT, ENV_SPEAKER_IMAGE,
    POD_MONITOR_CRD_NAME,
};
use crate::errors::ConfigError;

/// Which platform the operator is deployed on.
///
/// OpenShift renders a different controller security context and forces
/// additional monitoring fields after rendering; plain Kubernetes leaves the
/// chart output alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlatformFlavor {
    /// Vanilla Kubernetes
    #[default]
    Kubernetes,
    /// OpenShift, with its restricted security-context expectations
    OpenShift,
}

impl PlatformFlavor {
    /// True when running on OpenShift.
    #[must_use]
    pub fn is_openshift(self) -> bool {
        self == PlatformFlavor::OpenShift
    }
}

/// An image reference split into repository and tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageInfo {
    /// Image repository, e.g. `quay.io/metallb/controller`
    pub repo: String,
    /// Image tag; empty when the reference carried none
    pub tag: String,
}

/// Rendering parameters for one reconciliation pass.
#[derive(Clone, Debug, Default)]
pub struct ChartConfig {
    /// Platform flavor toggling security-context and monitoring behavior
    pub is_openshift: bool,
    /// Whether the FRR routing-protocol subsystem is enabled
    pub is_frr_enabled: bool,
    /// Controller image
    pub controller_image: ImageInfo,
    /// Speaker image
    pub speaker_image: ImageInfo,
    /// FRR image; empty unless [`Self::is_frr_enabled`]
    pub frr_image: ImageInfo,
    /// Memberlist bind port
    pub ml_bind_port: u16,
    /// FRR metrics port
    pub frr_metrics_port: u16,
    /// Controller/speaker metrics port
    pub metrics_port: u16,
    /// Whether pod monitors should be rendered
    pub enable_pod_monitor: bool,
}

impl ChartConfig {
    /// Load the chart configuration from the process environment and the
    /// cluster capability probe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a mandatory image variable is absent or a
    /// numeric variable fails to parse. Probe failures are not errors; see
    /// [`pod_monitor_available`].
    pub async fn load(client: &Client, is_openshift: bool) -> Result<ChartConfig, ConfigError> {
        let mut config = Self::from_env(|name| std::env::var(name).ok())?;
        config.is_openshift = is_openshift;
        // We shouldn't spam the api server trying to apply PodMonitors if the
        // resource isn't installed.
        if config.enable_pod_monitor {
            config.enable_pod_monitor = pod_monitor_available(client).await;
        }
        Ok(config)
    }

    /// Build the configuration from an environment lookup.
    ///
    /// The lookup is a parameter so tests can exercise every failure mode
    /// without touching the process environment. [`Self::load`] passes
    /// `std::env::var`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when `CONTROLLER_IMAGE` or
    /// `SPEAKER_IMAGE` is absent, or when `METALLB_BGP_TYPE=frr` without
    /// `FRR_IMAGE`; [`ConfigError::InvalidValue`] when a port variable is
    /// present but not numeric.
    pub fn from_env(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ChartConfig, ConfigError> {
        let mut config = ChartConfig::default();

        let ctrl_image = required_var(&lookup, ENV_CONTROLLER_IMAGE)?;
        config.controller_image = image_name_tag(&ctrl_image);

        let speaker_image = required_var(&lookup, ENV_SPEAKER_IMAGE)?;
        config.speaker_image = image_name_tag(&speaker_image);

        if lookup(ENV_METALLB_BGP_TYPE).as_deref() == Some(BGP_TYPE_FRR) {
            config.is_frr_enabled = true;
            let frr_image = required_var(&lookup, ENV_FRR_IMAGE)?;
            config.frr_image = image_name_tag(&frr_image);
        }

        config.ml_bind_port = port_with_default(
            &lookup,
            ENV_MEMBER_LIST_BIND_PORT,
            DEFAULT_MEMBER_LIST_BIND_PORT,
        )?;
        config.frr_metrics_port =
            port_with_default(&lookup, ENV_FRR_METRICS_PORT, DEFAULT_FRR_METRICS_PORT)?;
        config.metrics_port = port_with_default(&lookup, ENV_METRICS_PORT, DEFAULT_METRICS_PORT)?;

        config.enable_pod_monitor = lookup(ENV_DEPLOY_PODMONITORS).as_deref() == Some("true");

        Ok(config)
    }
}

fn required_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    match lookup(var) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVariable { var }),
    }
}

fn port_with_default(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u16,
) -> Result<u16, ConfigError> {
    match lookup(var) {
        Some(value) if !value.is_empty() => {
            value
                .parse()
                .map_err(|source| ConfigError::InvalidValue { var, value, source })
        }
        _ => Ok(default),
    }
}

/// Split an image reference into repository and tag.
///
/// A reference without a colon yields an empty tag. A reference with more
/// than one colon takes the second segment as the tag.
#[must_use]
pub(crate) fn image_name_tag(value: &str) -> ImageInfo {
    let mut parts = value.split(':');
    let repo = parts.next().unwrap_or_default().to_string();
    let tag = parts.next().unwrap_or_default().to_string();
    ImageInfo { repo, tag }
}

/// Probe whether the `PodMonitor` CRD is installed.
///
/// This is a soft capability check: any failure, including transport errors,
/// counts as "not available" and is never surfaced to the caller.
pub async fn pod_monitor_available(client: &Client) -> bool {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    match crds.get_opt(POD_MONITOR_CRD_NAME).await {
        Ok(found) => found.is_some(),
        Err(err) => {
            debug!(error = %err, "PodMonitor CRD probe failed, treating as unavailable");
            false
        }
    }
}
