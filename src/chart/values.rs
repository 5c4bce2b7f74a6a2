// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The chart's value tree.
//!
//! The chart package consumes a nested key/value document with three
//! top-level sections: `prometheus`, `controller` and `speaker`. This module
//! builds that document as explicit typed structs and serializes them at the
//! rendering boundary, so every key the templates reference has exactly one
//! producer here.
//!
//! Caller-supplied override values are merged first; the sections built here
//! are inserted afterwards and therefore always win for the keys they cover.

use k8s_openapi::api::core::v1::Toleration;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::chart::config::ChartConfig;
use crate::constants::{CONTROLLER_SERVICE_ACCOUNT, SPEAKER_SERVICE_ACCOUNT};
use crate::crd::{LogLevel, MetalLBSpec};
use crate::errors::RenderError;

/// The complete value tree handed to the template engine.
#[derive(Clone, Debug, Serialize)]
pub struct ChartValues {
    pub prometheus: PrometheusValues,
    pub controller: ControllerValues,
    pub speaker: SpeakerValues,
}

/// `prometheus` section: metrics port and pod monitor gating.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusValues {
    pub metrics_port: u16,
    pub pod_monitor: PodMonitorValues,
}

#[derive(Clone, Debug, Serialize)]
pub struct PodMonitorValues {
    pub enabled: bool,
}

/// An image reference as the chart consumes it.
#[derive(Clone, Debug, Serialize)]
pub struct ImageValues {
    pub repository: String,
    pub tag: String,
}

/// Service-account wiring. The operator manages service accounts out of
/// band, so `create` is always false.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceAccountValues {
    pub create: bool,
    pub name: &'static str,
}

/// Pod-level security context injected on OpenShift only.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContextValues {
    pub run_as_non_root: bool,
}

/// `controller` section.
///
/// On OpenShift a non-root security constraint is injected; on plain
/// Kubernetes no security context key is emitted at all, so the two flavors
/// intentionally render different object shapes.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerValues {
    pub image: ImageValues,
    pub service_account: ServiceAccountValues,
    pub log_level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContextValues>,
}

/// `speaker` section, including the routing-protocol and membership-protocol
/// sub-objects.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerValues {
    pub image: ImageValues,
    pub service_account: ServiceAccountValues,
    pub frr: FrrValues,
    pub memberlist: MemberlistValues,
    pub log_level: LogLevel,
    /// Injected verbatim from the spec; replaces the chart default entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    /// Injected verbatim from the spec; replaces the chart default entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,
}

/// Routing-protocol (FRR) sub-object.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrrValues {
    pub enabled: bool,
    pub image: ImageValues,
    pub metrics_port: u16,
}

/// Membership-protocol (memberlist) sub-object.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberlistValues {
    pub enabled: bool,
    pub ml_bind_port: u16,
}

impl From<&crate::chart::config::ImageInfo> for ImageValues {
    fn from(info: &crate::chart::config::ImageInfo) -> Self {
        ImageValues {
            repository: info.repo.clone(),
            tag: info.tag.clone(),
        }
    }
}

impl ChartValues {
    /// Assemble the value tree from the chart configuration and the custom
    /// resource spec.
    #[must_use]
    pub fn new(config: &ChartConfig, spec: &MetalLBSpec) -> ChartValues {
        let log_level = spec.log_level.unwrap_or_default();

        let security_context = config.is_openshift.then_some(SecurityContextValues {
            run_as_non_root: true,
        });

        ChartValues {
            prometheus: PrometheusValues {
                metrics_port: config.metrics_port,
                pod_monitor: PodMonitorValues {
                    enabled: config.enable_pod_monitor,
                },
            },
            controller: ControllerValues {
                image: (&config.controller_image).into(),
                service_account: ServiceAccountValues {
                    create: false,
                    name: CONTROLLER_SERVICE_ACCOUNT,
                },
                log_level,
                security_context,
            },
            speaker: SpeakerValues {
                image: (&config.speaker_image).into(),
                service_account: ServiceAccountValues {
                    create: false,
                    name: SPEAKER_SERVICE_ACCOUNT,
                },
                frr: FrrValues {
                    enabled: config.is_frr_enabled,
                    image: (&config.frr_image).into(),
                    metrics_port: config.frr_metrics_port,
                },
                memberlist: MemberlistValues {
                    enabled: true,
                    ml_bind_port: config.ml_bind_port,
                },
                log_level,
                node_selector: spec.speaker_node_selector.clone(),
                tolerations: spec.speaker_tolerations.clone(),
            },
        }
    }

    /// Merge this tree over caller-supplied override values.
    ///
    /// Overrides come first; the sections built here are inserted on top, so
    /// code-driven values always win for the top-level keys they share.
    /// Override keys outside those sections pass through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Values`] if the tree fails to serialize.
    pub fn merged_with_overrides(
        &self,
        overrides: &Map<String, Value>,
    ) -> Result<Map<String, Value>, RenderError> {
        let mut merged = overrides.clone();
        let tree = serde_json::to_value(self)?;
        if let Value::Object(sections) = tree {
            for (key, value) in sections {
                merged.insert(key, value);
            }
        }
        Ok(merged)
    }
}
