// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Structural patching of rendered objects.
//!
//! The template package cannot express everything: it cannot load non-table
//! values such as affinity or resource requirements, and layered chart
//! values can only add fields, never unset one. This module applies those
//! last-mile mutations directly to the rendered objects.
//!
//! Dispatch is by kind and name on the untyped document; a matched workload
//! is converted into its typed `k8s-openapi` shape, mutated, and converted
//! back, so stringly-typed access stays confined to dispatch and to the two
//! OpenShift field overwrites that must ignore the typed schema.
//!
//! Every function here passes unrelated objects through unchanged.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::api::DynamicObject;
use serde_json::{json, Value};

use crate::constants::{
    CONTROLLER_NAME, KIND_DAEMON_SET, KIND_DEPLOYMENT, KIND_SERVICE_MONITOR, SPEAKER_NAME,
};
use crate::crd::MetalLBSpec;
use crate::errors::PatchError;

/// Kind of a rendered object; empty when the document carried none.
#[must_use]
pub fn kind_of(obj: &DynamicObject) -> &str {
    obj.types.as_ref().map_or("", |t| t.kind.as_str())
}

/// Name of a rendered object; empty when the document carried none.
#[must_use]
pub fn name_of(obj: &DynamicObject) -> &str {
    obj.metadata.name.as_deref().unwrap_or("")
}

/// True for the controller workload: kind `Deployment` named `controller`.
#[must_use]
pub fn is_controller_deployment(obj: &DynamicObject) -> bool {
    kind_of(obj) == KIND_DEPLOYMENT && name_of(obj) == CONTROLLER_NAME
}

/// True for the speaker workload: kind `DaemonSet` named `speaker`.
#[must_use]
pub fn is_speaker_daemon_set(obj: &DynamicObject) -> bool {
    kind_of(obj) == KIND_DAEMON_SET && name_of(obj) == SPEAKER_NAME
}

/// True for any monitoring object of kind `ServiceMonitor`.
#[must_use]
pub fn is_service_monitor(obj: &DynamicObject) -> bool {
    kind_of(obj) == KIND_SERVICE_MONITOR
}

/// Apply the spec's controller overrides to the controller Deployment.
///
/// The affinity override replaces the rendered affinity wholesale; the
/// resources override replaces the resources of the container named
/// `controller` only, leaving sibling containers untouched. Objects that are
/// not the controller Deployment pass through unchanged.
///
/// # Errors
///
/// Returns [`PatchError::Conversion`] if the matched object does not
/// round-trip through the typed Deployment shape.
pub fn override_controller_parameters(
    spec: &MetalLBSpec,
    obj: DynamicObject,
) -> Result<DynamicObject, PatchError> {
    let Some(config) = spec.controller_config.as_ref() else {
        return Ok(obj);
    };
    if !is_controller_deployment(&obj) {
        return Ok(obj);
    }

    let mut deployment: Deployment = from_dynamic(&obj)?;
    if let Some(pod_spec) = deployment
        .spec
        .as_mut()
        .and_then(|s| s.template.spec.as_mut())
    {
        if let Some(affinity) = &config.affinity {
            pod_spec.affinity = Some(affinity.clone());
        }
        if let Some(resources) = &config.resources {
            for container in &mut pod_spec.containers {
                if container.name == CONTROLLER_NAME {
                    container.resources = Some(resources.clone());
                }
            }
        }
    }
    to_dynamic(&obj, &deployment)
}

/// Apply the spec's speaker overrides to the speaker DaemonSet.
///
/// Identical rule to [`override_controller_parameters`], targeting the
/// container named `speaker`.
///
/// # Errors
///
/// Returns [`PatchError::Conversion`] if the matched object does not
/// round-trip through the typed DaemonSet shape.
pub fn override_speaker_parameters(
    spec: &MetalLBSpec,
    obj: DynamicObject,
) -> Result<DynamicObject, PatchError> {
    let Some(config) = spec.speaker_config.as_ref() else {
        return Ok(obj);
    };
    if !is_speaker_daemon_set(&obj) {
        return Ok(obj);
    }

    let mut daemon_set: DaemonSet = from_dynamic(&obj)?;
    if let Some(pod_spec) = daemon_set
        .spec
        .as_mut()
        .and_then(|s| s.template.spec.as_mut())
    {
        if let Some(affinity) = &config.affinity {
            pod_spec.affinity = Some(affinity.clone());
        }
        if let Some(resources) = &config.resources {
            for container in &mut pod_spec.containers {
                if container.name == SPEAKER_NAME {
                    container.resources = Some(resources.clone());
                }
            }
        }
    }
    to_dynamic(&obj, &daemon_set)
}

/// Force the pod-level security context of a workload to non-root.
///
/// Chart values are layered on top of the package's own defaults, so a
/// rendered `runAsUser` cannot be unset through values; it has to be
/// overwritten structurally.
///
/// # Errors
///
/// Returns [`PatchError::Structure`] if `spec.template.spec` runs through a
/// non-mapping value.
pub fn force_non_root_security_context(obj: &mut DynamicObject) -> Result<(), PatchError> {
    let kind = kind_of(obj).to_string();
    let name = name_of(obj).to_string();

    let mut cursor = &mut obj.data;
    for key in ["spec", "template", "spec"] {
        let map = cursor.as_object_mut().ok_or_else(|| PatchError::Structure {
            kind: kind.clone(),
            name: name.clone(),
            path: "spec.template.spec".to_string(),
        })?;
        cursor = map.entry(key).or_insert_with(|| json!({}));
    }
    let pod_spec = cursor.as_object_mut().ok_or(PatchError::Structure {
        kind,
        name,
        path: "spec.template.spec".to_string(),
    })?;
    pod_spec.insert(
        "securityContext".to_string(),
        json!({ "runAsNonRoot": true }),
    );
    Ok(())
}

/// Disable TLS verification on every endpoint of a `ServiceMonitor`.
///
/// OpenShift's monitoring stack scrapes through a service CA; the rendered
/// monitors must not skip verification. A monitor without `spec.endpoints`
/// indicates the chart package and this patcher have drifted apart, which is
/// an error rather than a skip.
///
/// # Errors
///
/// Returns [`PatchError::MissingEndpoints`] when `spec.endpoints` is absent
/// or not a list.
pub fn set_monitor_tls_fields(obj: &mut DynamicObject) -> Result<(), PatchError> {
    let name = name_of(obj).to_string();

    let endpoints = obj
        .data
        .get_mut("spec")
        .and_then(|spec| spec.get_mut("endpoints"))
        .and_then(Value::as_array_mut)
        .ok_or(PatchError::MissingEndpoints { name })?;

    for endpoint in endpoints {
        if let Some(endpoint) = endpoint.as_object_mut() {
            let tls_config = endpoint
                .entry("tlsConfig")
                .or_insert_with(|| json!({}));
            if let Some(tls_config) = tls_config.as_object_mut() {
                tls_config.insert("insecureSkipVerify".to_string(), Value::Bool(false));
            }
        }
    }
    Ok(())
}

/// Rebuild the full JSON document of a rendered object so it can deserialize
/// into a typed resource.
fn from_dynamic<K: serde::de::DeserializeOwned>(obj: &DynamicObject) -> Result<K, PatchError> {
    let conversion_error = |source| PatchError::Conversion {
        kind: kind_of(obj).to_string(),
        name: name_of(obj).to_string(),
        source,
    };

    let mut doc = obj.data.clone();
    if let Some(map) = doc.as_object_mut() {
        if let Some(types) = &obj.types {
            map.insert("apiVersion".to_string(), json!(types.api_version));
            map.insert("kind".to_string(), json!(types.kind));
        }
        map.insert(
            "metadata".to_string(),
            serde_json::to_value(&obj.metadata).map_err(conversion_error)?,
        );
    }
    serde_json::from_value(doc).map_err(conversion_error)
}

/// Convert a mutated typed resource back into the dynamic shape, keeping the
/// original object's type metadata.
fn to_dynamic<K: serde::Serialize>(
    original: &DynamicObject,
    resource: &K,
) -> Result<DynamicObject, PatchError> {
    let conversion_error = |source| PatchError::Conversion {
        kind: kind_of(original).to_string(),
        name: name_of(original).to_string(),
        source,
    };

    let mut doc = serde_json::to_value(resource).map_err(conversion_error)?;
    if let Some(map) = doc.as_object_mut() {
        if let Some(types) = &original.types {
            map.insert("apiVersion".to_string(), json!(types.api_version));
            map.insert("kind".to_string(), json!(types.kind));
        }
    }
    serde_json::from_value(doc).map_err(conversion_error)
}
