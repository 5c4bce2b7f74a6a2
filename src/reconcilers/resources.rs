// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Creation and update of rendered chart objects.
//!
//! The chart produces untyped objects of several kinds, so this module works
//! with `Api<DynamicObject>` and derives the API routing from each object's
//! own type metadata. Updates use server-side apply (SSA), which keeps the
//! operation idempotent and lets the API server merge fields owned by other
//! managers.

use anyhow::{anyhow, Context, Result};
use kube::api::{ApiResource, DynamicObject, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use tracing::{debug, info};

/// Create a rendered object, or apply it over the existing one.
///
/// Namespaced objects route through their namespace; objects without one
/// (the cluster-scoped kinds the chart emits) route through the
/// cluster-scoped API.
///
/// # Arguments
///
/// * `client` - Kubernetes API client
/// * `obj` - The rendered object to create or update
/// * `field_manager` - Field manager name for server-side apply
///
/// # Errors
///
/// Returns an error if the object carries no type metadata or no name, or if
/// an API operation fails.
pub async fn create_or_update_dynamic(
    client: &Client,
    obj: &DynamicObject,
    field_manager: &str,
) -> Result<()> {
    let ar = api_resource_for(obj)?;
    let name = obj
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| anyhow!("rendered object must have a name"))?;

    let api: Api<DynamicObject> = match obj.metadata.namespace.as_deref() {
        Some(namespace) => Api::namespaced_with(client.clone(), namespace, &ar),
        None => Api::all_with(client.clone(), &ar),
    };

    debug!(
        kind = %ar.kind,
        name = %name,
        namespace = ?obj.metadata.namespace,
        "Creating or updating rendered object"
    );

    if api
        .get_opt(name)
        .await
        .with_context(|| format!("failed to look up {} {name}", ar.kind))?
        .is_some()
    {
        api.patch(
            name,
            &PatchParams::apply(field_manager).force(),
            &Patch::Apply(obj),
        )
        .await
        .with_context(|| format!("failed to apply {} {name}", ar.kind))?;
        info!("Updated {} {}", ar.kind, name);
    } else {
        api.create(&PostParams::default(), obj)
            .await
            .with_context(|| format!("failed to create {} {name}", ar.kind))?;
        info!("Created {} {}", ar.kind, name);
    }

    Ok(())
}

/// Build the API routing information from an object's own type metadata.
///
/// # Errors
///
/// Returns an error when the object carries no `apiVersion`/`kind`.
pub fn api_resource_for(obj: &DynamicObject) -> Result<ApiResource> {
    let types = obj
        .types
        .as_ref()
        .ok_or_else(|| anyhow!("rendered object must have apiVersion and kind"))?;

    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };

    Ok(ApiResource {
        group: group.to_string(),
        version: version.to_string(),
        api_version: types.api_version.clone(),
        kind: types.kind.clone(),
        plural: plural_name(&types.kind),
    })
}

/// Naive English pluralization of a kind name, matching how CRD plurals are
/// conventionally derived (`Deployment` -> `deployments`,
/// `PodSecurityPolicy` -> `podsecuritypolicies`).
#[must_use]
pub fn plural_name(kind: &str) -> String {
    let lower = kind.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix('y') {
        format!("{stem}ies")
    } else if lower.ends_with('s') {
        format!("{lower}es")
    } else {
        format!("{lower}s")
    }
}
