// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of the aggregated configuration `ConfigMap`.
//!
//! Gathers the three governed collections into a sorted snapshot, renders
//! the configuration document, and reconciles it against the live artifact
//! with create/update-if-changed semantics:
//!
//! - **Create**: artifact absent. The owning `MetalLB` resource is looked up
//!   first; if it is also absent the pass is a benign no-op (an orphaned
//!   artifact would be worse than none), otherwise the artifact is created
//!   with a controller owner reference.
//! - **Unchanged**: artifact present with byte-identical data; no write.
//! - **Update**: artifact present with differing data; the *existing* owner
//!   references are carried forward, never recomputed, so a re-parented
//!   artifact stays re-parented.
//!
//! The sort step is what makes "byte-identical" meaningful: listing order
//! from the API server is not stable between polls, and without the sort
//! every pass would look like a change.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::constants::{
    API_GROUP_VERSION, CONFIG_DATA_FIELD, CONFIG_MAP_NAME, DEFAULT_METALLB_CR_NAME, KIND_METALLB,
};
use crate::crd::{AddressPool, BFDProfile, BGPPeer, MetalLB};
use crate::render::{operator_config_to_config_map, OperatorConfig};

/// Terminal outcome of one configuration reconciliation pass.
///
/// All four variants are success from the control loop's point of view;
/// callers that care (metrics, requeue decisions) can distinguish them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigMapOutcome {
    /// The artifact did not exist and was created
    Created,
    /// The artifact existed with differing data and was updated
    Updated,
    /// The artifact existed with identical data; nothing was written
    Unchanged,
    /// Neither artifact nor owning `MetalLB` resource exist; nothing was
    /// written
    NoOwner,
}

impl ConfigMapOutcome {
    /// Stable label for metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigMapOutcome::Created => "created",
            ConfigMapOutcome::Updated => "updated",
            ConfigMapOutcome::Unchanged => "unchanged",
            ConfigMapOutcome::NoOwner => "no_owner",
        }
    }
}

/// Reconcile the configuration `ConfigMap` in `namespace`.
///
/// # Errors
///
/// Returns an error when a list/get/create/update against the API server
/// fails (other than the not-found conditions handled per call site) or when
/// the snapshot fails to render. No retry happens here; the invoking control
/// loop requeues on error.
pub async fn reconcile_config_map(client: &Client, namespace: &str) -> Result<ConfigMapOutcome> {
    let mut config = operator_config(client)
        .await
        .context("failed to collect configmap data")?;
    config.namespace = namespace.to_string();
    config.config_map_name = CONFIG_MAP_NAME.to_string();
    config.data_field = CONFIG_DATA_FIELD.to_string();

    let mut rendered = operator_config_to_config_map(&config)?;

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    let existing = config_maps
        .get_opt(CONFIG_MAP_NAME)
        .await
        .context("failed to get existing configmap")?;

    let Some(existing) = existing else {
        // Artifact absent: only create it for an existing owner.
        let metallbs: Api<MetalLB> = Api::namespaced(client.clone(), namespace);
        let owner = metallbs
            .get_opt(DEFAULT_METALLB_CR_NAME)
            .await
            .context("failed to get MetalLB resource")?;

        let Some(owner) = owner else {
            info!("not updating configmap because MetalLB resource not found");
            return Ok(ConfigMapOutcome::NoOwner);
        };

        rendered.metadata.owner_references = Some(vec![controller_owner_reference(&owner)]);
        config_maps
            .create(&PostParams::default(), &rendered)
            .await
            .context("failed to create configmap")?;
        info!(namespace = %namespace, "Created configuration configmap");
        return Ok(ConfigMapOutcome::Created);
    };

    // Update path: keep whatever owns the artifact today.
    rendered.metadata.owner_references = existing.metadata.owner_references.clone();
    rendered.metadata.resource_version = existing.metadata.resource_version.clone();

    let existing_data = existing
        .data
        .as_ref()
        .and_then(|data| data.get(CONFIG_DATA_FIELD));
    let rendered_data = rendered
        .data
        .as_ref()
        .and_then(|data| data.get(CONFIG_DATA_FIELD));

    if existing_data == rendered_data {
        debug!("not updating configmap because of no changes");
        return Ok(ConfigMapOutcome::Unchanged);
    }

    config_maps
        .replace(CONFIG_MAP_NAME, &PostParams::default(), &rendered)
        .await
        .context("failed to update configmap")?;
    info!(namespace = %namespace, "Updated configuration configmap");
    Ok(ConfigMapOutcome::Updated)
}

/// Gather the configuration snapshot from the three governed collections.
///
/// A not-found response for a whole collection (its CRD not installed yet)
/// counts as an empty collection. The artifact coordinates are left for the
/// caller to fill in.
///
/// # Errors
///
/// Returns an error for any list failure other than not-found.
pub async fn operator_config(client: &Client) -> Result<OperatorConfig> {
    let pools: Api<AddressPool> = Api::all(client.clone());
    let peers: Api<BGPPeer> = Api::all(client.clone());
    let profiles: Api<BFDProfile> = Api::all(client.clone());

    let mut config = OperatorConfig {
        pools: list_or_empty(&pools, "address pools").await?,
        peers: list_or_empty(&peers, "bgp peers").await?,
        bfd_profiles: list_or_empty(&profiles, "bfd profiles").await?,
        ..Default::default()
    };

    // Sorting makes the result stable in case the api server returns the
    // lists in a different order.
    config.pools = sorted_by_name(config.pools);
    config.peers = sorted_by_name(config.peers);
    config.bfd_profiles = sorted_by_name(config.bfd_profiles);

    Ok(config)
}

/// List a collection, downgrading a not-found response to an empty list.
async fn list_or_empty<K>(api: &Api<K>, what: &str) -> Result<Vec<K>>
where
    K: Clone + DeserializeOwned + std::fmt::Debug,
{
    match api.list(&ListParams::default()).await {
        Ok(list) => Ok(list.items),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(Vec::new()),
        Err(err) => Err(err).with_context(|| format!("failed to fetch {what}")),
    }
}

/// Sort a collection ascending by resource name.
pub(crate) fn sorted_by_name<K: ResourceExt>(mut items: Vec<K>) -> Vec<K> {
    items.sort_by_key(ResourceExt::name_any);
    items
}

/// Build the controller owner reference pointing at the `MetalLB` resource.
#[must_use]
pub fn controller_owner_reference(owner: &MetalLB) -> OwnerReference {
    OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: KIND_METALLB.to_string(),
        name: owner.name_any(),
        uid: owner.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}
