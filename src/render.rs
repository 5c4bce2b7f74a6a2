// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Rendering of the aggregated operator configuration.
//!
//! Turns an [`OperatorConfig`] snapshot into the MetalLB native
//! configuration document (`address-pools`, `peers`, `bfd-profiles`) and
//! wraps it in the `ConfigMap` the speakers and the controller consume.
//!
//! The document is a pure function of the snapshot: given sorted input, two
//! renders of the same resource set are byte-identical, which is what the
//! reconciler's change detection relies on.

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::crd::{AddressPool, BFDProfile, BGPPeer, PoolProtocol};
use crate::errors::RenderError;

/// The configuration snapshot: the three governed collections, sorted by
/// name, plus the artifact coordinates.
#[derive(Clone, Debug, Default)]
pub struct OperatorConfig {
    /// Address pools, sorted ascending by name
    pub pools: Vec<AddressPool>,
    /// BGP peers, sorted ascending by name
    pub peers: Vec<BGPPeer>,
    /// BFD profiles, sorted ascending by name
    pub bfd_profiles: Vec<BFDProfile>,
    /// Namespace the artifact lives in
    pub namespace: String,
    /// Name of the artifact
    pub config_map_name: String,
    /// Data key the document is stored under
    pub data_field: String,
}

// Serialization views over the CRD specs; MetalLB's own configuration file
// uses kebab-case keys, unlike the camelCase CRD surface.

#[derive(Serialize)]
struct ConfigDocument<'a> {
    #[serde(rename = "address-pools", skip_serializing_if = "Vec::is_empty")]
    address_pools: Vec<PoolEntry<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    peers: Vec<PeerEntry<'a>>,
    #[serde(rename = "bfd-profiles", skip_serializing_if = "Vec::is_empty")]
    bfd_profiles: Vec<BfdEntry>,
}

#[derive(Serialize)]
struct PoolEntry<'a> {
    name: String,
    protocol: PoolProtocol,
    #[serde(rename = "auto-assign", skip_serializing_if = "Option::is_none")]
    auto_assign: Option<bool>,
    #[serde(rename = "avoid-buggy-ips", skip_serializing_if = "Option::is_none")]
    avoid_buggy_ips: Option<bool>,
    addresses: &'a [String],
}

#[derive(Serialize)]
struct PeerEntry<'a> {
    #[serde(rename = "my-asn")]
    my_asn: u32,
    #[serde(rename = "peer-asn")]
    peer_asn: u32,
    #[serde(rename = "peer-address")]
    peer_address: &'a str,
    #[serde(rename = "peer-port", skip_serializing_if = "Option::is_none")]
    peer_port: Option<u16>,
    #[serde(rename = "hold-time", skip_serializing_if = "Option::is_none")]
    hold_time: Option<&'a str>,
    #[serde(rename = "router-id", skip_serializing_if = "Option::is_none")]
    router_id: Option<&'a str>,
    #[serde(rename = "ebgp-multihop", skip_serializing_if = "Option::is_none")]
    ebgp_multi_hop: Option<bool>,
    #[serde(rename = "bfd-profile", skip_serializing_if = "Option::is_none")]
    bfd_profile: Option<&'a str>,
}

#[derive(Serialize)]
struct BfdEntry {
    name: String,
    #[serde(rename = "receive-interval", skip_serializing_if = "Option::is_none")]
    receive_interval: Option<u32>,
    #[serde(rename = "transmit-interval", skip_serializing_if = "Option::is_none")]
    transmit_interval: Option<u32>,
    #[serde(rename = "detect-multiplier", skip_serializing_if = "Option::is_none")]
    detect_multiplier: Option<u32>,
    #[serde(rename = "echo-interval", skip_serializing_if = "Option::is_none")]
    echo_interval: Option<u32>,
    #[serde(rename = "echo-mode", skip_serializing_if = "Option::is_none")]
    echo_mode: Option<bool>,
    #[serde(rename = "passive-mode", skip_serializing_if = "Option::is_none")]
    passive_mode: Option<bool>,
    #[serde(rename = "minimum-ttl", skip_serializing_if = "Option::is_none")]
    minimum_ttl: Option<u32>,
}

/// Render the snapshot into the configuration `ConfigMap`.
///
/// The returned object carries no owner references; the reconciler decides
/// ownership per its create/update state.
///
/// # Errors
///
/// Returns [`RenderError::Config`] if the document fails to serialize.
pub fn operator_config_to_config_map(config: &OperatorConfig) -> Result<ConfigMap, RenderError> {
    let document = ConfigDocument {
        address_pools: config
            .pools
            .iter()
            .map(|pool| PoolEntry {
                name: pool.name_any(),
                protocol: pool.spec.protocol,
                auto_assign: pool.spec.auto_assign,
                avoid_buggy_ips: pool.spec.avoid_buggy_ips,
                addresses: &pool.spec.addresses,
            })
            .collect(),
        peers: config
            .peers
            .iter()
            .map(|peer| PeerEntry {
                my_asn: peer.spec.my_asn,
                peer_asn: peer.spec.peer_asn,
                peer_address: &peer.spec.peer_address,
                peer_port: peer.spec.peer_port,
                hold_time: peer.spec.hold_time.as_deref(),
                router_id: peer.spec.router_id.as_deref(),
                ebgp_multi_hop: peer.spec.ebgp_multi_hop,
                bfd_profile: peer.spec.bfd_profile.as_deref(),
            })
            .collect(),
        bfd_profiles: config
            .bfd_profiles
            .iter()
            .map(|profile| BfdEntry {
                name: profile.name_any(),
                receive_interval: profile.spec.receive_interval,
                transmit_interval: profile.spec.transmit_interval,
                detect_multiplier: profile.spec.detect_multiplier,
                echo_interval: profile.spec.echo_interval,
                echo_mode: profile.spec.echo_mode,
                passive_mode: profile.spec.passive_mode,
                minimum_ttl: profile.spec.minimum_ttl,
            })
            .collect(),
    };

    let rendered = serde_yaml::to_string(&document)?;

    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "metallb".to_string());

    let mut data = BTreeMap::new();
    data.insert(config.data_field.clone(), rendered);

    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(config.config_map_name.clone()),
            namespace: Some(config.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    })
}
