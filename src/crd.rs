// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for MetalLB configuration.
//!
//! This module defines the Kubernetes Custom Resource Definitions the
//! operator consumes. The types are an interface boundary: schema validation
//! and admission are handled by the API server from the generated CRD YAML
//! (see the `crdgen` binary), and the operator treats all of them as
//! read-only declarative input.
//!
//! # Resource Types
//!
//! ## Operator control
//!
//! - [`MetalLB`] - The single resource governing a MetalLB installation;
//!   carries the log level and per-workload scheduling/resource overrides
//!
//! ## Governed configuration collections
//!
//! - [`AddressPool`] - A pool of addresses MetalLB may allocate from
//! - [`BGPPeer`] - A BGP session to establish from each speaker
//! - [`BFDProfile`] - Tunable parameters for BFD-backed sessions
//!
//! # Example: Declaring an address pool
//!
//! ```rust,no_run
//! use metallb_operator::crd::{AddressPoolSpec, PoolProtocol};
//!
//! let spec = AddressPoolSpec {
//!     protocol: PoolProtocol::Layer2,
//!     addresses: vec!["192.168.10.0/24".to_string()],
//!     auto_assign: None,
//!     avoid_buggy_ips: Some(true),
//! };
//! ```

use k8s_openapi::api::core::v1::{Affinity, ResourceRequirements, Toleration};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Log verbosity accepted by the MetalLB workloads.
///
/// Rendered verbatim into the `--log-level` argument of both the controller
/// and the speaker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Log everything
    All,
    /// Debug-level logging
    Debug,
    /// Informational logging (the default)
    #[default]
    Info,
    /// Warnings and errors only
    Warn,
    /// Errors only
    Error,
    /// Disable logging
    None,
}

/// Scheduling and resource overrides for one managed workload.
///
/// Both fields replace what the chart rendered, they are never merged:
/// an affinity override replaces the whole rendered affinity, and a
/// resources override replaces the resources of the managed container only.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadConfig {
    /// Affinity to apply to the workload's pod template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    /// Compute resources for the workload's managed container
    /// (`controller` or `speaker`); sibling containers are untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// `MetalLB` governs one MetalLB installation in the operator's namespace.
///
/// The operator only acts on the instance named `metallb`; any other
/// instance is ignored with a logged warning.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "metallb.io",
    version = "v1beta1",
    kind = "MetalLB",
    namespaced,
    doc = "MetalLB is the top-level resource governing a MetalLB installation. Its presence drives rendering of the controller and speaker workloads and ownership of the aggregated configuration."
)]
#[serde(rename_all = "camelCase")]
pub struct MetalLBSpec {
    /// Log level for the rendered workloads. Defaults to `info` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Node selector injected into the speaker DaemonSet. Replaces the
    /// chart's default selector entirely when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_node_selector: Option<BTreeMap<String, String>>,

    /// Tolerations injected into the speaker DaemonSet. Replaces the
    /// chart's default tolerations entirely when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_tolerations: Option<Vec<Toleration>>,

    /// Overrides applied to the controller Deployment after rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_config: Option<WorkloadConfig>,

    /// Overrides applied to the speaker DaemonSet after rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_config: Option<WorkloadConfig>,
}

/// Address allocation protocol for an [`AddressPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PoolProtocol {
    /// Announce via ARP/NDP from the winning speaker
    Layer2,
    /// Announce via BGP sessions to the configured peers
    Bgp,
}

/// `AddressPool` declares a range of addresses MetalLB may allocate.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "metallb.io",
    version = "v1beta1",
    kind = "AddressPool",
    namespaced,
    doc = "AddressPool declares a set of address ranges MetalLB allocates service IPs from, and the protocol used to announce them."
)]
#[serde(rename_all = "camelCase")]
pub struct AddressPoolSpec {
    /// Protocol used to announce addresses from this pool.
    pub protocol: PoolProtocol,

    /// CIDR ranges (or from-to ranges) belonging to this pool.
    pub addresses: Vec<String>,

    /// Whether addresses may be assigned automatically (defaults to true
    /// on the MetalLB side).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_assign: Option<bool>,

    /// Avoid addresses ending in .0 and .255, which some consumer hardware
    /// drops.
    #[serde(rename = "avoidBuggyIPs", skip_serializing_if = "Option::is_none")]
    pub avoid_buggy_ips: Option<bool>,
}

/// `BGPPeer` declares a BGP session every speaker establishes.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "metallb.io",
    version = "v1beta1",
    kind = "BGPPeer",
    namespaced,
    doc = "BGPPeer declares a BGP router the speakers peer with, including the local and remote AS numbers."
)]
#[serde(rename_all = "camelCase")]
pub struct BGPPeerSpec {
    /// AS number the speakers present.
    #[serde(rename = "myASN")]
    pub my_asn: u32,

    /// AS number expected from the peer.
    #[serde(rename = "peerASN")]
    pub peer_asn: u32,

    /// Address of the peer router.
    pub peer_address: String,

    /// Port to dial on the peer (defaults to 179 on the MetalLB side).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_port: Option<u16>,

    /// BGP hold time, e.g. `"90s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_time: Option<String>,

    /// Router ID to present to the peer.
    #[serde(rename = "routerID", skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,

    /// Allow sessions to peers more than one hop away.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebgp_multi_hop: Option<bool>,

    /// Name of the [`BFDProfile`] backing this session's failure detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bfd_profile: Option<String>,
}

/// `BFDProfile` tunes bidirectional forwarding detection for BGP sessions.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "metallb.io",
    version = "v1beta1",
    kind = "BFDProfile",
    namespaced,
    doc = "BFDProfile carries the timer and mode settings for BFD-backed BGP sessions; BGPPeers reference profiles by name."
)]
#[serde(rename_all = "camelCase")]
pub struct BFDProfileSpec {
    /// Minimum interval, in milliseconds, at which this system can receive
    /// control packets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_interval: Option<u32>,

    /// Minimum transmission interval, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit_interval: Option<u32>,

    /// Number of missed packets after which the session is declared down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detect_multiplier: Option<u32>,

    /// Minimum echo transmission interval, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo_interval: Option<u32>,

    /// Enable echo mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo_mode: Option<bool>,

    /// Do not initiate sessions, only respond.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_mode: Option<bool>,

    /// Minimum expected TTL on received packets, for multi-hop sessions.
    #[serde(rename = "minimumTtl", skip_serializing_if = "Option::is_none")]
    pub minimum_ttl: Option<u32>,
}
