// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the MetalLB operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all MetalLB CRDs
pub const API_GROUP: &str = "metallb.io";

/// API version for all MetalLB CRDs
pub const API_VERSION: &str = "v1beta1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "metallb.io/v1beta1";

/// Kind name for the `MetalLB` resource
pub const KIND_METALLB: &str = "MetalLB";

/// Kind name for the `AddressPool` resource
pub const KIND_ADDRESS_POOL: &str = "AddressPool";

/// Kind name for the `BGPPeer` resource
pub const KIND_BGP_PEER: &str = "BGPPeer";

/// Kind name for the `BFDProfile` resource
pub const KIND_BFD_PROFILE: &str = "BFDProfile";

// ============================================================================
// Rendered Object Kinds
// ============================================================================

/// Kind name of the controller workload in the rendered manifest set
pub const KIND_DEPLOYMENT: &str = "Deployment";

/// Kind name of the speaker workload in the rendered manifest set
pub const KIND_DAEMON_SET: &str = "DaemonSet";

/// Kind name of the monitoring objects patched on OpenShift
pub const KIND_SERVICE_MONITOR: &str = "ServiceMonitor";

/// The only cluster-scoped kind in the rendered manifest set. The namespace
/// injection pass skips it.
pub const KIND_POD_SECURITY_POLICY: &str = "PodSecurityPolicy";

// ============================================================================
// Artifact Constants
// ============================================================================

/// Name of the `ConfigMap` holding the aggregated MetalLB configuration
pub const CONFIG_MAP_NAME: &str = "config";

/// Data key the serialized configuration is stored under
pub const CONFIG_DATA_FIELD: &str = "config";

/// The one `MetalLB` custom resource name this operator reconciles
pub const DEFAULT_METALLB_CR_NAME: &str = "metallb";

/// Namespace the operator manages when none is configured
pub const OPERATOR_NAMESPACE: &str = "metallb-system";

/// Field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "metallb-operator";

// ============================================================================
// Workload Constants
// ============================================================================

/// Name of the controller Deployment and of its managed container
pub const CONTROLLER_NAME: &str = "controller";

/// Name of the speaker DaemonSet and of its managed container
pub const SPEAKER_NAME: &str = "speaker";

/// `ServiceAccount` used by the controller (managed out of band)
pub const CONTROLLER_SERVICE_ACCOUNT: &str = "controller";

/// `ServiceAccount` used by the speaker (managed out of band)
pub const SPEAKER_SERVICE_ACCOUNT: &str = "speaker";

// ============================================================================
// Environment Variables
// ============================================================================

/// Controller image reference (mandatory)
pub const ENV_CONTROLLER_IMAGE: &str = "CONTROLLER_IMAGE";

/// Speaker image reference (mandatory)
pub const ENV_SPEAKER_IMAGE: &str = "SPEAKER_IMAGE";

/// FRR image reference (mandatory when the FRR BGP type is selected)
pub const ENV_FRR_IMAGE: &str = "FRR_IMAGE";

/// Routing-protocol implementation selector
pub const ENV_METALLB_BGP_TYPE: &str = "METALLB_BGP_TYPE";

/// Memberlist bind port override
pub const ENV_MEMBER_LIST_BIND_PORT: &str = "MEMBER_LIST_BIND_PORT";

/// FRR metrics port override
pub const ENV_FRR_METRICS_PORT: &str = "FRR_METRICS_PORT";

/// Speaker/controller metrics port override
pub const ENV_METRICS_PORT: &str = "METRICS_PORT";

/// Opt-in flag for deploying pod monitors
pub const ENV_DEPLOY_PODMONITORS: &str = "DEPLOY_PODMONITORS";

/// `METALLB_BGP_TYPE` value that selects the FRR implementation
pub const BGP_TYPE_FRR: &str = "frr";

// ============================================================================
// Port Defaults
// ============================================================================

/// Default memberlist bind port
pub const DEFAULT_MEMBER_LIST_BIND_PORT: u16 = 7946;

/// Default FRR metrics port
pub const DEFAULT_FRR_METRICS_PORT: u16 = 7473;

/// Default metrics port for controller and speaker
pub const DEFAULT_METRICS_PORT: u16 = 7472;

// ============================================================================
// Capability Probe Constants
// ============================================================================

/// CRD whose presence enables pod monitor deployment
pub const POD_MONITOR_CRD_NAME: &str = "podmonitors.monitoring.coreos.com";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Periodic resync interval for a successfully reconciled resource
pub const RESYNC_PERIOD_SECS: u64 = 300;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
