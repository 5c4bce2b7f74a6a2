// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation for the MetalLB operator.
//!
//! The operator follows the standard controller pattern:
//!
//! 1. **Watch** - Monitor the `MetalLB` resource and the governed
//!    configuration collections via the Kubernetes API
//! 2. **Reconcile** - Render the desired object set from the spec and the
//!    environment-derived chart configuration
//! 3. **Apply** - Create or update the rendered objects and the aggregated
//!    configuration artifact
//!
//! # Available Reconcilers
//!
//! - [`reconcile_metallb`] - Renders and applies the chart for the governing
//!   `MetalLB` resource
//! - [`reconcile_config_map`] - Aggregates the configuration collections
//!   into the config artifact with create/update-if-changed semantics
//!
//! Both are re-entrant across passes; the invoking controller's
//! one-work-item-at-a-time contract serializes concurrent passes on the same
//! resource. Neither takes locks or retries internally.

pub mod configmap;
pub mod metallb;
pub mod resources;


pub use configmap::{reconcile_config_map, ConfigMapOutcome};
pub use metallb::reconcile_metallb;
