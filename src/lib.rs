// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # MetalLB Operator for Kubernetes
//!
//! A Kubernetes operator written in Rust that manages MetalLB installations
//! through Custom Resource Definitions (CRDs).
//!
//! ## Overview
//!
//! This library provides the reconciliation core of the operator:
//!
//! - Custom Resource Definitions for the `MetalLB` resource and the governed
//!   configuration collections (address pools, BGP peers, BFD profiles)
//! - Chart rendering: the embedded template package executed against
//!   environment-derived and resource-derived parameters
//! - Structural patching of rendered objects for the fields the template
//!   engine cannot express
//! - Create/update-if-changed reconciliation of the aggregated configuration
//!   artifact, including its ownership linkage
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`chart`] - Chart configuration, rendering and patching
//! - [`render`] - Rendering of the aggregated configuration document
//! - [`reconcilers`] - Reconciliation logic
//! - [`errors`] - Pipeline error taxonomy
//! - [`context`] - Shared controller context
//!
//! ## Example
//!
//! ```rust,no_run
//! use metallb_operator::crd::{MetalLB, MetalLBSpec, LogLevel};
//!
//! let metallb = MetalLB::new(
//!     "metallb",
//!     MetalLBSpec {
//!         log_level: Some(LogLevel::Debug),
//!         ..Default::default()
//!     },
//! );
//! ```

pub mod chart;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod metrics;
pub mod reconcilers;
pub mod render;

#[cfg(test)]
mod render_tests;
