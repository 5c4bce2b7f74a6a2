// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the operator's controller.

use kube::Client;

use crate::chart::config::PlatformFlavor;

/// Context passed to every reconciliation pass.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Platform flavor the operator was started for
    pub platform: PlatformFlavor,
}
