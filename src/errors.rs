// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the render-and-patch pipeline.
//!
//! This module provides specialized error types for:
//! - Environment-derived chart configuration (missing or malformed variables)
//! - Chart template execution and manifest parsing
//! - Structural patching of rendered objects
//!
//! Store (Kubernetes API) failures are not enumerated here; reconcilers wrap
//! them with `anyhow` context at each call site, since the meaning of a
//! failure (and of a not-found response in particular) is call-site specific.

use thiserror::Error;

/// Errors raised while loading the chart configuration from the environment.
///
/// These are fatal to the current reconciliation pass: the operator cannot
/// render anything without a complete image set.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// A mandatory environment variable is absent or empty.
    #[error("{var} env variable must be set")]
    MissingVariable {
        /// Name of the missing environment variable
        var: &'static str,
    },

    /// An optional numeric environment variable is present but does not parse.
    #[error("invalid value {value:?} for {var}: {source}")]
    InvalidValue {
        /// Name of the offending environment variable
        var: &'static str,
        /// The raw value that failed to parse
        value: String,
        /// Underlying parse failure
        source: std::num::ParseIntError,
    },
}

/// Errors raised while rendering the chart into structured objects.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A chart template failed to execute.
    #[error("failed to render chart template {name}: {source}")]
    Template {
        /// Name of the template within the chart package
        name: String,
        /// Underlying template engine error
        #[source]
        source: minijinja::Error,
    },

    /// A document in the rendered multi-document stream is not valid YAML,
    /// or is not a Kubernetes object shape.
    #[error("failed to unmarshal manifest {manifest}: {source}")]
    ManifestParse {
        /// The offending manifest text
        manifest: String,
        /// Underlying decode failure
        #[source]
        source: serde_yaml::Error,
    },

    /// The aggregated operator configuration failed to serialize.
    #[error("failed to serialize operator configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// The typed chart value tree failed to serialize into the template
    /// engine's input shape.
    #[error("failed to serialize chart values: {0}")]
    Values(#[from] serde_json::Error),
}

/// Errors raised by the structural patch pass over rendered objects.
///
/// Any of these indicates a drift between the chart package and the patcher's
/// expectations, not a transient condition; they are fatal and never skipped.
#[derive(Error, Debug)]
pub enum PatchError {
    /// A `ServiceMonitor` is missing the `spec.endpoints` list the patcher
    /// must mutate.
    #[error("failed to find endpoints in ServiceMonitor {name}")]
    MissingEndpoints {
        /// Name of the offending object
        name: String,
    },

    /// A matched workload object could not round-trip through its typed shape.
    #[error("failed to convert {kind} {name} for patching: {source}")]
    Conversion {
        /// Kind of the offending object
        kind: String,
        /// Name of the offending object
        name: String,
        /// Underlying conversion failure
        #[source]
        source: serde_json::Error,
    },

    /// A field path the patcher must overwrite runs through a non-mapping
    /// value.
    #[error("unexpected non-mapping value at {path} in {kind} {name}")]
    Structure {
        /// Kind of the offending object
        kind: String,
        /// Name of the offending object
        name: String,
        /// Dotted field path that could not be traversed
        path: String,
    },
}

/// Errors surfaced by [`crate::chart::MetalLBChart::get_objects`], covering
/// both pipeline stages.
#[derive(Error, Debug)]
pub enum ChartError {
    /// Rendering the chart failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Patching a rendered object failed.
    #[error(transparent)]
    Patch(#[from] PatchError),
}
