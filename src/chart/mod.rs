// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The MetalLB chart: template rendering and post-render patching.
//!
//! The chart package is embedded at compile time (the template files under
//! `templates/`), executed against the merged value tree from
//! [`values::ChartValues`], and the resulting multi-document stream is parsed
//! into untyped objects. A second pass applies the structural patches the
//! template engine cannot express; see [`patch`].
//!
//! The template variable names (`prometheus.*`, `controller.*`, `speaker.*`)
//! are a contract with the package; this module satisfies it, it does not
//! interpret it.

pub mod config;
pub mod filters;
pub mod patch;
pub mod values;

#[cfg(test)]
mod patch_tests;
#[cfg(test)]
mod values_tests;

use kube::api::DynamicObject;
use minijinja::Environment;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::KIND_POD_SECURITY_POLICY;
use crate::crd::MetalLB;
use crate::errors::{ChartError, RenderError};
use config::ChartConfig;
use values::ChartValues;

// The embedded chart package. Order is the render order.
const TEMPLATES: &[(&str, &str)] = &[
    ("controller.yaml", include_str!("../../templates/controller.yaml")),
    ("speaker.yaml", include_str!("../../templates/speaker.yaml")),
    (
        "service-monitors.yaml",
        include_str!("../../templates/service-monitors.yaml"),
    ),
    (
        "podsecuritypolicy.yaml",
        include_str!("../../templates/podsecuritypolicy.yaml"),
    ),
];

/// The loaded chart plus everything needed to render it for one namespace.
pub struct MetalLBChart {
    namespace: String,
    config: ChartConfig,
    env: Environment<'static>,
}

impl MetalLBChart {
    /// Load the embedded chart package and bind it to a namespace and a
    /// per-pass [`ChartConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Template`] if a template in the package fails
    /// to compile.
    pub fn new(namespace: &str, config: ChartConfig) -> Result<MetalLBChart, RenderError> {
        let mut env = Environment::new();
        env.add_filter("tojson", filters::tojson);
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|source| RenderError::Template {
                    name: (*name).to_string(),
                    source,
                })?;
        }
        Ok(MetalLBChart {
            namespace: namespace.to_string(),
            config,
            env,
        })
    }

    /// The chart configuration this chart renders with.
    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Render the chart for the given custom resource and apply the
    /// structural patch pass.
    ///
    /// `overrides` are caller-supplied chart values merged below the
    /// code-driven sections; pass an empty map when there are none.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] on template execution failure, on a malformed
    /// rendered document, or when a structural patch cannot be applied. All
    /// patching happens before the caller sees any object, so a failure here
    /// never leaves a half-patched set behind.
    pub fn get_objects(
        &self,
        instance: &MetalLB,
        overrides: &Map<String, Value>,
    ) -> Result<Vec<DynamicObject>, ChartError> {
        let chart_values =
            ChartValues::new(&self.config, &instance.spec).merged_with_overrides(overrides)?;

        let mut manifest = String::new();
        for (name, _) in TEMPLATES {
            // Present since new() added every package template.
            let template = self
                .env
                .get_template(name)
                .map_err(|source| RenderError::Template {
                    name: (*name).to_string(),
                    source,
                })?;
            let rendered = template
                .render(&chart_values)
                .map_err(|source| RenderError::Template {
                    name: (*name).to_string(),
                    source,
                })?;
            manifest.push_str(&rendered);
            manifest.push_str("\n---\n");
        }

        let mut objects = parse_manifest(&manifest)?;
        debug!(
            namespace = %self.namespace,
            objects = objects.len(),
            "Rendered chart manifest set"
        );

        for obj in &mut objects {
            // Set namespace explicitly into non cluster-scoped resources; the
            // template engine does not propagate it into every object kind.
            if patch::kind_of(obj) != KIND_POD_SECURITY_POLICY {
                obj.metadata.namespace = Some(self.namespace.clone());
            }
        }

        let mut patched = Vec::with_capacity(objects.len());
        for obj in objects {
            let obj = patch::override_controller_parameters(&instance.spec, obj)?;
            let mut obj = patch::override_speaker_parameters(&instance.spec, obj)?;
            if self.config.is_openshift {
                // Chart values layer on top of the package defaults and
                // cannot unset runAsUser, hence the structural overwrite.
                if patch::is_controller_deployment(&obj) {
                    patch::force_non_root_security_context(&mut obj)?;
                }
                if patch::is_service_monitor(&obj) {
                    patch::set_monitor_tls_fields(&mut obj)?;
                }
            }
            patched.push(obj);
        }
        Ok(patched)
    }
}

/// Parse a rendered multi-document YAML stream into untyped objects.
///
/// A stream that is empty after trimming yields zero objects. Documents that
/// render to nothing (gated templates) are skipped. Any malformed document
/// aborts the whole parse.
///
/// # Errors
///
/// Returns [`RenderError::ManifestParse`] naming the offending manifest text.
pub(crate) fn parse_manifest(manifest: &str) -> Result<Vec<DynamicObject>, RenderError> {
    let mut out = Vec::new();
    // Special case - if the entire stream is whitespace, skip.
    if manifest.trim().is_empty() {
        return Ok(out);
    }

    for document in serde_yaml::Deserializer::from_str(manifest) {
        let value =
            serde_yaml::Value::deserialize(document).map_err(|source| RenderError::ManifestParse {
                manifest: manifest.to_string(),
                source,
            })?;
        if value.is_null() {
            continue;
        }
        let obj: DynamicObject =
            serde_yaml::from_value(value).map_err(|source| RenderError::ManifestParse {
                manifest: manifest.to_string(),
                source,
            })?;
        out.push(obj);
    }
    Ok(out)
}
