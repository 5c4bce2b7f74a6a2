// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `chart/patch.rs`

#[cfg(test)]
mod tests {
    use crate::chart::patch::{
        force_non_root_security_context, is_controller_deployment, is_speaker_daemon_set,
        override_controller_parameters, override_speaker_parameters, set_monitor_tls_fields,
    };
    use crate::crd::{MetalLBSpec, WorkloadConfig};
    use crate::errors::PatchError;
    use k8s_openapi::api::core::v1::{Affinity, NodeAffinity, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use kube::api::DynamicObject;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn controller_deployment() -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "controller" },
            "spec": {
                "selector": { "matchLabels": { "app": "metallb" } },
                "template": {
                    "metadata": { "labels": { "app": "metallb" } },
                    "spec": {
                        "containers": [
                            { "name": "controller", "image": "quay.io/metallb/controller:v0.13" },
                            { "name": "sidecar", "image": "quay.io/metallb/sidecar:v0.13" }
                        ]
                    }
                }
            }
        }))
        .unwrap()
    }

    fn speaker_daemon_set() -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "DaemonSet",
            "metadata": { "name": "speaker" },
            "spec": {
                "selector": { "matchLabels": { "app": "metallb" } },
                "template": {
                    "metadata": { "labels": { "app": "metallb" } },
                    "spec": {
                        "containers": [
                            { "name": "speaker", "image": "quay.io/metallb/speaker:v0.13" }
                        ]
                    }
                }
            }
        }))
        .unwrap()
    }

    fn service_monitor() -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "monitoring.coreos.com/v1",
            "kind": "ServiceMonitor",
            "metadata": { "name": "speaker-monitor" },
            "spec": {
                "endpoints": [
                    { "port": "monitoring" },
                    { "port": "frrmetrics", "tlsConfig": { "serverName": "speaker" } }
                ]
            }
        }))
        .unwrap()
    }

    fn resources_override() -> ResourceRequirements {
        let mut limits = BTreeMap::new();
        limits.insert("cpu".to_string(), Quantity("100m".to_string()));
        ResourceRequirements {
            limits: Some(limits),
            ..Default::default()
        }
    }

    fn affinity_override() -> Affinity {
        Affinity {
            node_affinity: Some(NodeAffinity::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_dispatch_predicates() {
        assert!(is_controller_deployment(&controller_deployment()));
        assert!(!is_controller_deployment(&speaker_daemon_set()));
        assert!(is_speaker_daemon_set(&speaker_daemon_set()));
    }

    #[test]
    fn test_controller_resources_touch_only_named_container() {
        let spec = MetalLBSpec {
            controller_config: Some(WorkloadConfig {
                affinity: None,
                resources: Some(resources_override()),
            }),
            ..Default::default()
        };

        let patched = override_controller_parameters(&spec, controller_deployment()).unwrap();
        let containers = &patched.data["spec"]["template"]["spec"]["containers"];

        assert_eq!(containers[0]["name"], "controller");
        assert_eq!(containers[0]["resources"]["limits"]["cpu"], "100m");
        // The sibling container is untouched.
        assert_eq!(containers[1]["name"], "sidecar");
        assert!(containers[1]
            .get("resources")
            .map_or(true, |r| r.as_object().is_none_or(|m| m.is_empty())));
    }

    #[test]
    fn test_controller_affinity_replaces_rendered_affinity() {
        let spec = MetalLBSpec {
            controller_config: Some(WorkloadConfig {
                affinity: Some(affinity_override()),
                resources: None,
            }),
            ..Default::default()
        };

        let mut obj = controller_deployment();
        obj.data["spec"]["template"]["spec"]["affinity"] =
            json!({ "podAntiAffinity": { } });

        let patched = override_controller_parameters(&spec, obj).unwrap();
        let affinity = &patched.data["spec"]["template"]["spec"]["affinity"];
        assert!(affinity.get("nodeAffinity").is_some());
        assert!(affinity.get("podAntiAffinity").is_none());
    }

    #[test]
    fn test_controller_override_ignores_unrelated_objects() {
        let spec = MetalLBSpec {
            controller_config: Some(WorkloadConfig {
                affinity: Some(affinity_override()),
                resources: Some(resources_override()),
            }),
            ..Default::default()
        };

        let before = speaker_daemon_set();
        let after = override_controller_parameters(&spec, before.clone()).unwrap();
        assert_eq!(
            serde_json::to_value(&after).unwrap(),
            serde_json::to_value(&before).unwrap()
        );
    }

    #[test]
    fn test_no_override_config_passes_through() {
        let before = controller_deployment();
        let after =
            override_controller_parameters(&MetalLBSpec::default(), before.clone()).unwrap();
        assert_eq!(
            serde_json::to_value(&after).unwrap(),
            serde_json::to_value(&before).unwrap()
        );
    }

    #[test]
    fn test_speaker_resources_override() {
        let spec = MetalLBSpec {
            speaker_config: Some(WorkloadConfig {
                affinity: None,
                resources: Some(resources_override()),
            }),
            ..Default::default()
        };

        let patched = override_speaker_parameters(&spec, speaker_daemon_set()).unwrap();
        let containers = &patched.data["spec"]["template"]["spec"]["containers"];
        assert_eq!(containers[0]["resources"]["limits"]["cpu"], "100m");
    }

    #[test]
    fn test_force_non_root_overwrites_existing_security_context() {
        let mut obj = controller_deployment();
        obj.data["spec"]["template"]["spec"]["securityContext"] =
            json!({ "runAsUser": 1000, "runAsNonRoot": false });

        force_non_root_security_context(&mut obj).unwrap();

        let ctx = &obj.data["spec"]["template"]["spec"]["securityContext"];
        assert_eq!(ctx, &json!({ "runAsNonRoot": true }));
    }

    #[test]
    fn test_force_non_root_rejects_non_mapping_path() {
        let mut obj = controller_deployment();
        obj.data["spec"]["template"] = json!("bogus");

        let err = force_non_root_security_context(&mut obj).unwrap_err();
        assert!(matches!(err, PatchError::Structure { .. }));
    }

    #[test]
    fn test_monitor_tls_verification_disabled_on_every_endpoint() {
        let mut obj = service_monitor();
        set_monitor_tls_fields(&mut obj).unwrap();

        let endpoints = obj.data["spec"]["endpoints"].as_array().unwrap();
        for endpoint in endpoints {
            assert_eq!(endpoint["tlsConfig"]["insecureSkipVerify"], false);
        }
        // Pre-existing tlsConfig fields survive.
        assert_eq!(endpoints[1]["tlsConfig"]["serverName"], "speaker");
    }

    #[test]
    fn test_monitor_without_endpoints_is_an_error() {
        let mut obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "monitoring.coreos.com/v1",
            "kind": "ServiceMonitor",
            "metadata": { "name": "broken-monitor" },
            "spec": { }
        }))
        .unwrap();

        let err = set_monitor_tls_fields(&mut obj).unwrap_err();
        match err {
            PatchError::MissingEndpoints { name } => assert_eq!(name, "broken-monitor"),
            other => panic!("expected MissingEndpoints, got {other:?}"),
        }
    }
}
