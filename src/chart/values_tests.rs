// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `chart/values.rs`

#[cfg(test)]
mod tests {
    use crate::chart::config::{ChartConfig, ImageInfo};
    use crate::chart::values::ChartValues;
    use crate::crd::{LogLevel, MetalLBSpec};
    use serde_json::{json, Map, Value};

    fn test_config() -> ChartConfig {
        ChartConfig {
            is_openshift: false,
            is_frr_enabled: false,
            controller_image: ImageInfo {
                repo: "quay.io/metallb/controller".to_string(),
                tag: "v0.13".to_string(),
            },
            speaker_image: ImageInfo {
                repo: "quay.io/metallb/speaker".to_string(),
                tag: "v0.13".to_string(),
            },
            frr_image: ImageInfo::default(),
            ml_bind_port: 7946,
            frr_metrics_port: 7473,
            metrics_port: 7472,
            enable_pod_monitor: false,
        }
    }

    fn tree(config: &ChartConfig, spec: &MetalLBSpec) -> Value {
        serde_json::to_value(ChartValues::new(config, spec)).unwrap()
    }

    #[test]
    fn test_tree_has_three_top_level_sections() {
        let value = tree(&test_config(), &MetalLBSpec::default());
        let sections = value.as_object().unwrap();
        assert_eq!(sections.len(), 3);
        assert!(sections.contains_key("prometheus"));
        assert!(sections.contains_key("controller"));
        assert!(sections.contains_key("speaker"));
    }

    #[test]
    fn test_prometheus_section() {
        let mut config = test_config();
        config.enable_pod_monitor = true;

        let value = tree(&config, &MetalLBSpec::default());
        assert_eq!(value["prometheus"]["metricsPort"], 7472);
        assert_eq!(value["prometheus"]["podMonitor"]["enabled"], true);
    }

    #[test]
    fn test_controller_section_defaults() {
        let value = tree(&test_config(), &MetalLBSpec::default());
        let controller = &value["controller"];

        assert_eq!(controller["image"]["repository"], "quay.io/metallb/controller");
        assert_eq!(controller["image"]["tag"], "v0.13");
        assert_eq!(controller["serviceAccount"]["create"], false);
        assert_eq!(controller["serviceAccount"]["name"], "controller");
        assert_eq!(controller["logLevel"], "info");
        // No security context key at all outside OpenShift.
        assert!(controller.get("securityContext").is_none());
    }

    #[test]
    fn test_openshift_injects_non_root_constraint() {
        let mut config = test_config();
        config.is_openshift = true;

        let value = tree(&config, &MetalLBSpec::default());
        assert_eq!(
            value["controller"]["securityContext"]["runAsNonRoot"],
            true
        );
    }

    #[test]
    fn test_log_level_resolution() {
        let spec = MetalLBSpec {
            log_level: Some(LogLevel::Debug),
            ..Default::default()
        };

        let value = tree(&test_config(), &spec);
        assert_eq!(value["controller"]["logLevel"], "debug");
        assert_eq!(value["speaker"]["logLevel"], "debug");
    }

    #[test]
    fn test_speaker_sub_objects() {
        let mut config = test_config();
        config.is_frr_enabled = true;
        config.frr_image = ImageInfo {
            repo: "quay.io/frrouting/frr".to_string(),
            tag: "8.4".to_string(),
        };

        let value = tree(&config, &MetalLBSpec::default());
        let speaker = &value["speaker"];

        assert_eq!(speaker["frr"]["enabled"], true);
        assert_eq!(speaker["frr"]["image"]["repository"], "quay.io/frrouting/frr");
        assert_eq!(speaker["frr"]["image"]["tag"], "8.4");
        assert_eq!(speaker["frr"]["metricsPort"], 7473);
        assert_eq!(speaker["memberlist"]["enabled"], true);
        assert_eq!(speaker["memberlist"]["mlBindPort"], 7946);
        assert!(speaker.get("nodeSelector").is_none());
        assert!(speaker.get("tolerations").is_none());
    }

    #[test]
    fn test_spec_node_selector_is_injected_verbatim() {
        let spec = MetalLBSpec {
            speaker_node_selector: Some(
                [("node-role".to_string(), "infra".to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };

        let value = tree(&test_config(), &spec);
        assert_eq!(value["speaker"]["nodeSelector"]["node-role"], "infra");
    }

    #[test]
    fn test_code_values_win_over_caller_overrides() {
        let values = ChartValues::new(&test_config(), &MetalLBSpec::default());

        let mut overrides = Map::new();
        overrides.insert(
            "controller".to_string(),
            json!({"image": {"repository": "evil.example/controller"}}),
        );
        overrides.insert("extra".to_string(), json!({"keep": "me"}));

        let merged = values.merged_with_overrides(&overrides).unwrap();
        assert_eq!(
            merged["controller"]["image"]["repository"],
            "quay.io/metallb/controller"
        );
        // Keys outside the code-driven sections pass through.
        assert_eq!(merged["extra"]["keep"], "me");
    }
}
