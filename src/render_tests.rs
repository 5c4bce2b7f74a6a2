// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `render.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        AddressPool, AddressPoolSpec, BFDProfile, BFDProfileSpec, BGPPeer, BGPPeerSpec,
        PoolProtocol,
    };
    use crate::render::{operator_config_to_config_map, OperatorConfig};

    fn pool(name: &str, addresses: &[&str]) -> AddressPool {
        let mut pool = AddressPool::new(
            name,
            AddressPoolSpec {
                protocol: PoolProtocol::Layer2,
                addresses: addresses.iter().map(ToString::to_string).collect(),
                auto_assign: None,
                avoid_buggy_ips: None,
            },
        );
        pool.metadata.namespace = Some("metallb-system".to_string());
        pool
    }

    fn peer(name: &str, address: &str) -> BGPPeer {
        BGPPeer::new(
            name,
            BGPPeerSpec {
                my_asn: 64500,
                peer_asn: 64501,
                peer_address: address.to_string(),
                peer_port: None,
                hold_time: Some("90s".to_string()),
                router_id: None,
                ebgp_multi_hop: None,
                bfd_profile: None,
            },
        )
    }

    fn profile(name: &str) -> BFDProfile {
        BFDProfile::new(
            name,
            BFDProfileSpec {
                receive_interval: Some(300),
                echo_mode: Some(false),
                ..Default::default()
            },
        )
    }

    fn test_config() -> OperatorConfig {
        OperatorConfig {
            pools: vec![pool("pool-a", &["192.168.10.0/24"])],
            peers: vec![peer("peer-a", "10.0.0.1")],
            bfd_profiles: vec![profile("bfd-a")],
            namespace: "metallb-system".to_string(),
            config_map_name: "config".to_string(),
            data_field: "config".to_string(),
        }
    }

    #[test]
    fn test_configmap_coordinates() {
        let cm = operator_config_to_config_map(&test_config()).unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("config"));
        assert_eq!(cm.metadata.namespace.as_deref(), Some("metallb-system"));
        assert!(cm.metadata.owner_references.is_none());
        assert!(cm.data.as_ref().unwrap().contains_key("config"));
    }

    #[test]
    fn test_document_uses_native_kebab_keys() {
        let cm = operator_config_to_config_map(&test_config()).unwrap();
        let document = &cm.data.as_ref().unwrap()["config"];

        assert!(document.contains("address-pools:"), "{document}");
        assert!(document.contains("protocol: layer2"), "{document}");
        assert!(document.contains("- 192.168.10.0/24"), "{document}");
        assert!(document.contains("peers:"), "{document}");
        assert!(document.contains("my-asn: 64500"), "{document}");
        assert!(document.contains("peer-asn: 64501"), "{document}");
        assert!(document.contains("hold-time: 90s"), "{document}");
        assert!(document.contains("bfd-profiles:"), "{document}");
        assert!(document.contains("receive-interval: 300"), "{document}");
        // Unset optionals never appear.
        assert!(!document.contains("router-id"), "{document}");
        assert!(!document.contains("minimum-ttl"), "{document}");
    }

    #[test]
    fn test_empty_collections_render_empty_sections() {
        let config = OperatorConfig {
            namespace: "metallb-system".to_string(),
            config_map_name: "config".to_string(),
            data_field: "config".to_string(),
            ..Default::default()
        };

        let cm = operator_config_to_config_map(&config).unwrap();
        let document = &cm.data.as_ref().unwrap()["config"];
        assert!(!document.contains("address-pools"), "{document}");
        assert!(!document.contains("peers"), "{document}");
        assert!(!document.contains("bfd-profiles"), "{document}");
    }

    #[test]
    fn test_rendering_is_a_pure_function_of_the_snapshot() {
        let a = operator_config_to_config_map(&test_config()).unwrap();
        let b = operator_config_to_config_map(&test_config()).unwrap();
        assert_eq!(
            a.data.as_ref().unwrap()["config"],
            b.data.as_ref().unwrap()["config"]
        );
    }

    #[test]
    fn test_sorted_inputs_render_in_input_order() {
        let config = OperatorConfig {
            pools: vec![
                pool("a-pool", &["10.0.0.0/24"]),
                pool("b-pool", &["10.0.1.0/24"]),
            ],
            namespace: "metallb-system".to_string(),
            config_map_name: "config".to_string(),
            data_field: "config".to_string(),
            ..Default::default()
        };

        let cm = operator_config_to_config_map(&config).unwrap();
        let document = &cm.data.as_ref().unwrap()["config"];
        let a_index = document.find("a-pool").unwrap();
        let b_index = document.find("b-pool").unwrap();
        assert!(a_index < b_index);
    }
}
