//! Node configuration baked in by the build script

use defmt::*;

use cubelink_core::config::NodeConfig;

/// node.toml, validated and postcard-encoded at build time
static NODE_CONFIG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/node_config.bin"));

/// Decode the baked configuration, falling back to defaults
pub fn load() -> NodeConfig {
    match NodeConfig::from_postcard(NODE_CONFIG) {
        Ok(config) => {
            info!(
                "Loaded node config: {}, address {}",
                config.role, config.device_address
            );
            config
        }
        Err(e) => {
            error!("Embedded node config unusable ({}), using defaults", e);
            NodeConfig::default()
        }
    }
}
