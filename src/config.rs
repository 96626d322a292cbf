//! Engine-wide composer configuration.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fragment::Role;

/// Knobs shared by every build, plus the default role bindings materials
/// override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Fraction of the first light's diffuse term that shadows can remove.
    pub shadow_scale: f32,
    pub vertex_lights_count: u16,
    pub fragment_lights_count: u16,
    pub bones_count: u16,
    /// Fragment light loops read their bound from a uniform.
    pub dynamic_lights_count: bool,
    pub clipmap_slices: u16,
    pub layer_count: u16,
    pub default_bindings: BTreeMap<Role, String>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        let default_bindings = Role::ALL
            .iter()
            .filter(|role| **role != Role::Light)
            .map(|role| (*role, "default".to_string()))
            .collect();

        Self {
            shadow_scale: 0.8,
            vertex_lights_count: 4,
            fragment_lights_count: 4,
            bones_count: 72,
            dynamic_lights_count: false,
            clipmap_slices: 4,
            layer_count: 4,
            default_bindings,
        }
    }
}

impl ComposerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse composer config json")
    }

    pub fn default_binding(&self, role: Role) -> Option<&str> {
        self.default_bindings.get(&role).map(String::as_str)
    }

    pub fn set_default_binding(&mut self, role: Role, name: impl Into<String>) {
        self.default_bindings.insert(role, name.into());
    }

    /// Select the shadow technique: rebinds shadow UV, shadow mapping and
    /// shadow map roles together.
    pub fn set_shadow_map_type(&mut self, name: &str) {
        for role in [Role::ShadowUv, Role::ShadowMapping, Role::ShadowMap] {
            self.set_default_binding(role, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComposerConfig::default();
        assert_eq!(config.shadow_scale, 0.8);
        assert_eq!(config.vertex_lights_count, 4);
        assert_eq!(config.fragment_lights_count, 4);
        assert_eq!(config.bones_count, 72);
        assert!(!config.dynamic_lights_count);
        assert_eq!(config.default_binding(Role::DiffuseMapping), Some("default"));
        assert_eq!(config.default_binding(Role::Light), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ComposerConfig::from_json_str(
            r#"{ "fragment_lights_count": 2, "default_bindings": { "light": "blinn_phong" } }"#,
        )
        .unwrap();
        assert_eq!(config.fragment_lights_count, 2);
        assert_eq!(config.vertex_lights_count, 4);
        assert_eq!(config.default_binding(Role::Light), Some("blinn_phong"));
        assert_eq!(config.default_binding(Role::Uv), None);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = ComposerConfig::from_json_str(r#"{ "default_bindings": { "lighting": "x" } }"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("unknown role symbol 'lighting'"));
    }

    #[test]
    fn test_shadow_map_type_rebinds_all_shadow_roles() {
        let mut config = ComposerConfig::default();
        config.set_shadow_map_type("pcf");
        assert_eq!(config.default_binding(Role::ShadowUv), Some("pcf"));
        assert_eq!(config.default_binding(Role::ShadowMapping), Some("pcf"));
        assert_eq!(config.default_binding(Role::ShadowMap), Some("pcf"));
        assert_eq!(config.default_binding(Role::Fog), Some("default"));
    }
}
