//! Build requests: one fully resolved shader permutation.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::ComposerConfig;
use crate::fragment::Role;
use crate::target::{Dialect, PackingMode, Purpose};
use crate::types::SizeClass;

bitflags! {
    /// Boolean features of a permutation.
    ///
    /// The first group comes from the material and target; the second group is
    /// derived by the composer from what the bound fragments read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FeatureFlags: u32 {
        const TRANSPARENT = 1 << 0;
        const ALPHA_TEST = 1 << 1;
        const ALPHA_WRITE = 1 << 2;
        const FOG = 1 << 3;
        const LIGHTING = 1 << 4;
        const DYNAMIC_LIGHTS_COUNT = 1 << 5;

        const VIEW_DIRECTION = 1 << 8;
        const SHADOW_UV_DDX_DDY = 1 << 9;
        const TBN_MATRIX = 1 << 10;
        const VIEW_POSITION = 1 << 11;
        const NORMAL = 1 << 12;
        const TANGENT = 1 << 13;
    }
}

impl FeatureFlags {
    /// Flags the composer derives itself.
    pub const DERIVED: FeatureFlags = FeatureFlags::VIEW_DIRECTION
        .union(FeatureFlags::SHADOW_UV_DDX_DDY)
        .union(FeatureFlags::TBN_MATRIX)
        .union(FeatureFlags::VIEW_POSITION)
        .union(FeatureFlags::NORMAL)
        .union(FeatureFlags::TANGENT);
}

/// Material-level overrides on top of the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDescription {
    pub name: String,
    /// Per-role fragment names, replacing the defaults.
    pub bindings: BTreeMap<Role, String>,
    /// Light model bound to the `light` role. `None` leaves it unlit.
    pub lighting: Option<String>,
    /// Replaces all three world transformation roles.
    pub world_transformation: Option<String>,
    pub transparent: bool,
    #[serde(default = "default_true")]
    pub receives_shadows: bool,
    /// Prefer fragments written for merged texture packing.
    pub merged: bool,
}

fn default_true() -> bool {
    true
}

impl MaterialDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receives_shadows: true,
            ..Self::default()
        }
    }

    pub fn with_lighting(mut self, light: impl Into<String>) -> Self {
        self.lighting = Some(light.into());
        self
    }

    pub fn with_binding(mut self, role: Role, name: impl Into<String>) -> Self {
        self.bindings.insert(role, name.into());
        self
    }
}

/// Per-permutation target knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget {
    pub dialect: Dialect,
    pub purpose: Purpose,
    /// Lights the scene wants; clamped to the configured budget.
    pub lights_count: u16,
    pub shadow_map_count: u16,
    pub fog: bool,
}

impl BuildTarget {
    pub fn new(dialect: Dialect, purpose: Purpose) -> Self {
        Self {
            dialect,
            purpose,
            lights_count: 0,
            shadow_map_count: 0,
            fog: false,
        }
    }

    pub fn with_lights(mut self, lights_count: u16) -> Self {
        self.lights_count = lights_count;
        self
    }

    pub fn with_shadow_maps(mut self, shadow_map_count: u16) -> Self {
        self.shadow_map_count = shadow_map_count;
        self
    }

    pub fn with_fog(mut self, fog: bool) -> Self {
        self.fog = fog;
        self
    }
}

/// Resolved configuration for one permutation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub name: String,
    pub bindings: BTreeMap<Role, String>,
    pub dialect: Dialect,
    pub purpose: Purpose,
    pub packing: PackingMode,
    pub flags: FeatureFlags,
    pub vertex_light_count: u16,
    pub fragment_light_count: u16,
    pub shadow_map_count: u16,
    pub bone_count: u16,
    pub clipmap_slices: u16,
    pub layer_count: u16,
}

impl BuildRequest {
    /// Merge defaults, material overrides and target knobs.
    pub fn resolve(config: &ComposerConfig, material: &MaterialDescription, target: &BuildTarget) -> Self {
        let mut bindings = config.default_bindings.clone();
        if let Some(world) = &material.world_transformation {
            for role in [
                Role::WorldDepthTransformation,
                Role::WorldNormalTransformation,
                Role::WorldTangentTransformation,
            ] {
                bindings.insert(role, world.clone());
            }
        }
        if let Some(lighting) = &material.lighting {
            bindings.insert(Role::Light, lighting.clone());
        }
        bindings.extend(material.bindings.iter().map(|(r, n)| (*r, n.clone())));

        let shadows = material.receives_shadows && target.shadow_map_count > 0;
        if !shadows {
            for role in [Role::ShadowUv, Role::ShadowMapping, Role::ShadowUvDdxDdy] {
                bindings.remove(&role);
            }
        }

        let mut flags = FeatureFlags::empty();
        flags.set(FeatureFlags::TRANSPARENT, material.transparent);
        flags.set(FeatureFlags::ALPHA_TEST, material.transparent);
        flags.set(
            FeatureFlags::ALPHA_WRITE,
            material.transparent && target.purpose == Purpose::Color,
        );
        flags.set(FeatureFlags::FOG, target.fog);
        flags.set(FeatureFlags::LIGHTING, bindings.contains_key(&Role::Light));
        flags.set(FeatureFlags::DYNAMIC_LIGHTS_COUNT, config.dynamic_lights_count);

        let budget = config
            .vertex_lights_count
            .saturating_add(config.fragment_lights_count);
        let (vertex_light_count, fragment_light_count) = clamp_light_counts(
            config.vertex_lights_count,
            config.fragment_lights_count,
            target.lights_count.min(budget),
        );

        Self {
            name: material.name.clone(),
            bindings,
            dialect: target.dialect,
            purpose: target.purpose,
            packing: if material.merged {
                PackingMode::Merged
            } else {
                PackingMode::Default
            },
            flags,
            vertex_light_count,
            fragment_light_count,
            shadow_map_count: if shadows { target.shadow_map_count } else { 0 },
            bone_count: config.bones_count,
            clipmap_slices: config.clipmap_slices,
            layer_count: config.layer_count,
        }
    }

    pub fn light_count(&self) -> u16 {
        self.vertex_light_count
            .saturating_add(self.fragment_light_count)
    }

    pub fn binding(&self, role: Role) -> Option<&str> {
        self.bindings.get(&role).map(String::as_str)
    }

    pub fn has(&self, flag: FeatureFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Per-vertex lighting of the lights the fragment stage does not cover.
    pub fn vertex_lighting(&self) -> bool {
        self.purpose == Purpose::Color
            && self.vertex_light_count > 0
            && self.has(FeatureFlags::LIGHTING)
    }

    pub fn fragment_lighting(&self) -> bool {
        self.purpose == Purpose::Color
            && self.fragment_light_count > 0
            && self.has(FeatureFlags::LIGHTING)
    }

    /// Shadow lookups in the color pass.
    pub fn receives_shadows(&self) -> bool {
        self.shadow_map_count > 0 && self.fragment_lighting()
    }

    pub fn size_table(&self) -> SizeTable {
        SizeTable::from_counts(&[
            (SizeClass::LightCount, self.light_count()),
            (SizeClass::BoneCount, self.bone_count),
            (SizeClass::ShadowMapCount, self.shadow_map_count),
            (SizeClass::LayerCount, self.layer_count),
            (SizeClass::ClipmapSlices, self.clipmap_slices),
        ])
    }
}

/// Split `lights_count` between the stages.
///
/// The fragment stage takes up to its budget first; the vertex stage only
/// handles what is left over, so no light is counted twice.
pub fn clamp_light_counts(vertex: u16, fragment: u16, lights_count: u16) -> (u16, u16) {
    let vertex = vertex.min(lights_count.saturating_sub(fragment));
    let fragment = fragment.min(lights_count);
    (vertex, fragment)
}

/// Integer value of every size class, clamped to `1..=maximum` so arrays are
/// never declared empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeTable {
    sizes: BTreeMap<SizeClass, u16>,
}

impl SizeTable {
    pub fn from_counts(counts: &[(SizeClass, u16)]) -> Self {
        let sizes = counts
            .iter()
            .filter(|(class, _)| *class != SizeClass::One)
            .map(|(class, count)| (*class, (*count).clamp(1, class.maximum())))
            .collect();
        Self { sizes }
    }

    pub fn get(&self, class: SizeClass) -> u16 {
        match class {
            SizeClass::One => 1,
            _ => self.sizes.get(&class).copied().unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_light_counts() {
        assert_eq!(clamp_light_counts(4, 4, 8), (4, 4));
        assert_eq!(clamp_light_counts(4, 4, 5), (1, 4));
        assert_eq!(clamp_light_counts(4, 4, 3), (0, 3));
        assert_eq!(clamp_light_counts(2, 3, 5), (2, 3));
        assert_eq!(clamp_light_counts(2, 3, 0), (0, 0));
    }

    #[test]
    fn test_resolve_applies_material_overrides() {
        let config = ComposerConfig::default();
        let mut material = MaterialDescription::new("rock");
        material.lighting = Some("blinn_phong".to_string());
        material.world_transformation = Some("skinned".to_string());
        material
            .bindings
            .insert(Role::DiffuseMapping, "detail".to_string());

        let target = BuildTarget::new(Dialect::Glsl330, Purpose::Color)
            .with_lights(6)
            .with_shadow_maps(2);
        let request = BuildRequest::resolve(&config, &material, &target);

        assert_eq!(request.binding(Role::Light), Some("blinn_phong"));
        assert_eq!(request.binding(Role::WorldNormalTransformation), Some("skinned"));
        assert_eq!(request.binding(Role::DiffuseMapping), Some("detail"));
        assert_eq!(request.binding(Role::Uv), Some("default"));
        assert_eq!(request.binding(Role::ShadowMapping), Some("default"));
        assert!(request.has(FeatureFlags::LIGHTING));
        assert_eq!((request.vertex_light_count, request.fragment_light_count), (2, 4));
        assert_eq!(request.light_count(), 6);
        assert_eq!(request.shadow_map_count, 2);
    }

    #[test]
    fn test_no_shadow_maps_unbinds_shadow_roles() {
        let config = ComposerConfig::default();
        let material = MaterialDescription::new("rock");
        let target = BuildTarget::new(Dialect::Glsl120, Purpose::Color).with_lights(2);
        let request = BuildRequest::resolve(&config, &material, &target);

        assert_eq!(request.binding(Role::ShadowUv), None);
        assert_eq!(request.binding(Role::ShadowMapping), None);
        assert!(!request.has(FeatureFlags::LIGHTING));
        assert_eq!(request.shadow_map_count, 0);

        let mut material = MaterialDescription::new("glass");
        material.receives_shadows = false;
        let request = BuildRequest::resolve(&config, &material, &target.with_shadow_maps(3));
        assert_eq!(request.binding(Role::ShadowMapping), None);
        assert_eq!(request.shadow_map_count, 0);
    }

    #[test]
    fn test_transparency_flags_by_purpose() {
        let config = ComposerConfig::default();
        let mut material = MaterialDescription::new("leaves");
        material.transparent = true;

        let color = BuildRequest::resolve(&config, &material, &BuildTarget::new(Dialect::Glsl130, Purpose::Color));
        assert!(color.has(FeatureFlags::ALPHA_TEST | FeatureFlags::ALPHA_WRITE));

        let shadow = BuildRequest::resolve(&config, &material, &BuildTarget::new(Dialect::Glsl130, Purpose::Shadow));
        assert!(shadow.has(FeatureFlags::ALPHA_TEST));
        assert!(!shadow.has(FeatureFlags::ALPHA_WRITE));
    }

    #[test]
    fn test_size_table_clamps_to_maximum() {
        let sizes = SizeTable::from_counts(&[(SizeClass::LightCount, 12), (SizeClass::BoneCount, 72)]);
        assert_eq!(sizes.get(SizeClass::LightCount), 8);
        assert_eq!(sizes.get(SizeClass::BoneCount), 72);
        assert_eq!(sizes.get(SizeClass::ShadowMapCount), 1);
        assert_eq!(sizes.get(SizeClass::One), 1);
    }

    #[test]
    fn test_size_table_never_declares_empty_arrays() {
        let sizes = SizeTable::from_counts(&[(SizeClass::BoneCount, 0), (SizeClass::LightCount, 0)]);
        assert_eq!(sizes.get(SizeClass::BoneCount), 1);
        assert_eq!(sizes.get(SizeClass::LightCount), 1);
    }

    #[test]
    fn test_light_count_saturates() {
        let target = BuildTarget::new(Dialect::Glsl330, Purpose::Color).with_lights(4);
        let mut request = BuildRequest::resolve(&ComposerConfig::default(), &MaterialDescription::new("rock"), &target);
        request.vertex_light_count = u16::MAX;
        request.fragment_light_count = u16::MAX;
        assert_eq!(request.light_count(), u16::MAX);
        assert_eq!(request.size_table().get(SizeClass::LightCount), SizeClass::LightCount.maximum());
    }

    #[test]
    fn test_material_json_defaults_receive_shadows() {
        let material: MaterialDescription =
            serde_json::from_str(r#"{ "name": "rock", "bindings": { "uv": "scrolling" } }"#).unwrap();
        assert!(material.receives_shadows);
        assert_eq!(material.bindings.get(&Role::Uv).map(String::as_str), Some("scrolling"));
    }
}
