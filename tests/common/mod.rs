#![allow(dead_code)]

use std::path::PathBuf;

use shader_source_forge::{
    BuildRequest, BuildTarget, ComposerConfig, Dialect, FragmentRegistry, MaterialDescription,
    Purpose, parse_fragment_definitions,
};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Registry holding every fragment of `standard_fragments.json`.
pub fn standard_registry() -> FragmentRegistry {
    let path = fixture_path("standard_fragments.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    let definitions = parse_fragment_definitions(&json).expect("parse standard fragments");

    let mut registry = FragmentRegistry::new();
    let rejected = registry.register_definitions(definitions);
    assert!(rejected.is_empty(), "rejected fixture fragments: {rejected:?}");
    registry
}

pub fn config_with_lights(vertex: u16, fragment: u16) -> ComposerConfig {
    ComposerConfig {
        vertex_lights_count: vertex,
        fragment_lights_count: fragment,
        ..ComposerConfig::default()
    }
}

pub fn lit(name: &str) -> MaterialDescription {
    MaterialDescription::new(name).with_lighting("blinn_phong")
}

pub fn color_target(dialect: Dialect, lights: u16) -> BuildTarget {
    BuildTarget::new(dialect, Purpose::Color).with_lights(lights)
}

pub fn resolve(config: &ComposerConfig, material: &MaterialDescription, target: BuildTarget) -> BuildRequest {
    BuildRequest::resolve(config, material, &target)
}
