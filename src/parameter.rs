//! Typed parameters declared by shader fragments.

use serde::Serialize;

use crate::request::SizeTable;
use crate::types::{Qualifier, SizeClass, ValueType};

/// A named, typed value a fragment reads or writes.
///
/// `source` names the fragment that declared the parameter. It is carried into
/// declarations and error reports and never takes part in compatibility checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub value_type: ValueType,
    pub qualifier: Qualifier,
    pub size_class: SizeClass,
    pub array_scale: u16,
    pub source: String,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            qualifier: Qualifier::In,
            size_class: SizeClass::One,
            array_scale: 1,
            source: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn with_size(mut self, size_class: SizeClass, array_scale: u16) -> Self {
        self.size_class = size_class;
        self.array_scale = array_scale.max(1);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Same shape: value type, size class and scale all match.
    pub fn same_shape(&self, other: &ParameterDescriptor) -> bool {
        self.value_type == other.value_type && self.same_size(other)
    }

    pub fn same_size(&self, other: &ParameterDescriptor) -> bool {
        self.size_class == other.size_class && self.array_scale == other.array_scale
    }

    /// Declared as an array, even when the resolved length happens to be one.
    pub fn is_array(&self) -> bool {
        self.size_class != SizeClass::One || self.array_scale > 1
    }

    pub fn array_size(&self, sizes: &SizeTable) -> u32 {
        u32::from(sizes.get(self.size_class)) * u32::from(self.array_scale)
    }

    /// `type name[size]` without qualifier or terminator.
    pub fn declaration(&self, sizes: &SizeTable) -> String {
        if self.is_array() {
            format!(
                "{} {}[{}]",
                self.value_type,
                self.name,
                self.array_size(sizes)
            )
        } else {
            format!("{} {}", self.value_type, self.name)
        }
    }

    /// Human readable shape, used in conflict reports.
    pub fn signature(&self) -> String {
        let mut out = format!("{} {}", self.qualifier, self.value_type);
        if self.size_class != SizeClass::One {
            out.push_str(&format!("[{}", self.size_class));
            if self.array_scale > 1 {
                out.push_str(&format!(" * {}", self.array_scale));
            }
            out.push(']');
        } else if self.array_scale > 1 {
            out.push_str(&format!("[{}]", self.array_scale));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AutoParameter, CommonParameter, ParameterCatalog};

    fn sizes() -> SizeTable {
        SizeTable::from_counts(&[(SizeClass::LightCount, 5), (SizeClass::ShadowMapCount, 2)])
    }

    #[test]
    fn test_declaration_of_scalar() {
        let world_position = CommonParameter::WorldPosition.descriptor();
        assert_eq!(world_position.declaration(&sizes()), "vec3 world_position");
    }

    #[test]
    fn test_declaration_of_sized_arrays() {
        let lights = AutoParameter::LightPositions.descriptor();
        assert_eq!(lights.declaration(&sizes()), "vec4 light_positions[5]");

        let hemispheres = AutoParameter::SkyGroundHemispheres.descriptor();
        assert_eq!(hemispheres.declaration(&sizes()), "vec4 sky_ground_hemispheres[2]");
    }

    #[test]
    fn test_zero_count_declares_one_element() {
        let no_bones = SizeTable::from_counts(&[(SizeClass::BoneCount, 0)]);
        let bones = AutoParameter::Bones.descriptor();
        assert_eq!(bones.declaration(&no_bones), "mat2x4 bones[1]");
    }

    #[test]
    fn test_signature_mentions_size_class() {
        let uvs = CommonParameter::ShadowUvs
            .descriptor()
            .with_qualifier(Qualifier::Out);
        assert_eq!(uvs.signature(), "out vec4[shadow_maps]");
        assert_eq!(
            AutoParameter::BlendSizes.descriptor().signature(),
            "in vec4[4]"
        );
    }

    #[test]
    fn test_source_is_not_part_of_shape() {
        let a = CommonParameter::Albedo.descriptor().with_source("diffuse_mapping");
        let b = CommonParameter::Albedo.descriptor().with_source("alpha_test");
        assert!(a.same_shape(&b));
        assert_ne!(a, b);
    }
}
