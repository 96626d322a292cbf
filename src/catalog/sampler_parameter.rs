use crate::catalog::impl_parameter_catalog;
use crate::symbol::symbol_table;
use crate::types::{SizeClass, Value, ValueType};

symbol_table! {
    /// Sampler uniforms. Each is bound to the texture unit equal to its index.
    pub enum SamplerParameter in "sampler parameter" {
        AlbedoSampler0 => "albedo_sampler_0",
        AlbedoSampler1 => "albedo_sampler_1",
        AlbedoSampler2 => "albedo_sampler_2",
        AlbedoSampler3 => "albedo_sampler_3",
        NormalSampler => "normal_sampler",
        SpecularSampler => "specular_sampler",
        EmissionSampler => "emission_sampler",
        BlendSampler => "blend_sampler",
        VertexVectorSampler => "vertex_vector_sampler",
        VertexNormalSampler => "vertex_normal_sampler",
        VertexDudvSampler => "vertex_dudv_sampler",
        LightPositionsSampler => "light_positions_sampler",
        LightColorsSampler => "light_colors_sampler",
        LightIndicesSampler => "light_indices_sampler",
        ColorCorrectionSampler => "color_correction_sampler",
        ShadowSampler => "shadow_sampler",
    }
}

impl SamplerParameter {
    pub fn texture_unit(self) -> i32 {
        self.index() as i32
    }

    /// Default uniform value for a sampler declared with `value_type`.
    ///
    /// Returns `None` when `value_type` is not a sampler type.
    pub fn default_value(self, value_type: ValueType) -> Option<Value> {
        match value_type {
            ValueType::Sampler(kind) => Some(Value::Sampler {
                kind,
                unit: self.texture_unit(),
            }),
            ValueType::Data(_) => None,
        }
    }

    fn layout(self) -> (ValueType, SizeClass, u16) {
        (ValueType::SAMPLER_2D, SizeClass::One, 1)
    }
}

impl_parameter_catalog!(SamplerParameter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SamplerKind;

    #[test]
    fn test_texture_units_follow_table_order() {
        assert_eq!(SamplerParameter::AlbedoSampler0.texture_unit(), 0);
        assert_eq!(SamplerParameter::NormalSampler.texture_unit(), 4);
        assert_eq!(SamplerParameter::ShadowSampler.texture_unit(), 15);
    }

    #[test]
    fn test_default_value_keeps_declared_kind() {
        let value = SamplerParameter::ShadowSampler
            .default_value(ValueType::Sampler(SamplerKind::Sampler2DArrayShadow));
        assert_eq!(
            value,
            Some(Value::Sampler {
                kind: SamplerKind::Sampler2DArrayShadow,
                unit: 15
            })
        );
        assert_eq!(SamplerParameter::BlendSampler.default_value(ValueType::VEC4), None);
    }
}
