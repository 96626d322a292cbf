use crate::catalog::impl_parameter_catalog;
use crate::symbol::symbol_table;
use crate::types::{SizeClass, ValueType};

symbol_table! {
    /// Engine-supplied uniforms.
    pub enum AutoParameter in "auto parameter" {
        WorldTransformation => "world_transformation",
        ViewRotationMatrix => "view_rotation_matrix",
        ViewMatrix => "view_matrix",
        ProjectionMatrix => "projection_matrix",
        ProjectionViewMatrix => "projection_view_matrix",
        ReflectionMatrix => "reflection_matrix",
        ShadowTextureMatrices => "shadow_texture_matrices",
        LightPositions => "light_positions",
        LightColors => "light_colors",
        /// Sky color in `[0]`, ground color in `[1]`.
        SkyGroundHemispheres => "sky_ground_hemispheres",
        /// `ivec3(vertex, fragment, total)` light counts.
        DynamicLightsCount => "dynamic_lights_count",
        Bones => "bones",
        Time => "time",
        FogData => "fog_data",
        Camera => "camera",
        ShadowDistanceTransform => "shadow_distance_transform",
        SplitDistances => "split_distances",
        Layers => "layers",
        TextureMatrices => "texture_matrices",
        AlbedoScaleOffsets => "albedo_scale_offsets",
        EmissionScaleOffset => "emission_scale_offset",
        SpecularScaleOffset => "specular_scale_offset",
        DudvScale => "dudv_scale",
        BlendSizes => "blend_sizes",
        MaterialColor => "material_color",
        TerrainScale => "terrain_scale",
        TerrainTextureSize => "terrain_texture_size",
        ClipmapMatrices => "clipmap_matrices",
        ZParams => "z_params",
        TerrainLodOffset => "terrain_lod_offset",
        ScreenSize => "screen_size",
    }
}

impl AutoParameter {
    fn layout(self) -> (ValueType, SizeClass, u16) {
        use AutoParameter::*;

        match self {
            WorldTransformation => (ValueType::MAT4X3, SizeClass::One, 1),
            ViewRotationMatrix => (ValueType::MAT3, SizeClass::One, 1),
            ViewMatrix | ProjectionMatrix | ProjectionViewMatrix | ReflectionMatrix => {
                (ValueType::MAT4, SizeClass::One, 1)
            }
            ShadowTextureMatrices => (ValueType::MAT4, SizeClass::ShadowMapCount, 1),
            LightPositions | LightColors => (ValueType::VEC4, SizeClass::LightCount, 1),
            SkyGroundHemispheres => (ValueType::VEC4, SizeClass::One, 2),
            DynamicLightsCount => (ValueType::IVEC3, SizeClass::One, 1),
            Bones => (ValueType::MAT2X4, SizeClass::BoneCount, 1),
            Time => (ValueType::FLOAT, SizeClass::One, 1),
            Layers => (ValueType::IVEC4, SizeClass::LayerCount, 1),
            TextureMatrices => (ValueType::MAT2X3, SizeClass::One, 2),
            AlbedoScaleOffsets => (ValueType::MAT2X4, SizeClass::One, 4),
            EmissionScaleOffset => (ValueType::MAT2X3, SizeClass::One, 1),
            DudvScale => (ValueType::VEC2, SizeClass::One, 1),
            BlendSizes => (ValueType::VEC4, SizeClass::One, 4),
            ClipmapMatrices => (ValueType::MAT2X3, SizeClass::ClipmapSlices, 1),
            FogData | Camera | ShadowDistanceTransform | SplitDistances
            | SpecularScaleOffset | MaterialColor | TerrainScale | TerrainTextureSize
            | ZParams | TerrainLodOffset | ScreenSize => (ValueType::VEC4, SizeClass::One, 1),
        }
    }
}

impl_parameter_catalog!(AutoParameter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParameterCatalog;

    #[test]
    fn test_light_arrays_follow_light_count() {
        for light in [AutoParameter::LightPositions, AutoParameter::LightColors] {
            let descriptor = light.descriptor();
            assert_eq!(descriptor.value_type, ValueType::VEC4);
            assert_eq!(descriptor.size_class, SizeClass::LightCount);
        }
    }

    #[test]
    fn test_hemispheres_are_a_pair() {
        let descriptor = AutoParameter::resolve("sky_ground_hemispheres").unwrap();
        assert_eq!(descriptor.size_class, SizeClass::One);
        assert_eq!(descriptor.array_scale, 2);
    }
}
