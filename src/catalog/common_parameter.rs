use crate::catalog::impl_parameter_catalog;
use crate::symbol::symbol_table;
use crate::types::{SizeClass, ValueType};

symbol_table! {
    /// Values threaded between fragments of one stage or across stages.
    pub enum CommonParameter in "common parameter" {
        DiffuseColor => "diffuse_color",
        SpecularColor => "specular_color",
        Shadow => "shadow",
        LightColor => "light_color",
        LightPosition => "light_position",
        WorldPosition => "world_position",
        WorldNormal => "world_normal",
        WorldTangent => "world_tangent",
        WorldViewDirection => "world_view_direction",
        WorldUv => "world_uv",
        ViewPosition => "view_position",
        Albedo => "albedo",
        Specular => "specular",
        Gloss => "gloss",
        FragmentNormal => "fragment_normal",
        Fog => "fog",
        ShadowUvs => "shadow_uvs",
        ShadowViewDistance => "shadow_view_distance",
        ShadowMapData => "shadow_map_data",
        TbnMatrix => "tbn_matrix",
        Emission => "emission",
        WorldExtraUv => "world_extra_uv",
        TerrainUvs => "terrain_uvs",
        ShadowUvDdxDdy => "shadow_uv_ddx_ddy",
        VertexColor => "vertex_color",
        FragmentColor => "fragment_color",
    }
}

impl CommonParameter {
    fn layout(self) -> (ValueType, SizeClass, u16) {
        use CommonParameter::*;

        match self {
            DiffuseColor | SpecularColor | WorldPosition | WorldNormal | ViewPosition
            | Specular | FragmentNormal | ShadowMapData | Emission | VertexColor
            | FragmentColor => (ValueType::VEC3, SizeClass::One, 1),
            Shadow | Gloss | Fog => (ValueType::FLOAT, SizeClass::One, 1),
            LightColor | LightPosition | WorldTangent | WorldViewDirection | Albedo
            | ShadowViewDistance | ShadowUvDdxDdy => (ValueType::VEC4, SizeClass::One, 1),
            WorldUv | WorldExtraUv => (ValueType::VEC2, SizeClass::One, 1),
            ShadowUvs => (ValueType::VEC4, SizeClass::ShadowMapCount, 1),
            TbnMatrix => (ValueType::MAT3, SizeClass::One, 1),
            TerrainUvs => (ValueType::VEC2, SizeClass::ClipmapSlices, 1),
        }
    }
}

impl_parameter_catalog!(CommonParameter);
