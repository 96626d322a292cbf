use crate::catalog::impl_parameter_catalog;
use crate::symbol::symbol_table;
use crate::types::{SizeClass, ValueType};

symbol_table! {
    /// Per-vertex input channels.
    pub enum VertexAttribute in "vertex attribute" {
        Position => "position",
        Normal => "normal",
        Tangent => "tangent",
        Color => "color",
        BoneWeight => "bone_weight",
        BoneIndex => "bone_index",
        ExtraBoneWeight => "extra_bone_weight",
        ExtraBoneIndex => "extra_bone_index",
        TextureCoordinate0 => "texture_coordinate_0",
        TextureCoordinate1 => "texture_coordinate_1",
        MeshIndex => "mesh_index",
        MorphPosition => "morph_position",
        MorphNormal => "morph_normal",
        MorphTangent => "morph_tangent",
        MorphTextureCoordinate0 => "morph_texture_coordinate_0",
        MorphTextureCoordinate1 => "morph_texture_coordinate_1",
    }
}

impl VertexAttribute {
    /// Attribute location the program binder assigns to this semantic.
    pub fn location(self) -> u32 {
        self.index() as u32
    }

    fn layout(self) -> (ValueType, SizeClass, u16) {
        use VertexAttribute::*;

        let value_type = match self {
            Position | Normal | MorphPosition | MorphNormal => ValueType::VEC3,
            TextureCoordinate0 | TextureCoordinate1 | MorphTextureCoordinate0
            | MorphTextureCoordinate1 => ValueType::VEC2,
            MeshIndex => ValueType::FLOAT,
            Tangent | Color | BoneWeight | BoneIndex | ExtraBoneWeight | ExtraBoneIndex
            | MorphTangent => ValueType::VEC4,
        };
        (value_type, SizeClass::One, 1)
    }
}

impl_parameter_catalog!(VertexAttribute);
