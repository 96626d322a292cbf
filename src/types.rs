//! GLSL value types, qualifiers, size classes and uniform values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ShaderBuildError;
use crate::symbol::symbol_table;

symbol_table! {
    /// Opaque sampler types.
    pub enum SamplerKind in "sampler type" {
        Sampler1D => "sampler1D",
        Sampler2D => "sampler2D",
        Sampler3D => "sampler3D",
        SamplerCube => "samplerCube",
        Sampler1DShadow => "sampler1DShadow",
        Sampler2DShadow => "sampler2DShadow",
        SamplerCubeShadow => "samplerCubeShadow",
        Sampler2DRect => "sampler2DRect",
        Sampler2DRectShadow => "sampler2DRectShadow",
        Sampler1DArray => "sampler1DArray",
        Sampler2DArray => "sampler2DArray",
        Sampler1DArrayShadow => "sampler1DArrayShadow",
        Sampler2DArrayShadow => "sampler2DArrayShadow",
        SamplerBuffer => "samplerBuffer",
        ISampler2D => "isampler2D",
        ISampler2DArray => "isampler2DArray",
        USampler2D => "usampler2D",
        USampler2DArray => "usampler2DArray",
    }
}

impl SamplerKind {
    pub fn is_array(self) -> bool {
        matches!(
            self,
            SamplerKind::Sampler1DArray
                | SamplerKind::Sampler2DArray
                | SamplerKind::Sampler1DArrayShadow
                | SamplerKind::Sampler2DArrayShadow
                | SamplerKind::ISampler2DArray
                | SamplerKind::USampler2DArray
        )
    }

    pub fn is_rect(self) -> bool {
        matches!(
            self,
            SamplerKind::Sampler2DRect | SamplerKind::Sampler2DRectShadow
        )
    }
}

symbol_table! {
    /// Non-opaque GLSL types.
    pub enum DataType in "value type" {
        Bool => "bool",
        BVec2 => "bvec2",
        BVec3 => "bvec3",
        BVec4 => "bvec4",
        Int => "int",
        IVec2 => "ivec2",
        IVec3 => "ivec3",
        IVec4 => "ivec4",
        UInt => "uint",
        UVec2 => "uvec2",
        UVec3 => "uvec3",
        UVec4 => "uvec4",
        Float => "float",
        Vec2 => "vec2",
        Vec3 => "vec3",
        Vec4 => "vec4",
        Mat2 => "mat2",
        Mat2x3 => "mat2x3",
        Mat2x4 => "mat2x4",
        Mat3x2 => "mat3x2",
        Mat3 => "mat3",
        Mat3x4 => "mat3x4",
        Mat4x2 => "mat4x2",
        Mat4x3 => "mat4x3",
        Mat4 => "mat4",
    }
}

/// Type of a parameter: plain data or a sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    Data(DataType),
    Sampler(SamplerKind),
}

impl ValueType {
    pub const BOOL: ValueType = ValueType::Data(DataType::Bool);
    pub const INT: ValueType = ValueType::Data(DataType::Int);
    pub const IVEC3: ValueType = ValueType::Data(DataType::IVec3);
    pub const IVEC4: ValueType = ValueType::Data(DataType::IVec4);
    pub const FLOAT: ValueType = ValueType::Data(DataType::Float);
    pub const VEC2: ValueType = ValueType::Data(DataType::Vec2);
    pub const VEC3: ValueType = ValueType::Data(DataType::Vec3);
    pub const VEC4: ValueType = ValueType::Data(DataType::Vec4);
    pub const MAT2X3: ValueType = ValueType::Data(DataType::Mat2x3);
    pub const MAT2X4: ValueType = ValueType::Data(DataType::Mat2x4);
    pub const MAT3: ValueType = ValueType::Data(DataType::Mat3);
    pub const MAT4X3: ValueType = ValueType::Data(DataType::Mat4x3);
    pub const MAT4: ValueType = ValueType::Data(DataType::Mat4);
    pub const SAMPLER_2D: ValueType = ValueType::Sampler(SamplerKind::Sampler2D);

    /// GLSL spelling.
    pub fn glsl(self) -> &'static str {
        match self {
            ValueType::Data(ty) => ty.as_str(),
            ValueType::Sampler(kind) => kind.as_str(),
        }
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, ValueType::Sampler(_))
    }

    /// Every value type, data types first.
    pub fn all() -> impl Iterator<Item = ValueType> {
        DataType::ALL
            .iter()
            .copied()
            .map(ValueType::Data)
            .chain(SamplerKind::ALL.iter().copied().map(ValueType::Sampler))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl())
    }
}

impl FromStr for ValueType {
    type Err = ShaderBuildError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // "unsigned int" is accepted as an alias for "uint".
        let text = if text == "unsigned int" { "uint" } else { text };
        if let Some(ty) = DataType::from_symbol(text) {
            return Ok(ValueType::Data(ty));
        }
        SamplerKind::from_symbol(text)
            .map(ValueType::Sampler)
            .ok_or_else(|| ShaderBuildError::unknown_symbol(DataType::CATALOG, text))
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.glsl())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

symbol_table! {
    /// Direction of a parameter relative to the fragment body declaring it.
    pub enum Qualifier in "qualifier" {
        In => "in",
        Out => "out",
        InOut => "inout",
    }
}

impl Default for Qualifier {
    fn default() -> Self {
        Qualifier::In
    }
}

symbol_table! {
    /// Array length of a parameter, either one or a runtime-configured count.
    pub enum SizeClass in "size class" {
        One => "one",
        LightCount => "lights",
        BoneCount => "bones",
        ShadowMapCount => "shadow_maps",
        LayerCount => "layers",
        ClipmapSlices => "clipmap_slices",
    }
}

impl SizeClass {
    /// Name of the `const int` emitted for this size, `None` for [`SizeClass::One`].
    pub fn constant_name(self) -> Option<&'static str> {
        match self {
            SizeClass::One => None,
            SizeClass::LightCount => Some("lights_count"),
            SizeClass::BoneCount => Some("bones_count"),
            SizeClass::ShadowMapCount => Some("shadow_maps_count"),
            SizeClass::LayerCount => Some("layers_count"),
            SizeClass::ClipmapSlices => Some("clipmap_slices_count"),
        }
    }

    /// Upper bound the size table clamps to.
    pub fn maximum(self) -> u16 {
        match self {
            SizeClass::One => 1,
            SizeClass::LightCount => 8,
            SizeClass::BoneCount => 80,
            SizeClass::ShadowMapCount => 3,
            SizeClass::LayerCount => 4,
            SizeClass::ClipmapSlices => 8,
        }
    }
}

impl Default for SizeClass {
    fn default() -> Self {
        SizeClass::One
    }
}

/// A uniform value, one variant per value type family.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Bool(bool),
    BVec2([bool; 2]),
    BVec3([bool; 3]),
    BVec4([bool; 4]),
    Int(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    UInt(u32),
    UVec2([u32; 2]),
    UVec3([u32; 3]),
    UVec4([u32; 4]),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat2x3([f32; 6]),
    Mat2x4([f32; 8]),
    Mat3x2([f32; 6]),
    Mat3([f32; 9]),
    Mat3x4([f32; 12]),
    Mat4x2([f32; 8]),
    Mat4x3([f32; 12]),
    Mat4([f32; 16]),
    /// Texture unit bound to a sampler uniform.
    Sampler { kind: SamplerKind, unit: i32 },
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        let data = match self {
            Value::Bool(_) => DataType::Bool,
            Value::BVec2(_) => DataType::BVec2,
            Value::BVec3(_) => DataType::BVec3,
            Value::BVec4(_) => DataType::BVec4,
            Value::Int(_) => DataType::Int,
            Value::IVec2(_) => DataType::IVec2,
            Value::IVec3(_) => DataType::IVec3,
            Value::IVec4(_) => DataType::IVec4,
            Value::UInt(_) => DataType::UInt,
            Value::UVec2(_) => DataType::UVec2,
            Value::UVec3(_) => DataType::UVec3,
            Value::UVec4(_) => DataType::UVec4,
            Value::Float(_) => DataType::Float,
            Value::Vec2(_) => DataType::Vec2,
            Value::Vec3(_) => DataType::Vec3,
            Value::Vec4(_) => DataType::Vec4,
            Value::Mat2(_) => DataType::Mat2,
            Value::Mat2x3(_) => DataType::Mat2x3,
            Value::Mat2x4(_) => DataType::Mat2x4,
            Value::Mat3x2(_) => DataType::Mat3x2,
            Value::Mat3(_) => DataType::Mat3,
            Value::Mat3x4(_) => DataType::Mat3x4,
            Value::Mat4x2(_) => DataType::Mat4x2,
            Value::Mat4x3(_) => DataType::Mat4x3,
            Value::Mat4(_) => DataType::Mat4,
            Value::Sampler { kind, .. } => return ValueType::Sampler(*kind),
        };
        ValueType::Data(data)
    }
}

/// GLSL float literal: always carries a decimal point.
pub(crate) fn glsl_float(v: f32) -> String {
    if !v.is_finite() {
        return "0.0".to_string();
    }
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0');
    if s.ends_with('.') {
        format!("{s}0")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_parse_covers_every_type() {
        for ty in ValueType::all() {
            assert_eq!(ty.glsl().parse::<ValueType>(), Ok(ty));
        }
        assert_eq!("unsigned int".parse::<ValueType>(), Ok(ValueType::Data(DataType::UInt)));
        assert!(matches!(
            "vec5".parse::<ValueType>(),
            Err(ShaderBuildError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn test_value_reports_its_type() {
        assert_eq!(Value::Vec3([0.0; 3]).value_type(), ValueType::VEC3);
        assert_eq!(
            Value::Sampler {
                kind: SamplerKind::Sampler2DArray,
                unit: 2
            }
            .value_type(),
            ValueType::Sampler(SamplerKind::Sampler2DArray)
        );
    }

    #[test]
    fn test_glsl_float_literals() {
        assert_eq!(glsl_float(0.8), "0.8");
        assert_eq!(glsl_float(1.0 - 0.8), "0.2");
        assert_eq!(glsl_float(1.0), "1.0");
        assert_eq!(glsl_float(f32::NAN), "0.0");
    }

    #[test]
    fn test_size_constants() {
        assert_eq!(SizeClass::One.constant_name(), None);
        assert_eq!(SizeClass::LightCount.constant_name(), Some("lights_count"));
        assert_eq!(SizeClass::BoneCount.maximum(), 80);
    }
}
