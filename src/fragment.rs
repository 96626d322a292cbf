//! Shader fragments: opaque GLSL bodies with a declared parameter interface.
//!
//! Fragments are built once, either directly or from a serde
//! [`FragmentDefinition`], and never change after registration.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::{
    AutoParameter, CommonParameter, ParameterCatalog, SamplerParameter, VertexAttribute,
};
use crate::error::ShaderBuildError;
use crate::parameter::ParameterDescriptor;
use crate::symbol::symbol_table;
use crate::target::{Dialect, DialectMask, PackingMode, Stage, StageMask};
use crate::types::{Qualifier, SizeClass, ValueType};

symbol_table! {
    /// Functional slot a fragment fills in the composed program.
    pub enum Role in "role" {
        WorldDepthTransformation => "world_depth_transformation",
        WorldNormalTransformation => "world_normal_transformation",
        WorldTangentTransformation => "world_tangent_transformation",
        ViewTransformation => "view_transformation",
        Fog => "fog",
        Light => "light",
        ShadowUv => "shadow_uv",
        Uv => "uv",
        ShadowUvDdxDdy => "shadow_uv_ddx_ddy",
        ViewDirection => "view_direction",
        TbnMatrix => "tbn_matrix",
        NormalDepthMapping => "normal_depth_mapping",
        DiffuseMapping => "diffuse_mapping",
        SpecularMapping => "specular_mapping",
        ShadowMapping => "shadow_mapping",
        ShadowMap => "shadow_map",
    }
}

impl Role {
    /// Stages a fragment of this role runs in unless it says otherwise.
    pub fn default_stages(self) -> StageMask {
        use Role::*;

        match self {
            WorldDepthTransformation | WorldNormalTransformation | WorldTangentTransformation
            | ViewTransformation | Fog | ShadowUv | Uv => StageMask::VERTEX,
            Light => StageMask::all(),
            ShadowUvDdxDdy | ViewDirection | TbnMatrix | NormalDepthMapping | DiffuseMapping
            | SpecularMapping | ShadowMapping | ShadowMap => StageMask::FRAGMENT,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShaderFragment {
    pub role: Role,
    pub name: String,
    pub stages: StageMask,
    pub dialects: DialectMask,
    pub packing: PackingMode,
    pub parameters: Vec<ParameterDescriptor>,
    pub body: String,
}

impl ShaderFragment {
    /// A fragment for every dialect, default packing and the role's usual stages.
    pub fn new(role: Role, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            stages: role.default_stages(),
            dialects: DialectMask::all(),
            packing: PackingMode::Default,
            parameters: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_stages(mut self, stages: StageMask) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_dialects(mut self, dialects: DialectMask) -> Self {
        self.dialects = dialects;
        self
    }

    pub fn with_packing(mut self, packing: PackingMode) -> Self {
        self.packing = packing;
        self
    }

    /// Declare a parameter; its source is set to this fragment.
    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        let source = self.label();
        self.parameters.push(parameter.with_source(source));
        self
    }

    /// `role: name`, used in emitted comments and error reports.
    pub fn label(&self) -> String {
        format!("{}: {}", self.role, self.name)
    }

    pub fn supports(&self, stage: Stage, dialect: Dialect) -> bool {
        self.stages.contains(stage.mask()) && self.dialects.contains_dialect(dialect)
    }

    pub fn declares(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Reads `name`, as `In` or `InOut`.
    pub fn reads(&self, name: &str) -> bool {
        self.declares(name)
            .is_some_and(|p| p.qualifier != Qualifier::Out)
    }
}

/// Serialized form of a fragment, as produced by a definition loader.
#[derive(Debug, Clone, Deserialize)]
pub struct FragmentDefinition {
    pub role: String,
    pub name: String,
    /// Empty means the role's default stages.
    #[serde(default)]
    pub stages: Vec<String>,
    /// Empty means every dialect.
    #[serde(default)]
    pub dialects: Vec<String>,
    #[serde(default)]
    pub packing: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    pub body: FragmentBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FragmentBody {
    Text(String),
    Lines(Vec<String>),
}

impl FragmentBody {
    fn into_text(self) -> String {
        match self {
            FragmentBody::Text(text) => text,
            FragmentBody::Lines(lines) => lines.join("\n"),
        }
    }
}

/// A parameter reference inside a [`FragmentDefinition`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterDefinition {
    Auto {
        auto: String,
    },
    Common {
        common: String,
        #[serde(default)]
        qualifier: Option<String>,
    },
    Attribute {
        attribute: String,
    },
    Sampler {
        sampler: String,
        #[serde(rename = "type", default)]
        value_type: Option<String>,
    },
    Custom {
        name: String,
        #[serde(rename = "type")]
        value_type: String,
        #[serde(default)]
        qualifier: Option<String>,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        scale: Option<u16>,
    },
}

impl ParameterDefinition {
    pub fn resolve(&self) -> Result<ParameterDescriptor, ShaderBuildError> {
        match self {
            ParameterDefinition::Auto { auto } => AutoParameter::resolve(auto),
            ParameterDefinition::Common { common, qualifier } => {
                Ok(CommonParameter::resolve(common)?.with_qualifier(parse_qualifier(qualifier)?))
            }
            ParameterDefinition::Attribute { attribute } => VertexAttribute::resolve(attribute),
            ParameterDefinition::Sampler {
                sampler,
                value_type,
            } => {
                let descriptor = SamplerParameter::resolve(sampler)?;
                match value_type {
                    Some(ty) => Ok(descriptor.with_value_type(ty.parse()?)),
                    None => Ok(descriptor),
                }
            }
            ParameterDefinition::Custom {
                name,
                value_type,
                qualifier,
                size,
                scale,
            } => {
                let size_class = match size {
                    Some(size) => size.parse()?,
                    None => SizeClass::One,
                };
                Ok(ParameterDescriptor::new(name.as_str(), value_type.parse::<ValueType>()?)
                    .with_qualifier(parse_qualifier(qualifier)?)
                    .with_size(size_class, scale.unwrap_or(1)))
            }
        }
    }
}

fn parse_qualifier(text: &Option<String>) -> Result<Qualifier, ShaderBuildError> {
    text.as_deref().map_or(Ok(Qualifier::In), str::parse)
}

impl FragmentDefinition {
    pub fn resolve(self) -> Result<ShaderFragment, ShaderBuildError> {
        let role: Role = self.role.parse()?;
        let stages = if self.stages.is_empty() {
            role.default_stages()
        } else {
            self.stages
                .iter()
                .map(|s| s.parse::<Stage>())
                .collect::<Result<StageMask, _>>()?
        };
        let dialects = if self.dialects.is_empty() {
            DialectMask::all()
        } else {
            self.dialects
                .iter()
                .map(|d| d.parse::<Dialect>())
                .collect::<Result<DialectMask, _>>()?
        };
        let packing = match &self.packing {
            Some(packing) => packing.parse()?,
            None => PackingMode::Default,
        };

        let mut fragment = ShaderFragment::new(role, self.name, self.body.into_text())
            .with_stages(stages)
            .with_dialects(dialects)
            .with_packing(packing);
        for parameter in &self.parameters {
            fragment = fragment.with_parameter(parameter.resolve()?);
        }
        Ok(fragment)
    }
}

/// Parse a JSON array of fragment definitions.
pub fn parse_fragment_definitions(json: &str) -> Result<Vec<FragmentDefinition>> {
    serde_json::from_str(json).context("failed to parse fragment definitions json")
}
