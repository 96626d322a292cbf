//! Split the composed stage pools into attributes, varyings, uniforms and
//! main-function temporaries.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::{ParameterCatalog, VertexAttribute};
use crate::parameter::ParameterDescriptor;
use crate::pool::ParameterPool;
use crate::types::Qualifier;

/// A vertex input bound to a fixed attribute location.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributeBinding {
    pub attribute: VertexAttribute,
    pub parameter: ParameterDescriptor,
}

impl AttributeBinding {
    pub fn location(&self) -> u32 {
        self.attribute.location()
    }
}

/// Interface of the composed program.
///
/// Attributes and varyings never share a name with each other or with a
/// uniform. A uniform read by both stages is listed for both.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PartitionedParameters {
    pub attributes: Vec<AttributeBinding>,
    pub varyings: Vec<ParameterDescriptor>,
    pub vertex_uniforms: Vec<ParameterDescriptor>,
    pub fragment_uniforms: Vec<ParameterDescriptor>,
    /// Values produced and consumed inside the vertex main function.
    pub vertex_temporaries: Vec<ParameterDescriptor>,
    pub fragment_temporaries: Vec<ParameterDescriptor>,
}

impl PartitionedParameters {
    pub fn uniforms(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.vertex_uniforms
            .iter()
            .chain(self.fragment_uniforms.iter())
    }
}

/// Single pass over both pools.
///
/// A vertex `Out` global whose name the fragment stage also holds becomes a
/// varying and leaves both pools. A remaining vertex `In` global naming a
/// vertex attribute becomes an attribute. Other `In` globals are uniforms and
/// `Out` globals stay inside `main`.
pub fn partition(vertex: ParameterPool, fragment: ParameterPool) -> PartitionedParameters {
    let (vertex_globals, vertex_locals) = vertex.into_parts();
    let (fragment_globals, fragment_locals) = fragment.into_parts();

    let fragment_names: BTreeSet<String> = fragment_globals.iter().map(|p| p.name.clone()).collect();
    let mut varying_names: BTreeSet<String> = BTreeSet::new();
    let mut out = PartitionedParameters::default();

    for parameter in vertex_globals {
        match parameter.qualifier {
            Qualifier::In => match VertexAttribute::lookup(&parameter.name) {
                Some(attribute) => out.attributes.push(AttributeBinding {
                    attribute,
                    parameter,
                }),
                None => out.vertex_uniforms.push(parameter),
            },
            _ if fragment_names.contains(&parameter.name) => {
                varying_names.insert(parameter.name.clone());
                out.varyings.push(parameter);
            }
            _ => out.vertex_temporaries.push(parameter),
        }
    }
    out.vertex_temporaries.extend(vertex_locals);

    for parameter in fragment_globals {
        if varying_names.contains(&parameter.name) {
            continue;
        }
        match parameter.qualifier {
            Qualifier::In => out.fragment_uniforms.push(parameter),
            _ => out.fragment_temporaries.push(parameter),
        }
    }
    out.fragment_temporaries.extend(fragment_locals);

    out
}
