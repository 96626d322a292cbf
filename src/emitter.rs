//! Final GLSL text for both stages.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use log::debug;
use serde::Serialize;

use crate::catalog::{ParameterCatalog, SamplerParameter};
use crate::optimizer::OptimizationOutcome;
use crate::parameter::ParameterDescriptor;
use crate::partition::PartitionedParameters;
use crate::request::{BuildRequest, SizeTable};
use crate::target::{Dialect, Stage};
use crate::types::{DataType, SizeClass, Value, ValueType};

/// Emitted shaders plus everything a program binder needs to use them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmissionResult {
    pub vertex_text: String,
    pub fragment_text: String,
    /// `#version`/`#extension` lines at the start of `vertex_text`.
    pub vertex_preamble: String,
    /// `#version`/`#extension` lines at the start of `fragment_text`.
    pub fragment_preamble: String,
    /// Initial uniform values, applied right after linking.
    pub default_values: BTreeMap<String, Value>,
    pub interface: PartitionedParameters,
    #[serde(skip)]
    pub optimization: OptimizationOutcome,
}

impl EmissionResult {
    pub fn text(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex_text,
            Stage::Fragment => &self.fragment_text,
        }
    }

    pub fn preamble(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex_preamble,
            Stage::Fragment => &self.fragment_preamble,
        }
    }

    /// Stage text after the preamble.
    pub fn body(&self, stage: Stage) -> &str {
        let text = self.text(stage);
        text.strip_prefix(self.preamble(stage)).unwrap_or(text)
    }
}

/// Name the fragment stage writes its color to.
pub fn fragment_output_name(dialect: Dialect) -> &'static str {
    if dialect.uses_explicit_locations() {
        "FragColor"
    } else {
        "gl_FragColor"
    }
}

pub(crate) fn emit(
    request: &BuildRequest,
    interface: PartitionedParameters,
    vertex_main: &str,
    fragment_main: &str,
) -> EmissionResult {
    let sizes = request.size_table();
    let dialect = request.dialect;
    let header = format!("/* {} {} */\n", request.name, request.purpose);

    let vertex_preamble = preamble(dialect, &vertex_declared(&interface));
    let mut vertex = header.clone();
    vertex.push_str("invariant gl_Position;\n\n");
    write_constants(&mut vertex, &sizes, vertex_declared(&interface));
    let attributes: Vec<String> = interface
        .attributes
        .iter()
        .map(|a| {
            let keyword = if dialect.uses_explicit_locations() {
                format!("layout(location = {}) in", a.location())
            } else if dialect.uses_in_out() {
                "in".to_string()
            } else {
                "attribute".to_string()
            };
            declaration_line(&keyword, &a.parameter, &sizes)
        })
        .collect();
    write_section(&mut vertex, "vertex shader input", &attributes);
    write_section(
        &mut vertex,
        "uniforms",
        &uniform_lines(&interface.vertex_uniforms, &sizes),
    );
    write_section(
        &mut vertex,
        "vertex shader output",
        &varying_lines(dialect, Stage::Vertex, &interface.varyings, &sizes),
    );
    write_main(&mut vertex, &interface.vertex_temporaries, vertex_main, &sizes);

    let fragment_preamble = preamble(dialect, &fragment_declared(&interface));
    let mut fragment = header;
    write_constants(&mut fragment, &sizes, fragment_declared(&interface));
    write_section(
        &mut fragment,
        "uniforms",
        &uniform_lines(&interface.fragment_uniforms, &sizes),
    );
    write_section(
        &mut fragment,
        "fragment shader input",
        &varying_lines(dialect, Stage::Fragment, &interface.varyings, &sizes),
    );
    if dialect.uses_explicit_locations() {
        let output = format!(
            "layout(location = 0) out vec4 {};",
            fragment_output_name(dialect)
        );
        write_section(&mut fragment, "fragment shader output", &[output]);
    }
    write_main(
        &mut fragment,
        &interface.fragment_temporaries,
        fragment_main,
        &sizes,
    );

    EmissionResult {
        vertex_text: format!("{vertex_preamble}{vertex}"),
        fragment_text: format!("{fragment_preamble}{fragment}"),
        vertex_preamble,
        fragment_preamble,
        default_values: default_values(&interface),
        interface,
        optimization: OptimizationOutcome::Skipped,
    }
}

fn vertex_declared(interface: &PartitionedParameters) -> Vec<&ParameterDescriptor> {
    interface
        .attributes
        .iter()
        .map(|a| &a.parameter)
        .chain(&interface.vertex_uniforms)
        .chain(&interface.varyings)
        .chain(&interface.vertex_temporaries)
        .collect()
}

fn fragment_declared(interface: &PartitionedParameters) -> Vec<&ParameterDescriptor> {
    interface
        .fragment_uniforms
        .iter()
        .chain(&interface.varyings)
        .chain(&interface.fragment_temporaries)
        .collect()
}

/// `#version` plus the extensions the declared samplers need.
fn preamble(dialect: Dialect, declared: &[&ParameterDescriptor]) -> String {
    let mut out = format!("#version {}\n", dialect.version());
    let samplers: Vec<_> = declared
        .iter()
        .filter_map(|p| match p.value_type {
            ValueType::Sampler(kind) => Some(kind),
            ValueType::Data(_) => None,
        })
        .collect();
    if dialect < Dialect::Glsl130 && samplers.iter().any(|k| k.is_array()) {
        out.push_str("#extension GL_EXT_texture_array : enable\n");
    }
    if dialect < Dialect::Glsl140 && samplers.iter().any(|k| k.is_rect()) {
        out.push_str("#extension GL_ARB_texture_rectangle : enable\n");
    }
    out
}

fn write_constants<'a>(
    out: &mut String,
    sizes: &SizeTable,
    declared: impl IntoIterator<Item = &'a ParameterDescriptor>,
) {
    let classes: BTreeSet<SizeClass> = declared
        .into_iter()
        .map(|p| p.size_class)
        .filter(|c| *c != SizeClass::One)
        .collect();
    if classes.is_empty() {
        return;
    }
    for class in classes {
        if let Some(name) = class.constant_name() {
            let _ = writeln!(out, "const int {name} = {};", sizes.get(class));
        }
    }
    out.push('\n');
}

fn write_section(out: &mut String, title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "/* {title} */");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
}

fn write_main(out: &mut String, temporaries: &[ParameterDescriptor], main: &str, sizes: &SizeTable) {
    out.push_str("void main()\n{\n");
    for parameter in temporaries {
        out.push('\t');
        out.push_str(&declaration_line("", parameter, sizes));
        out.push('\n');
    }
    if !temporaries.is_empty() {
        out.push('\n');
    }
    out.push_str(main);
    out.push_str("}\n");
}

/// `keyword type name[size]; /* source */`
fn declaration_line(keyword: &str, parameter: &ParameterDescriptor, sizes: &SizeTable) -> String {
    let mut line = String::new();
    if !keyword.is_empty() {
        line.push_str(keyword);
        line.push(' ');
    }
    line.push_str(&parameter.declaration(sizes));
    line.push(';');
    if !parameter.source.is_empty() {
        let _ = write!(line, " /* {} */", parameter.source);
    }
    line
}

fn uniform_lines(uniforms: &[ParameterDescriptor], sizes: &SizeTable) -> Vec<String> {
    uniforms
        .iter()
        .map(|p| declaration_line("uniform", p, sizes))
        .collect()
}

fn varying_lines(
    dialect: Dialect,
    stage: Stage,
    varyings: &[ParameterDescriptor],
    sizes: &SizeTable,
) -> Vec<String> {
    let mut location = 0;
    varyings
        .iter()
        .map(|p| {
            let keyword = if !dialect.uses_in_out() {
                "varying".to_string()
            } else {
                let direction = match stage {
                    Stage::Vertex => "out",
                    Stage::Fragment => "in",
                };
                let flat = if is_integer(p.value_type) { "flat " } else { "" };
                if dialect.uses_varying_locations() {
                    format!("layout(location = {location}) {flat}{direction}")
                } else {
                    format!("{flat}{direction}")
                }
            };
            location += location_slots(p, sizes);
            declaration_line(&keyword, p, sizes)
        })
        .collect()
}

/// Interface locations taken by `parameter`: one per array element, or one
/// per column for matrices.
fn location_slots(parameter: &ParameterDescriptor, sizes: &SizeTable) -> u32 {
    let per_element = match parameter.value_type {
        ValueType::Data(DataType::Mat2 | DataType::Mat2x3 | DataType::Mat2x4) => 2,
        ValueType::Data(DataType::Mat3x2 | DataType::Mat3 | DataType::Mat3x4) => 3,
        ValueType::Data(DataType::Mat4x2 | DataType::Mat4x3 | DataType::Mat4) => 4,
        _ => 1,
    };
    parameter.array_size(sizes) * per_element
}

fn is_integer(value_type: ValueType) -> bool {
    matches!(
        value_type,
        ValueType::Data(
            DataType::Int
                | DataType::IVec2
                | DataType::IVec3
                | DataType::IVec4
                | DataType::UInt
                | DataType::UVec2
                | DataType::UVec3
                | DataType::UVec4
        )
    )
}

/// One texture unit per catalog sampler that survived partitioning.
fn default_values(interface: &PartitionedParameters) -> BTreeMap<String, Value> {
    let mut values = BTreeMap::new();
    for uniform in interface.uniforms() {
        if !uniform.value_type.is_sampler() {
            continue;
        }
        match SamplerParameter::lookup(&uniform.name) {
            Some(sampler) => {
                if let Some(value) = sampler.default_value(uniform.value_type) {
                    values.insert(uniform.name.clone(), value);
                }
            }
            None => debug!("sampler '{}' has no default texture unit", uniform.name),
        }
    }
    values
}
