//! Shader composition: stitches registered fragments into vertex and fragment
//! programs for one build request.
//!
//! Each stage runs a fixed, purpose-dependent sequence of role requests. A role
//! whose fragment is not bound or not registered for the request's stage and
//! dialect contributes nothing. Fragment parameters are merged into the stage
//! pool in processing order, so a value produced by an earlier role is visible
//! to every later reader.

mod fragment;
mod lights;
mod vertex;

use log::{debug, trace};

use crate::catalog::{CommonParameter, ParameterCatalog};
use crate::config::ComposerConfig;
use crate::emitter::{self, EmissionResult};
use crate::error::ShaderBuildError;
use crate::fragment::{Role, ShaderFragment};
use crate::optimizer::{self, ShaderOptimizer};
use crate::partition;
use crate::pool::ParameterPool;
use crate::request::{BuildRequest, FeatureFlags};
use crate::target::{Purpose, Stage};

/// Builds shader sources from a shared, read-only fragment registry.
#[derive(Clone, Copy, Debug)]
pub struct ShaderComposer<'a> {
    registry: &'a crate::registry::FragmentRegistry,
    config: &'a ComposerConfig,
}

impl<'a> ShaderComposer<'a> {
    pub fn new(registry: &'a crate::registry::FragmentRegistry, config: &'a ComposerConfig) -> Self {
        Self { registry, config }
    }

    /// Compose, partition and emit both stages.
    pub fn build(&self, request: &BuildRequest) -> Result<EmissionResult, ShaderBuildError> {
        let request = self.derive_flags(request);
        debug!(
            "building '{}' ({} purpose, glsl {}): flags {:?}, lights {}+{}, shadow maps {}",
            request.name,
            request.purpose,
            request.dialect,
            request.flags,
            request.vertex_light_count,
            request.fragment_light_count,
            request.shadow_map_count,
        );

        let context = BuildContext {
            composer: *self,
            request: &request,
        };
        let vertex = context.build_vertex_source()?;
        let fragment = context.build_fragment_source()?;

        let interface = partition::partition(vertex.pool, fragment.pool);
        let result = emitter::emit(&request, interface, &vertex.main, &fragment.main);
        debug!("vertex shader '{}':\n{}", request.name, result.vertex_text);
        debug!("fragment shader '{}':\n{}", request.name, result.fragment_text);
        Ok(result)
    }

    /// [`Self::build`], then run `optimizer` over both stages.
    ///
    /// Optimizer failures are not fatal: the unoptimized text is kept and the
    /// failure is recorded in [`EmissionResult::optimization`].
    pub fn build_optimized(
        &self,
        request: &BuildRequest,
        optimizer: &dyn ShaderOptimizer,
    ) -> Result<EmissionResult, ShaderBuildError> {
        let mut result = self.build(request)?;
        optimizer::apply_best_effort(&mut result, optimizer);
        Ok(result)
    }

    /// Copy of `request` with the parameter-driven feature flags filled in.
    ///
    /// Flags are derived in a fixed order, each one seeing the flags before it.
    pub fn derive_flags(&self, request: &BuildRequest) -> BuildRequest {
        let mut request = request.clone();
        request.flags.remove(FeatureFlags::DERIVED);

        let derived = [
            (FeatureFlags::VIEW_DIRECTION, CommonParameter::WorldViewDirection),
            (FeatureFlags::SHADOW_UV_DDX_DDY, CommonParameter::ShadowUvDdxDdy),
            (FeatureFlags::TBN_MATRIX, CommonParameter::TbnMatrix),
            (FeatureFlags::VIEW_POSITION, CommonParameter::ViewPosition),
            (FeatureFlags::NORMAL, CommonParameter::WorldNormal),
            (FeatureFlags::TANGENT, CommonParameter::WorldTangent),
        ];
        for (flag, parameter) in derived {
            let used = self.uses_common_parameter(&request, parameter);
            trace!("'{}' reads {parameter}: {used}", request.name);
            request.flags.set(flag, used);
        }
        if request.vertex_lighting() {
            request.flags.insert(FeatureFlags::NORMAL);
        }
        request
    }

    /// Whether any fragment scheduled for `request` reads `parameter`.
    pub fn uses_common_parameter(&self, request: &BuildRequest, parameter: CommonParameter) -> bool {
        scheduled_roles(request).into_iter().any(|(role, stage)| {
            self.fragment(request, role, stage)
                .is_some_and(|f| f.reads(parameter.symbol()))
        })
    }

    fn fragment(&self, request: &BuildRequest, role: Role, stage: Stage) -> Option<&'a ShaderFragment> {
        let name = request.binding(role)?;
        self.registry
            .lookup(role, name, stage, request.dialect, request.packing)
    }
}

/// Roles the stage builders may request under the current flags.
fn scheduled_roles(request: &BuildRequest) -> Vec<(Role, Stage)> {
    let color = request.purpose == Purpose::Color;
    let mut roles = vec![(world_transformation_role(request), Stage::Vertex)];

    if request.has(FeatureFlags::VIEW_POSITION) {
        roles.push((Role::ViewTransformation, Stage::Vertex));
    }
    if color && request.has(FeatureFlags::FOG) {
        roles.push((Role::Fog, Stage::Vertex));
    }
    if request.vertex_lighting() {
        roles.push((Role::Light, Stage::Vertex));
    }
    if request.receives_shadows() {
        roles.push((Role::ShadowUv, Stage::Vertex));
    }
    roles.push((Role::Uv, Stage::Vertex));

    if color && request.has(FeatureFlags::SHADOW_UV_DDX_DDY) {
        roles.push((Role::ShadowUvDdxDdy, Stage::Fragment));
    }
    if request.has(FeatureFlags::VIEW_DIRECTION) {
        roles.push((Role::ViewDirection, Stage::Fragment));
    }
    if request.has(FeatureFlags::TBN_MATRIX) {
        roles.push((Role::TbnMatrix, Stage::Fragment));
    }
    if color {
        roles.push((Role::NormalDepthMapping, Stage::Fragment));
    }
    if color || request.has(FeatureFlags::TRANSPARENT) {
        roles.push((Role::DiffuseMapping, Stage::Fragment));
    }
    if color {
        roles.push((Role::SpecularMapping, Stage::Fragment));
    }
    if request.receives_shadows() {
        roles.push((Role::ShadowMapping, Stage::Fragment));
    }
    if request.fragment_lighting() {
        roles.push((Role::Light, Stage::Fragment));
    }
    if request.purpose == Purpose::Shadow {
        roles.push((Role::ShadowMap, Stage::Fragment));
    }
    roles
}

fn world_transformation_role(request: &BuildRequest) -> Role {
    if request.has(FeatureFlags::TANGENT) {
        Role::WorldTangentTransformation
    } else if request.has(FeatureFlags::NORMAL) {
        Role::WorldNormalTransformation
    } else {
        Role::WorldDepthTransformation
    }
}

/// Parameters and main-function text of one stage under construction.
#[derive(Debug)]
pub(crate) struct StageSource {
    pub pool: ParameterPool,
    pub main: String,
}

impl StageSource {
    fn new(stage: Stage) -> Self {
        Self {
            pool: ParameterPool::new(stage),
            main: String::new(),
        }
    }

    fn stage(&self) -> Stage {
        self.pool.stage()
    }

    fn line(&mut self, indent: usize, text: &str) {
        push_line(&mut self.main, indent, text);
    }
}

/// Per-build state shared by the stage builders.
struct BuildContext<'a> {
    composer: ShaderComposer<'a>,
    request: &'a BuildRequest,
}

impl<'a> BuildContext<'a> {
    fn config(&self) -> &'a ComposerConfig {
        self.composer.config
    }

    fn fragment(&self, role: Role, stage: Stage) -> Option<&'a ShaderFragment> {
        self.composer.fragment(self.request, role, stage)
    }

    /// Emit the fragment bound to `role` and merge its parameters.
    ///
    /// Returns `false` when the role contributes nothing.
    fn build_role(&self, role: Role, source: &mut StageSource) -> Result<bool, ShaderBuildError> {
        let Some(fragment) = self.fragment(role, source.stage()) else {
            trace!(
                "'{}': no {} fragment for role {role}",
                self.request.name,
                source.stage()
            );
            return Ok(false);
        };
        write_fragment(&mut source.main, fragment, 1);
        source.pool.add_parameters(fragment.parameters.iter().cloned())?;
        Ok(true)
    }
}

fn push_line(out: &mut String, indent: usize, text: &str) {
    for _ in 0..indent {
        out.push('\t');
    }
    out.push_str(text);
    out.push('\n');
}

/// Write `/* role: name */` followed by the fragment body in its own scope.
fn write_fragment(out: &mut String, fragment: &ShaderFragment, indent: usize) {
    push_line(out, indent, &format!("/* {} */", fragment.label()));
    push_line(out, indent, "{");
    let body = indent_glsl_body(&fragment.body, indent + 1);
    if !body.trim().is_empty() {
        out.push_str(&body);
        out.push('\n');
    }
    push_line(out, indent, "}");
}

fn indent_glsl_body(source: &str, indent_levels: usize) -> String {
    let indent = "\t".repeat(indent_levels);
    source
        .replace("\r\n", "\n")
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AutoParameter, VertexAttribute};
    use crate::fragment::ShaderFragment;
    use crate::registry::FragmentRegistry;
    use crate::request::{BuildTarget, MaterialDescription};
    use crate::target::Dialect;

    fn registry() -> FragmentRegistry {
        let mut registry = FragmentRegistry::new();
        let fragments = [
            ShaderFragment::new(
                Role::WorldNormalTransformation,
                "default",
                "world_position = world_transformation * vec4(position, 1.0);\nworld_normal = normal;",
            )
            .with_parameter(VertexAttribute::Position.input(""))
            .with_parameter(VertexAttribute::Normal.input(""))
            .with_parameter(AutoParameter::WorldTransformation.input(""))
            .with_parameter(CommonParameter::WorldPosition.output(""))
            .with_parameter(CommonParameter::WorldNormal.output("")),
            ShaderFragment::new(
                Role::WorldDepthTransformation,
                "default",
                "world_position = world_transformation * vec4(position, 1.0);",
            )
            .with_parameter(VertexAttribute::Position.input(""))
            .with_parameter(AutoParameter::WorldTransformation.input(""))
            .with_parameter(CommonParameter::WorldPosition.output("")),
            ShaderFragment::new(Role::NormalDepthMapping, "default", "fragment_normal = normalize(world_normal);")
                .with_parameter(CommonParameter::WorldNormal.input(""))
                .with_parameter(CommonParameter::FragmentNormal.output("")),
            ShaderFragment::new(Role::DiffuseMapping, "default", "albedo = vec4(1.0);")
                .with_parameter(CommonParameter::Albedo.output("")),
        ];
        for fragment in fragments {
            registry.register(fragment).unwrap();
        }
        registry
    }

    fn request(purpose: Purpose) -> BuildRequest {
        BuildRequest::resolve(
            &ComposerConfig::default(),
            &MaterialDescription::new("test"),
            &BuildTarget::new(Dialect::Glsl120, purpose),
        )
    }

    #[test]
    fn test_normal_flag_follows_fragment_reads() {
        let registry = registry();
        let config = ComposerConfig::default();
        let composer = ShaderComposer::new(&registry, &config);

        let color = composer.derive_flags(&request(Purpose::Color));
        assert!(color.has(FeatureFlags::NORMAL));
        assert!(!color.has(FeatureFlags::TANGENT | FeatureFlags::VIEW_DIRECTION));
        assert_eq!(world_transformation_role(&color), Role::WorldNormalTransformation);

        let depth = composer.derive_flags(&request(Purpose::Depth));
        assert!(!depth.has(FeatureFlags::NORMAL));
        assert_eq!(world_transformation_role(&depth), Role::WorldDepthTransformation);
    }

    #[test]
    fn test_derive_flags_clears_stale_flags() {
        let registry = registry();
        let config = ComposerConfig::default();
        let composer = ShaderComposer::new(&registry, &config);

        let mut stale = request(Purpose::Depth);
        stale.flags |= FeatureFlags::TANGENT | FeatureFlags::VIEW_DIRECTION;
        let derived = composer.derive_flags(&stale);
        assert!(!derived.has(FeatureFlags::TANGENT));
        assert!(!derived.has(FeatureFlags::VIEW_DIRECTION));
    }

    #[test]
    fn test_build_role_wraps_body_in_scope() {
        let registry = registry();
        let config = ComposerConfig::default();
        let request = request(Purpose::Color);
        let context = BuildContext {
            composer: ShaderComposer::new(&registry, &config),
            request: &request,
        };

        let mut source = StageSource::new(Stage::Fragment);
        assert!(context.build_role(Role::DiffuseMapping, &mut source).unwrap());
        assert_eq!(
            source.main,
            "\t/* diffuse_mapping: default */\n\t{\n\t\talbedo = vec4(1.0);\n\t}\n"
        );
        assert_eq!(source.pool.globals()[0].source, "diffuse_mapping: default");

        assert!(!context.build_role(Role::SpecularMapping, &mut source).unwrap());
        assert!(!context.build_role(Role::DiffuseMapping, &mut StageSource::new(Stage::Vertex)).unwrap());
    }
}
