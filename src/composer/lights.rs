//! Per-light accumulation loop.
//!
//! The vertex stage lights `[fragment_light_count, light_count)` and hands the
//! sum to the fragment stage as `vertex_color`; the fragment stage lights
//! `[0, fragment_light_count)` on top of it. Only the first fragment light is
//! shadowed.

use log::trace;

use super::{BuildContext, StageSource, push_line, write_fragment};
use crate::catalog::{AutoParameter, CommonParameter, ParameterCatalog};
use crate::error::ShaderBuildError;
use crate::fragment::Role;
use crate::parameter::ParameterDescriptor;
use crate::pool::ParameterPool;
use crate::request::FeatureFlags;
use crate::target::Stage;
use crate::types::{Qualifier, ValueType, glsl_float};

const LIGHTING: &str = "lighting";

fn scratch(name: &str, value_type: ValueType) -> ParameterDescriptor {
    ParameterDescriptor::new(name, value_type)
        .with_qualifier(Qualifier::Out)
        .with_source(LIGHTING)
}

impl BuildContext<'_> {
    /// Lighting of the color pass fragment stage.
    pub(super) fn build_color_lighting(&self, source: &mut StageSource) -> Result<(), ShaderBuildError> {
        let request = self.request;
        if request.fragment_lighting() {
            let shadow = request.receives_shadows() && self.build_role(Role::ShadowMapping, source)?;
            self.build_lights(source, shadow)
        } else if request.has(FeatureFlags::LIGHTING) {
            self.build_ambient(source)
        } else {
            source
                .pool
                .add_parameter(CommonParameter::Albedo.input(LIGHTING))?;
            source
                .pool
                .add_parameter(CommonParameter::FragmentColor.output(LIGHTING))?;
            source.line(1, "fragment_color = albedo.rgb;");
            Ok(())
        }
    }

    /// Emit the light loop for the stage of `source`.
    ///
    /// Falls back to [`Self::build_ambient`] when no light fragment is
    /// registered for the stage.
    pub(super) fn build_lights(&self, source: &mut StageSource, shadow: bool) -> Result<(), ShaderBuildError> {
        let request = self.request;
        let stage = source.stage();
        let Some(light) = self.fragment(Role::Light, stage) else {
            trace!("'{}': no {stage} light fragment, ambient only", request.name);
            return self.build_ambient(source);
        };
        let fragment_stage = stage == Stage::Fragment;
        let shadow = shadow && fragment_stage;

        let mut scope = ParameterPool::new(stage);
        let mut body = String::new();

        scope.add_local(scratch("i", ValueType::INT))?;
        scope.add_local(scratch("diffuse_colors_sum", ValueType::VEC3))?;
        if fragment_stage {
            scope.add_local(scratch("specular_colors_sum", ValueType::VEC3))?;
        }
        if shadow {
            scope.add_local(scratch("shadow_values", ValueType::VEC3))?;
        }
        scope.add_local(CommonParameter::LightColor.output(LIGHTING))?;
        scope.add_local(CommonParameter::LightPosition.output(LIGHTING))?;

        let ambient = self.ambient_term(&mut scope)?;
        push_line(&mut body, 2, &format!("diffuse_colors_sum = {ambient};"));
        if fragment_stage {
            scope.add_parameter(CommonParameter::Emission.input(LIGHTING))?;
            push_line(&mut body, 2, "diffuse_colors_sum += emission;");
            push_line(&mut body, 2, "specular_colors_sum = vec3(0.0);");
        }
        if shadow {
            scope.add_parameter(CommonParameter::Shadow.input(LIGHTING))?;
            let scale = self.config().shadow_scale.clamp(0.0, 1.0);
            push_line(
                &mut body,
                2,
                &format!(
                    "shadow_values = vec3(shadow * {} + {}, shadow, 1.0);",
                    glsl_float(scale),
                    glsl_float(1.0 - scale)
                ),
            );
        }

        let (offset, bound) = self.loop_range(stage, &mut scope)?;
        scope.add_parameter(AutoParameter::LightColors.input(LIGHTING))?;
        scope.add_parameter(AutoParameter::LightPositions.input(LIGHTING))?;
        push_line(&mut body, 2, &format!("for (i = {offset}; i < {bound}; ++i)"));
        push_line(&mut body, 2, "{");
        push_line(&mut body, 3, "light_color = light_colors[i];");
        push_line(&mut body, 3, "light_position = light_positions[i];");
        write_fragment(&mut body, light, 3);
        scope.add_parameters(light.parameters.iter().cloned())?;
        scope.make_local(CommonParameter::DiffuseColor.symbol());
        scope.make_local(CommonParameter::SpecularColor.symbol());

        let (diffuse_factor, specular_factor) = if shadow {
            (" * shadow_values.x", " * shadow_values.y")
        } else {
            ("", "")
        };
        push_line(
            &mut body,
            3,
            &format!("diffuse_colors_sum += diffuse_color{diffuse_factor};"),
        );
        if fragment_stage {
            push_line(
                &mut body,
                3,
                &format!("specular_colors_sum += specular_color{specular_factor};"),
            );
        }
        if shadow {
            push_line(&mut body, 3, "shadow_values.xy = shadow_values.zz;");
        }
        push_line(&mut body, 2, "}");

        if fragment_stage {
            scope.add_parameter(CommonParameter::Albedo.input(LIGHTING))?;
            scope.add_parameter(CommonParameter::Specular.input(LIGHTING))?;
            scope.add_parameter(CommonParameter::FragmentColor.output(LIGHTING))?;
            push_line(&mut body, 2, "fragment_color = diffuse_colors_sum * albedo.rgb;");
            push_line(&mut body, 2, "fragment_color += specular * specular_colors_sum;");
        } else {
            scope.add_parameter(CommonParameter::VertexColor.output(LIGHTING))?;
            push_line(&mut body, 2, "vertex_color = diffuse_colors_sum;");
        }

        let sizes = self.request.size_table();
        let locals = source.pool.merge_scope(scope)?;
        source.line(1, &format!("/* {LIGHTING} */"));
        source.line(1, "{");
        for local in &locals {
            source.line(2, &format!("{};", local.declaration(&sizes)));
        }
        source.main.push('\n');
        source.main.push_str(&body);
        source.line(1, "}");
        Ok(())
    }

    /// Lighting without a per-light loop: ambient, or the vertex stage result.
    fn build_ambient(&self, source: &mut StageSource) -> Result<(), ShaderBuildError> {
        let mut scope = ParameterPool::new(source.stage());
        let ambient = self.ambient_term(&mut scope)?;

        match source.stage() {
            Stage::Vertex => {
                scope.add_parameter(CommonParameter::VertexColor.output(LIGHTING))?;
                source.line(1, &format!("vertex_color = {ambient};"));
            }
            Stage::Fragment => {
                scope.add_parameter(CommonParameter::Albedo.input(LIGHTING))?;
                scope.add_parameter(CommonParameter::Emission.input(LIGHTING))?;
                scope.add_parameter(CommonParameter::FragmentColor.output(LIGHTING))?;
                source.line(
                    1,
                    &format!("fragment_color = albedo.rgb * ({ambient} + emission);"),
                );
            }
        }
        source.pool.merge_scope(scope)?;
        Ok(())
    }

    /// Starting value of the diffuse sum.
    ///
    /// Fragment lighting continues from `vertex_color` when the vertex stage
    /// lit anything; otherwise the sky/ground hemisphere ambient is used.
    fn ambient_term(&self, scope: &mut ParameterPool) -> Result<String, ShaderBuildError> {
        if scope.stage() == Stage::Fragment && self.request.vertex_lighting() {
            scope.add_parameter(CommonParameter::VertexColor.input(LIGHTING))?;
            return Ok(CommonParameter::VertexColor.to_string());
        }

        let normal = match scope.stage() {
            Stage::Vertex => CommonParameter::WorldNormal,
            Stage::Fragment => CommonParameter::FragmentNormal,
        };
        scope.add_parameter(AutoParameter::SkyGroundHemispheres.input(LIGHTING))?;
        scope.add_parameter(normal.input(LIGHTING))?;
        Ok(format!(
            "sky_ground_hemispheres[0].rgb + sky_ground_hemispheres[1].rgb * (0.5 * {normal}.z + 0.5)"
        ))
    }

    /// Loop start and bound expressions.
    ///
    /// The vertex loop always reads its bound from `dynamic_lights_count`; the
    /// fragment loop does when dynamic light counts are configured.
    fn loop_range(&self, stage: Stage, scope: &mut ParameterPool) -> Result<(String, String), ShaderBuildError> {
        let request = self.request;
        let dynamic = AutoParameter::DynamicLightsCount;
        match stage {
            Stage::Vertex => {
                scope.add_parameter(dynamic.input(LIGHTING))?;
                Ok((request.fragment_light_count.to_string(), format!("{dynamic}.z")))
            }
            Stage::Fragment if request.has(FeatureFlags::DYNAMIC_LIGHTS_COUNT) => {
                scope.add_parameter(dynamic.input(LIGHTING))?;
                Ok(("0".to_string(), format!("{dynamic}.y")))
            }
            Stage::Fragment => Ok(("0".to_string(), request.fragment_light_count.to_string())),
        }
    }
}
