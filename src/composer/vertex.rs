use super::{BuildContext, StageSource, world_transformation_role};
use crate::catalog::{AutoParameter, CommonParameter, ParameterCatalog};
use crate::error::ShaderBuildError;
use crate::fragment::Role;
use crate::request::FeatureFlags;
use crate::target::{Purpose, Stage};

const PROJECTION: &str = "projection";

impl BuildContext<'_> {
    pub(super) fn build_vertex_source(&self) -> Result<StageSource, ShaderBuildError> {
        let request = self.request;
        let mut source = StageSource::new(Stage::Vertex);

        self.build_role(world_transformation_role(request), &mut source)?;

        source
            .pool
            .add_parameter(AutoParameter::ProjectionViewMatrix.input(PROJECTION))?;
        source
            .pool
            .add_parameter(CommonParameter::WorldPosition.input(PROJECTION))?;
        source.line(
            1,
            "gl_Position = projection_view_matrix * vec4(world_position, 1.0);",
        );

        if request.has(FeatureFlags::VIEW_POSITION) {
            self.build_role(Role::ViewTransformation, &mut source)?;
        }

        if request.purpose == Purpose::Color && request.has(FeatureFlags::FOG) {
            self.build_role(Role::Fog, &mut source)?;
        }

        if request.vertex_lighting() {
            self.build_lights(&mut source, false)?;
        }

        if request.receives_shadows() {
            self.build_role(Role::ShadowUv, &mut source)?;
        }

        self.build_role(Role::Uv, &mut source)?;

        Ok(source)
    }
}
