use super::{BuildContext, StageSource};
use crate::catalog::{AutoParameter, CommonParameter, ParameterCatalog};
use crate::emitter::fragment_output_name;
use crate::error::ShaderBuildError;
use crate::fragment::Role;
use crate::request::FeatureFlags;
use crate::target::{Purpose, Stage};

const ALPHA_TEST: &str = "alpha_test";
const OUTPUT: &str = "output";

impl BuildContext<'_> {
    pub(super) fn build_fragment_source(&self) -> Result<StageSource, ShaderBuildError> {
        let request = self.request;
        let color = request.purpose == Purpose::Color;
        let mut source = StageSource::new(Stage::Fragment);

        if color && request.has(FeatureFlags::SHADOW_UV_DDX_DDY) {
            self.build_role(Role::ShadowUvDdxDdy, &mut source)?;
        }
        if request.has(FeatureFlags::VIEW_DIRECTION) {
            self.build_role(Role::ViewDirection, &mut source)?;
        }
        if request.has(FeatureFlags::TBN_MATRIX) {
            self.build_role(Role::TbnMatrix, &mut source)?;
        }
        if color {
            self.build_role(Role::NormalDepthMapping, &mut source)?;
        }
        if color || request.has(FeatureFlags::TRANSPARENT) {
            self.build_role(Role::DiffuseMapping, &mut source)?;
        }

        if request.has(FeatureFlags::ALPHA_TEST) {
            source
                .pool
                .add_parameter(CommonParameter::Albedo.input(ALPHA_TEST))?;
            source.line(1, "if (albedo.a < 0.5) discard;");
        }

        let output = fragment_output_name(request.dialect);
        match request.purpose {
            Purpose::Color => {
                self.build_role(Role::SpecularMapping, &mut source)?;
                self.build_color_lighting(&mut source)?;
                self.write_color_output(&mut source, output)?;
            }
            Purpose::Depth => {
                source.line(1, &format!("{output}.rgb = vec3(1.0);"));
            }
            Purpose::Shadow => {
                self.build_role(Role::ShadowMap, &mut source)?;
                source
                    .pool
                    .add_parameter(CommonParameter::ShadowMapData.input(OUTPUT))?;
                source.line(1, &format!("{output}.rgb = shadow_map_data;"));
            }
        }

        if request.has(FeatureFlags::ALPHA_WRITE) {
            source
                .pool
                .add_parameter(CommonParameter::Albedo.input(OUTPUT))?;
            source.line(1, &format!("{output}.a = albedo.a;"));
        } else {
            source.line(1, &format!("{output}.a = 1.0;"));
        }

        Ok(source)
    }

    fn write_color_output(&self, source: &mut StageSource, output: &str) -> Result<(), ShaderBuildError> {
        source
            .pool
            .add_parameter(CommonParameter::FragmentColor.input(OUTPUT))?;

        if self.request.has(FeatureFlags::FOG) {
            source.pool.add_parameter(CommonParameter::Fog.input(OUTPUT))?;
            source
                .pool
                .add_parameter(AutoParameter::FogData.input(OUTPUT))?;
            source.line(
                1,
                &format!("{output}.rgb = 1.0 - exp(-mix(fog_data.rgb, fragment_color, fog));"),
            );
        } else {
            source.line(1, &format!("{output}.rgb = 1.0 - exp(-fragment_color);"));
        }
        Ok(())
    }
}
