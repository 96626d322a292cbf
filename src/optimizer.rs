//! Optional source-to-source pass over emitted stages.

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, warn};

use crate::emitter::EmissionResult;
use crate::error::OptimizationFailure;
use crate::target::Stage;

/// Rewrites one stage's GLSL.
///
/// `source` is the stage text without its preamble; the returned text must not
/// carry one either.
pub trait ShaderOptimizer: Send + Sync {
    fn optimize(&self, preamble: &str, source: &str, stage: Stage) -> Result<String, OptimizationFailure>;
}

/// What happened to an [`EmissionResult`] after emission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OptimizationOutcome {
    #[default]
    Skipped,
    Applied,
    Failed(OptimizationFailure),
}

impl OptimizationFailure {
    pub fn new(stage: Stage, log: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
            vertex_source: String::new(),
            fragment_source: String::new(),
        }
    }

    pub fn with_sources(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_source = vertex.into();
        self.fragment_source = fragment.into();
        self
    }
}

/// Optimize both stages of `emission`. Returns the new full stage texts.
///
/// On failure the returned error carries both unoptimized sources.
pub fn optimize_emission(
    emission: &EmissionResult,
    optimizer: &dyn ShaderOptimizer,
) -> Result<(String, String), OptimizationFailure> {
    let attach = |failure: OptimizationFailure| {
        failure.with_sources(&emission.vertex_text, &emission.fragment_text)
    };
    let mut texts = [String::new(), String::new()];
    for (text, stage) in texts.iter_mut().zip([Stage::Vertex, Stage::Fragment]) {
        let preamble = emission.preamble(stage);
        let body = optimizer
            .optimize(preamble, emission.body(stage), stage)
            .map_err(attach)?;
        *text = format!("{preamble}{body}");
    }
    let [vertex, fragment] = texts;
    Ok((vertex, fragment))
}

/// Replace the stage texts with optimized ones, or keep them and record why not.
pub fn apply_best_effort(emission: &mut EmissionResult, optimizer: &dyn ShaderOptimizer) {
    match optimize_emission(emission, optimizer) {
        Ok((vertex, fragment)) => {
            debug!("optimized shaders ({} + {} bytes)", vertex.len(), fragment.len());
            emission.vertex_text = vertex;
            emission.fragment_text = fragment;
            emission.optimization = OptimizationOutcome::Applied;
        }
        Err(failure) => {
            warn!("{failure}; keeping unoptimized sources");
            emission.optimization = OptimizationOutcome::Failed(failure);
        }
    }
}

/// Validates each stage with naga's GLSL frontend and validator and returns it
/// unchanged.
///
/// Nothing is rewritten, so interface names stay what the program binder
/// expects. naga only reads `#version 440` and newer, and only accepts
/// uniforms inside blocks with explicit bindings; the composer declares loose
/// uniforms, so composed stages fail here and fall back to the emitted text.
/// Hand-written stages that use blocks pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct NagaOptimizer;

/// Oldest `#version` naga's GLSL frontend reads.
const NAGA_MIN_VERSION: u16 = 440;

impl ShaderOptimizer for NagaOptimizer {
    fn optimize(&self, preamble: &str, source: &str, stage: Stage) -> Result<String, OptimizationFailure> {
        naga_validate(preamble, source, stage)
            .map(|()| source.to_string())
            .map_err(|e| OptimizationFailure::new(stage, format!("{e:#}")))
    }
}

fn naga_validate(preamble: &str, source: &str, stage: Stage) -> Result<()> {
    let version = preamble_version(preamble)?;
    if version < NAGA_MIN_VERSION {
        bail!("GLSL {version} is older than naga reads (needs {NAGA_MIN_VERSION} or newer)");
    }
    if let Some(name) = loose_uniform(source) {
        bail!("naga requires uniforms inside blocks with explicit bindings; '{name}' is a loose uniform");
    }

    let options = naga::front::glsl::Options {
        stage: match stage {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        },
        defines: Default::default(),
    };
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, &format!("{preamble}{source}"))
        .map_err(|e| anyhow!("GLSL parse failed: {e:?}"))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("GLSL validation failed: {e:?}"))?;
    Ok(())
}

/// Name of the first `uniform` declared outside a block.
fn loose_uniform(source: &str) -> Option<&str> {
    source.lines().find_map(|line| {
        let line = line.trim();
        let declaration = match line.split_once("uniform ") {
            Some((prefix, rest)) if prefix.is_empty() || prefix.starts_with("layout(") => rest,
            _ => return None,
        };
        let declaration = declaration.split(';').next()?;
        if line.contains('{') || !line.contains(';') {
            return None;
        }
        let name = declaration.split_whitespace().last()?;
        Some(name.split('[').next().unwrap_or(name))
    })
}

fn preamble_version(preamble: &str) -> Result<u16> {
    let line = preamble
        .lines()
        .find_map(|line| line.trim().strip_prefix("#version"))
        .context("preamble has no #version line")?;
    let version = line
        .split_whitespace()
        .next()
        .context("empty #version line")?;
    version
        .parse()
        .with_context(|| format!("bad GLSL version '{version}'"))
}
