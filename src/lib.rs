//! Procedural GLSL source generation.
//!
//! Materials are described as bindings from [`fragment::Role`]s to named
//! [`fragment::ShaderFragment`]s. The [`composer::ShaderComposer`] stitches the
//! bound fragments into a vertex and a fragment program for one
//! [`request::BuildRequest`], reconciles the parameters they declare, and emits
//! dialect-specific GLSL text together with the program interface.
//!
//! ```ignore
//! let mut registry = FragmentRegistry::new();
//! registry.register_definitions(parse_fragment_definitions(json)?);
//! let config = ComposerConfig::default();
//! let request = BuildRequest::resolve(
//!     &config,
//!     &MaterialDescription::new("crate").with_lighting("blinn_phong"),
//!     &BuildTarget::new(Dialect::Glsl330, Purpose::Color).with_lights(4),
//! );
//! let shaders = ShaderComposer::new(&registry, &config).build(&request)?;
//! ```

mod symbol;

pub mod catalog;
pub mod composer;
pub mod config;
pub mod emitter;
pub mod error;
pub mod fragment;
pub mod optimizer;
pub mod parameter;
pub mod partition;
pub mod pool;
pub mod registry;
pub mod request;
pub mod target;
pub mod types;

pub use catalog::{AutoParameter, CommonParameter, ParameterCatalog, SamplerParameter, VertexAttribute};
pub use composer::ShaderComposer;
pub use config::ComposerConfig;
pub use emitter::EmissionResult;
pub use error::{ConflictKind, OptimizationFailure, ShaderBuildError};
pub use fragment::{FragmentDefinition, Role, ShaderFragment, parse_fragment_definitions};
pub use optimizer::{NagaOptimizer, OptimizationOutcome, ShaderOptimizer};
pub use parameter::ParameterDescriptor;
pub use partition::PartitionedParameters;
pub use pool::ParameterPool;
pub use registry::FragmentRegistry;
pub use request::{BuildRequest, BuildTarget, FeatureFlags, MaterialDescription};
pub use target::{Dialect, DialectMask, PackingMode, Purpose, Stage, StageMask};
pub use types::{Qualifier, SizeClass, Value, ValueType};
