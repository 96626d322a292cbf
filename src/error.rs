//! Error taxonomy for registry population and shader builds.

use thiserror::Error;

use crate::fragment::Role;
use crate::parameter::ParameterDescriptor;
use crate::target::{Dialect, PackingMode, Stage};

/// What made two same-named descriptors incompatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    Type,
    Size,
    Qualifier,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConflictKind::Type => "value type",
            ConflictKind::Size => "array size",
            ConflictKind::Qualifier => "qualifier",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderBuildError {
    #[error("unknown {catalog} symbol '{symbol}'")]
    UnknownSymbol { catalog: &'static str, symbol: String },

    #[error("duplicate {stage} fragment '{name}' for role {role} ({dialect}, {packing} packing)")]
    DuplicateVariant {
        role: Role,
        name: String,
        stage: Stage,
        dialect: Dialect,
        packing: PackingMode,
    },

    #[error(
        "{stage} parameter '{}' {kind} conflict: '{}' declares {} but '{}' declares {}",
        .existing.name,
        .existing.source,
        .existing.signature(),
        .candidate.source,
        .candidate.signature()
    )]
    ParameterConflict {
        stage: Stage,
        kind: ConflictKind,
        existing: Box<ParameterDescriptor>,
        candidate: Box<ParameterDescriptor>,
    },

    #[error("{stage} parameter '{parameter}' declared inout by '{role}' has no producer")]
    UnsatisfiableInOut {
        stage: Stage,
        role: String,
        parameter: String,
    },

    #[error(transparent)]
    OptimizationFailure(#[from] OptimizationFailure),
}

impl ShaderBuildError {
    pub(crate) fn unknown_symbol(catalog: &'static str, symbol: &str) -> Self {
        ShaderBuildError::UnknownSymbol {
            catalog,
            symbol: symbol.to_string(),
        }
    }

    /// Fatal errors abort the build in progress; optimizer failures do not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ShaderBuildError::OptimizationFailure(_))
    }
}

/// The optimizer rejected one of the stages.
///
/// Carries both unoptimized stage sources so the failure can be reproduced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} shader optimization failed: {log}")]
pub struct OptimizationFailure {
    pub stage: Stage,
    pub log: String,
    pub vertex_source: String,
    pub fragment_source: String,
}
