//! Registry of fragment variants keyed by role and name.

use std::collections::BTreeMap;

use log::warn;

use crate::error::ShaderBuildError;
use crate::fragment::{FragmentDefinition, Role, ShaderFragment};
use crate::target::{Dialect, PackingMode, Stage};

/// All registered fragments.
///
/// Populated once, then shared read-only between any number of concurrent
/// builds.
#[derive(Clone, Debug, Default)]
pub struct FragmentRegistry {
    fragments: BTreeMap<(Role, String), Vec<ShaderFragment>>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant. The first registration of a `(role, name, stage, dialect,
    /// packing)` combination wins; later overlapping variants are rejected.
    /// A variant with no stage or no dialect can never be looked up and is
    /// dropped with a warning.
    pub fn register(&mut self, fragment: ShaderFragment) -> Result<(), ShaderBuildError> {
        if fragment.stages.is_empty() || fragment.dialects.is_empty() {
            warn!(
                "ignoring {} fragment '{}': empty stage or dialect mask",
                fragment.role, fragment.name
            );
            return Ok(());
        }

        let variants = self
            .fragments
            .entry((fragment.role, fragment.name.clone()))
            .or_default();

        for existing in variants.iter().filter(|v| v.packing == fragment.packing) {
            let stages = existing.stages & fragment.stages;
            let dialects = existing.dialects & fragment.dialects;
            if let (Some(stage), Some(dialect)) =
                (stages.stages().next(), dialects.dialects().next())
            {
                return Err(ShaderBuildError::DuplicateVariant {
                    role: fragment.role,
                    name: fragment.name,
                    stage,
                    dialect,
                    packing: fragment.packing,
                });
            }
        }

        variants.push(fragment);
        Ok(())
    }

    /// Register a stream of definitions, returning every rejected entry.
    ///
    /// Unresolvable definitions and duplicates are skipped; the rest are
    /// registered in order.
    pub fn register_definitions<I>(&mut self, definitions: I) -> Vec<ShaderBuildError>
    where
        I: IntoIterator<Item = FragmentDefinition>,
    {
        let mut rejected = Vec::new();
        for definition in definitions {
            let result = definition.resolve().and_then(|f| self.register(f));
            if let Err(e) = result {
                warn!("rejected fragment definition: {e}");
                rejected.push(e);
            }
        }
        rejected
    }

    /// Find the variant for a stage and dialect.
    ///
    /// A `Merged` request falls back to the `Default` variant of the same
    /// dialect. There is no fallback across dialects.
    pub fn lookup(
        &self,
        role: Role,
        name: &str,
        stage: Stage,
        dialect: Dialect,
        packing: PackingMode,
    ) -> Option<&ShaderFragment> {
        let variants = self.fragments.get(&(role, name.to_string()))?;
        let find = |packing: PackingMode| {
            variants
                .iter()
                .find(|v| v.packing == packing && v.supports(stage, dialect))
        };

        match packing {
            PackingMode::Merged => find(PackingMode::Merged).or_else(|| find(PackingMode::Default)),
            PackingMode::Default => find(PackingMode::Default),
        }
    }

    /// Names registered for a role, sorted.
    pub fn names(&self, role: Role) -> Vec<&str> {
        self.fragments
            .keys()
            .filter(|(r, _)| *r == role)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Number of registered variants.
    pub fn len(&self) -> usize {
        self.fragments.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
