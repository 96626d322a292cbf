//! Per-stage parameter pools and the merge rules for shared names.

use crate::error::{ConflictKind, ShaderBuildError};
use crate::parameter::ParameterDescriptor;
use crate::target::Stage;
use crate::types::Qualifier;

/// Parameters collected while composing one stage (or one scope inside it).
///
/// `globals` holds stage-level values that end up as uniforms, attributes,
/// varyings or main-function temporaries. `locals` holds scratch values that
/// stay inside the scope that declared them. A name lives in at most one of
/// the two lists.
#[derive(Clone, Debug)]
pub struct ParameterPool {
    stage: Stage,
    globals: Vec<ParameterDescriptor>,
    locals: Vec<ParameterDescriptor>,
}

impl ParameterPool {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            globals: Vec::new(),
            locals: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn globals(&self) -> &[ParameterDescriptor] {
        &self.globals
    }

    pub fn locals(&self) -> &[ParameterDescriptor] {
        &self.locals
    }

    pub fn find(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.globals
            .iter()
            .chain(self.locals.iter())
            .find(|p| p.name == name)
    }

    /// Merge a fragment parameter into the globals.
    ///
    /// Returns `Ok(true)` when the parameter was appended and `Ok(false)` when
    /// an existing declaration already satisfies it.
    pub fn add_parameter(
        &mut self,
        candidate: ParameterDescriptor,
    ) -> Result<bool, ShaderBuildError> {
        if self.satisfied(&candidate)? {
            return Ok(false);
        }
        self.require_producer(&candidate)?;
        self.globals.push(candidate);
        Ok(true)
    }

    /// Merge a scratch value into the locals. Globals are checked first.
    pub fn add_local(&mut self, candidate: ParameterDescriptor) -> Result<bool, ShaderBuildError> {
        if self.satisfied(&candidate)? {
            return Ok(false);
        }
        self.require_producer(&candidate)?;
        self.locals.push(candidate);
        Ok(true)
    }

    pub fn add_parameters<I>(&mut self, candidates: I) -> Result<(), ShaderBuildError>
    where
        I: IntoIterator<Item = ParameterDescriptor>,
    {
        for candidate in candidates {
            self.add_parameter(candidate)?;
        }
        Ok(())
    }

    /// Move a global into the locals. Returns `false` when `name` is not a global.
    pub fn make_local(&mut self, name: &str) -> bool {
        match self.globals.iter().position(|p| p.name == name) {
            Some(index) => {
                let parameter = self.globals.remove(index);
                self.locals.push(parameter);
                true
            }
            None => false,
        }
    }

    /// Merge the globals of an inner scope; its locals stay behind.
    pub fn merge_scope(&mut self, scope: ParameterPool) -> Result<Vec<ParameterDescriptor>, ShaderBuildError> {
        self.add_parameters(scope.globals)?;
        Ok(scope.locals)
    }

    pub fn into_parts(self) -> (Vec<ParameterDescriptor>, Vec<ParameterDescriptor>) {
        (self.globals, self.locals)
    }

    fn satisfied(&self, candidate: &ParameterDescriptor) -> Result<bool, ShaderBuildError> {
        match self.find(&candidate.name) {
            Some(existing) => use_compatible(self.stage, existing, candidate),
            None => Ok(false),
        }
    }

    fn require_producer(&self, candidate: &ParameterDescriptor) -> Result<(), ShaderBuildError> {
        if candidate.qualifier == Qualifier::InOut {
            return Err(ShaderBuildError::UnsatisfiableInOut {
                stage: self.stage,
                role: candidate.source.clone(),
                parameter: candidate.name.clone(),
            });
        }
        Ok(())
    }
}

/// Whether `existing` already provides what `candidate` asks for.
///
/// Shape mismatches and a producer arriving after a reader are conflicts. An
/// `InOut` reader of a value that nobody produced returns `Ok(false)` so the
/// caller reports it as unsatisfiable.
pub fn use_compatible(
    stage: Stage,
    existing: &ParameterDescriptor,
    candidate: &ParameterDescriptor,
) -> Result<bool, ShaderBuildError> {
    let conflict = |kind| ShaderBuildError::ParameterConflict {
        stage,
        kind,
        existing: Box::new(existing.clone()),
        candidate: Box::new(candidate.clone()),
    };

    if existing.value_type != candidate.value_type {
        return Err(conflict(ConflictKind::Type));
    }
    if !existing.same_size(candidate) {
        return Err(conflict(ConflictKind::Size));
    }

    match (existing.qualifier, candidate.qualifier) {
        (a, b) if a == b => Ok(true),
        (Qualifier::Out | Qualifier::InOut, Qualifier::In | Qualifier::InOut) => Ok(true),
        (Qualifier::In, Qualifier::InOut) => Ok(false),
        _ => Err(conflict(ConflictKind::Qualifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AutoParameter, CommonParameter, ParameterCatalog};
    use crate::types::{SizeClass, ValueType};
    use proptest::prelude::*;

    fn produced(common: CommonParameter) -> ParameterDescriptor {
        common
            .descriptor()
            .with_qualifier(Qualifier::Out)
            .with_source("producer")
    }

    fn read(common: CommonParameter) -> ParameterDescriptor {
        common.descriptor().with_source("reader")
    }

    #[test]
    fn test_reader_after_producer_is_satisfied() {
        let mut pool = ParameterPool::new(Stage::Fragment);
        assert!(pool.add_parameter(produced(CommonParameter::Albedo)).unwrap());
        assert!(!pool.add_parameter(read(CommonParameter::Albedo)).unwrap());
        assert_eq!(pool.globals().len(), 1);
        assert_eq!(pool.globals()[0].qualifier, Qualifier::Out);
    }

    #[test]
    fn test_producer_after_reader_conflicts() {
        let mut pool = ParameterPool::new(Stage::Fragment);
        pool.add_parameter(read(CommonParameter::Shadow)).unwrap();
        let err = pool.add_parameter(produced(CommonParameter::Shadow)).unwrap_err();
        assert!(matches!(
            err,
            ShaderBuildError::ParameterConflict {
                kind: ConflictKind::Qualifier,
                ..
            }
        ));
    }

    #[test]
    fn test_inout_needs_producer() {
        let mut pool = ParameterPool::new(Stage::Vertex);
        let inout = CommonParameter::WorldPosition
            .descriptor()
            .with_qualifier(Qualifier::InOut)
            .with_source("skinning");
        let err = pool.add_parameter(inout.clone()).unwrap_err();
        assert_eq!(
            err,
            ShaderBuildError::UnsatisfiableInOut {
                stage: Stage::Vertex,
                role: "skinning".to_string(),
                parameter: "world_position".to_string(),
            }
        );

        pool.add_parameter(read(CommonParameter::WorldPosition)).unwrap();
        assert!(matches!(
            pool.add_parameter(inout.clone()),
            Err(ShaderBuildError::UnsatisfiableInOut { .. })
        ));

        let mut pool = ParameterPool::new(Stage::Vertex);
        pool.add_parameter(produced(CommonParameter::WorldPosition)).unwrap();
        assert!(!pool.add_parameter(inout).unwrap());
    }

    #[test]
    fn test_size_mismatch_conflicts() {
        let mut pool = ParameterPool::new(Stage::Vertex);
        pool.add_parameter(AutoParameter::LightColors.descriptor()).unwrap();
        let flat = ParameterDescriptor::new("light_colors", ValueType::VEC4);
        let err = pool.add_parameter(flat).unwrap_err();
        assert!(matches!(
            err,
            ShaderBuildError::ParameterConflict {
                kind: ConflictKind::Size,
                ..
            }
        ));
    }

    #[test]
    fn test_locals_check_globals_first() {
        let mut pool = ParameterPool::new(Stage::Fragment);
        pool.add_parameter(produced(CommonParameter::FragmentColor)).unwrap();
        assert!(!pool.add_local(produced(CommonParameter::FragmentColor)).unwrap());
        assert!(pool.locals().is_empty());

        let counter = ParameterDescriptor::new("i", ValueType::INT).with_qualifier(Qualifier::Out);
        assert!(pool.add_local(counter.clone()).unwrap());
        assert!(!pool.add_parameter(counter).unwrap());
        assert_eq!(pool.globals().len(), 1);
        assert_eq!(pool.locals().len(), 1);
    }

    #[test]
    fn test_make_local_moves_global() {
        let mut pool = ParameterPool::new(Stage::Fragment);
        pool.add_parameter(produced(CommonParameter::DiffuseColor)).unwrap();
        assert!(pool.make_local("diffuse_color"));
        assert!(!pool.make_local("diffuse_color"));
        assert!(pool.globals().is_empty());
        assert_eq!(pool.locals()[0].name, "diffuse_color");
    }

    #[test]
    fn test_merge_scope_keeps_inner_locals() {
        let mut stage = ParameterPool::new(Stage::Fragment);
        let mut scope = ParameterPool::new(Stage::Fragment);
        scope.add_parameter(read(CommonParameter::Albedo)).unwrap();
        scope.add_parameter(produced(CommonParameter::DiffuseColor)).unwrap();
        scope.make_local("diffuse_color");

        let locals = stage.merge_scope(scope).unwrap();
        assert_eq!(locals.len(), 1);
        assert_eq!(stage.globals().len(), 1);
        assert_eq!(stage.globals()[0].name, "albedo");
    }

    fn any_value_type() -> impl Strategy<Value = ValueType> {
        let all: Vec<ValueType> = ValueType::all().collect();
        proptest::sample::select(all)
    }

    fn any_qualifier() -> impl Strategy<Value = Qualifier> {
        proptest::sample::select(vec![Qualifier::In, Qualifier::Out])
    }

    proptest! {
        #[test]
        fn prop_add_parameter_is_idempotent(
            ty in any_value_type(),
            qualifier in any_qualifier(),
            scale in 1u16..4,
        ) {
            let descriptor = ParameterDescriptor::new("value", ty)
                .with_qualifier(qualifier)
                .with_size(SizeClass::One, scale);
            let mut pool = ParameterPool::new(Stage::Fragment);
            prop_assert!(pool.add_parameter(descriptor.clone()).unwrap());
            let snapshot = pool.globals().to_vec();
            prop_assert!(!pool.add_parameter(descriptor).unwrap());
            prop_assert_eq!(pool.globals(), snapshot.as_slice());
        }

        #[test]
        fn prop_distinct_types_always_conflict(
            a in any_value_type(),
            b in any_value_type(),
            qa in any_qualifier(),
            qb in any_qualifier(),
        ) {
            prop_assume!(a != b);
            let mut pool = ParameterPool::new(Stage::Vertex);
            pool.add_parameter(ParameterDescriptor::new("shared", a).with_qualifier(qa)).unwrap();
            let err = pool
                .add_parameter(ParameterDescriptor::new("shared", b).with_qualifier(qb))
                .unwrap_err();
            let is_type_conflict = matches!(
                err,
                ShaderBuildError::ParameterConflict { kind: ConflictKind::Type, .. }
            );
            prop_assert!(is_type_conflict);
        }
    }
}
