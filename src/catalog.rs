//! Closed catalogs of well-known parameter names.
//!
//! Fragments refer to engine uniforms, inter-fragment values, vertex inputs
//! and sampler slots by symbolic name. Each catalog resolves a name into the
//! canonical [`ParameterDescriptor`] for it; a name outside the catalog is an
//! authoring error reported as `UnknownSymbol`.

mod auto_parameter;
mod common_parameter;
mod sampler_parameter;
mod vertex_attribute;

pub use auto_parameter::AutoParameter;
pub use common_parameter::CommonParameter;
pub use sampler_parameter::SamplerParameter;
pub use vertex_attribute::VertexAttribute;

use crate::error::ShaderBuildError;
use crate::parameter::ParameterDescriptor;
use crate::types::Qualifier;

/// A closed table of parameter symbols.
pub trait ParameterCatalog: Copy + Sized + 'static {
    const NAME: &'static str;

    fn all() -> &'static [Self];
    fn symbol(self) -> &'static str;
    fn lookup(symbol: &str) -> Option<Self>;

    /// Canonical descriptor, qualified as `In`.
    fn descriptor(self) -> ParameterDescriptor;

    fn resolve(symbol: &str) -> Result<ParameterDescriptor, ShaderBuildError> {
        Self::lookup(symbol)
            .map(Self::descriptor)
            .ok_or_else(|| ShaderBuildError::unknown_symbol(Self::NAME, symbol))
    }

    /// Descriptor read by `source`.
    fn input(self, source: &str) -> ParameterDescriptor {
        self.descriptor().with_source(source)
    }

    /// Descriptor produced by `source`.
    fn output(self, source: &str) -> ParameterDescriptor {
        self.descriptor()
            .with_qualifier(Qualifier::Out)
            .with_source(source)
    }
}

macro_rules! impl_parameter_catalog {
    ($ty:ty) => {
        impl $crate::catalog::ParameterCatalog for $ty {
            const NAME: &'static str = <$ty>::CATALOG;

            fn all() -> &'static [Self] {
                <$ty>::ALL
            }

            fn symbol(self) -> &'static str {
                self.as_str()
            }

            fn lookup(symbol: &str) -> Option<Self> {
                <$ty>::from_symbol(symbol)
            }

            fn descriptor(self) -> $crate::parameter::ParameterDescriptor {
                let (value_type, size_class, array_scale) = self.layout();
                $crate::parameter::ParameterDescriptor::new(self.as_str(), value_type)
                    .with_size(size_class, array_scale)
            }
        }
    };
}

pub(crate) use impl_parameter_catalog;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_round_trip<C: ParameterCatalog + PartialEq + std::fmt::Debug>() {
        for entry in C::all() {
            let descriptor = C::resolve(entry.symbol())
                .unwrap_or_else(|e| panic!("{} {}: {e}", C::NAME, entry.symbol()));
            assert_eq!(descriptor.name, entry.symbol());
            assert_eq!(descriptor.qualifier, Qualifier::In);
            assert_eq!(C::lookup(&descriptor.name), Some(*entry));
        }
    }

    #[test]
    fn test_catalogs_round_trip() {
        assert_round_trip::<AutoParameter>();
        assert_round_trip::<CommonParameter>();
        assert_round_trip::<SamplerParameter>();
        assert_round_trip::<VertexAttribute>();
    }

    #[test]
    fn test_catalog_names_are_disjoint() {
        for auto in AutoParameter::ALL {
            assert_eq!(CommonParameter::lookup(auto.symbol()), None, "{auto}");
            assert_eq!(VertexAttribute::lookup(auto.symbol()), None, "{auto}");
        }
        for common in CommonParameter::ALL {
            assert_eq!(VertexAttribute::lookup(common.symbol()), None, "{common}");
            assert_eq!(SamplerParameter::lookup(common.symbol()), None, "{common}");
        }
    }

    #[test]
    fn test_unknown_symbol_names_catalog() {
        let err = CommonParameter::resolve("world_colour").unwrap_err();
        assert_eq!(
            err,
            ShaderBuildError::UnknownSymbol {
                catalog: "common parameter",
                symbol: "world_colour".to_string(),
            }
        );
    }

    proptest! {
        #[test]
        fn prop_unknown_names_never_resolve(name in "[a-z_]{1,24}") {
            let known = AutoParameter::lookup(&name).is_some();
            prop_assert_eq!(AutoParameter::resolve(&name).is_ok(), known);
            if let Ok(descriptor) = AutoParameter::resolve(&name) {
                prop_assert_eq!(descriptor.name, name);
            }
        }
    }
}
