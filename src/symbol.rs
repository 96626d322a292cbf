//! Closed symbol tables.
//!
//! `symbol_table!` declares a fieldless enum together with its textual
//! spelling. Every variant has to appear in the table, so a new catalog entry
//! without a spelling does not compile.

macro_rules! symbol_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $catalog:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every symbol of the table, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Name of the table, used in `UnknownSymbol` reports.
            pub const CATALOG: &'static str = $catalog;

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn from_symbol(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Index of the symbol inside [`Self::ALL`].
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ShaderBuildError;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                Self::from_symbol(text)
                    .ok_or_else(|| $crate::error::ShaderBuildError::unknown_symbol($catalog, text))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use symbol_table;
