//! Compilation targets: GLSL dialect, pipeline stage, packing mode and purpose.

use bitflags::bitflags;

use crate::symbol::symbol_table;

symbol_table! {
    /// Target GLSL version. Ordered from oldest to newest.
    pub enum Dialect in "dialect" {
        Glsl120 => "120",
        Glsl130 => "130",
        Glsl140 => "140",
        Glsl150 => "150",
        Glsl330 => "330",
        Glsl400 => "400",
        Glsl410 => "410",
        Glsl420 => "420",
        Glsl440 => "440",
        Glsl450 => "450",
    }
}

impl Dialect {
    pub fn version(self) -> u16 {
        match self {
            Dialect::Glsl120 => 120,
            Dialect::Glsl130 => 130,
            Dialect::Glsl140 => 140,
            Dialect::Glsl150 => 150,
            Dialect::Glsl330 => 330,
            Dialect::Glsl400 => 400,
            Dialect::Glsl410 => 410,
            Dialect::Glsl420 => 420,
            Dialect::Glsl440 => 440,
            Dialect::Glsl450 => 450,
        }
    }

    pub fn from_version(version: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.version() == version)
    }

    /// `in`/`out` storage qualifiers replace `attribute`/`varying`.
    pub fn uses_in_out(self) -> bool {
        self >= Dialect::Glsl130
    }

    /// Vertex inputs and fragment outputs take explicit `layout(location = N)`.
    pub fn uses_explicit_locations(self) -> bool {
        self >= Dialect::Glsl330
    }

    /// Inter-stage varyings take explicit `layout(location = N)`.
    pub fn uses_varying_locations(self) -> bool {
        self >= Dialect::Glsl410
    }

    pub fn mask(self) -> DialectMask {
        DialectMask::from_bits_retain(1 << self.index())
    }
}

bitflags! {
    /// Set of dialects a fragment body is written for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DialectMask: u16 {
        const GLSL_120 = 1 << 0;
        const GLSL_130 = 1 << 1;
        const GLSL_140 = 1 << 2;
        const GLSL_150 = 1 << 3;
        const GLSL_330 = 1 << 4;
        const GLSL_400 = 1 << 5;
        const GLSL_410 = 1 << 6;
        const GLSL_420 = 1 << 7;
        const GLSL_440 = 1 << 8;
        const GLSL_450 = 1 << 9;
    }
}

impl DialectMask {
    pub fn contains_dialect(self, dialect: Dialect) -> bool {
        self.contains(dialect.mask())
    }

    pub fn dialects(self) -> impl Iterator<Item = Dialect> {
        Dialect::ALL
            .iter()
            .copied()
            .filter(move |d| self.contains_dialect(*d))
    }
}

impl FromIterator<Dialect> for DialectMask {
    fn from_iter<I: IntoIterator<Item = Dialect>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DialectMask::empty(), |mask, d| mask | d.mask())
    }
}

symbol_table! {
    pub enum Stage in "stage" {
        Vertex => "vertex",
        Fragment => "fragment",
    }
}

impl Stage {
    pub fn mask(self) -> StageMask {
        match self {
            Stage::Vertex => StageMask::VERTEX,
            Stage::Fragment => StageMask::FRAGMENT,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StageMask: u8 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

impl StageMask {
    pub fn stages(self) -> impl Iterator<Item = Stage> {
        Stage::ALL
            .iter()
            .copied()
            .filter(move |s| self.contains(s.mask()))
    }
}

impl FromIterator<Stage> for StageMask {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StageMask::empty(), |mask, s| mask | s.mask())
    }
}

symbol_table! {
    /// How a material's texture layers are bound to sampler slots.
    pub enum PackingMode in "packing mode" {
        Default => "default",
        /// Several texture layers packed into array samplers.
        Merged => "merged",
    }
}

symbol_table! {
    /// Which render pass a shader permutation is built for.
    pub enum Purpose in "purpose" {
        Color => "color",
        Depth => "depth",
        Shadow => "shadow",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_versions_round_trip() {
        for dialect in Dialect::ALL {
            assert_eq!(Dialect::from_version(dialect.version()), Some(*dialect));
            assert_eq!(dialect.as_str(), dialect.version().to_string());
        }
        assert_eq!(Dialect::from_version(300), None);
    }

    #[test]
    fn test_dialect_mask_bits_follow_table_order() {
        let all: DialectMask = Dialect::ALL.iter().copied().collect();
        assert_eq!(all, DialectMask::all());
        assert_eq!(Dialect::Glsl330.mask(), DialectMask::GLSL_330);

        let mask = DialectMask::GLSL_120 | DialectMask::GLSL_420;
        let listed: Vec<Dialect> = mask.dialects().collect();
        assert_eq!(listed, vec![Dialect::Glsl120, Dialect::Glsl420]);
    }

    #[test]
    fn test_storage_keywords_by_dialect() {
        assert!(!Dialect::Glsl120.uses_in_out());
        assert!(Dialect::Glsl130.uses_in_out());
        assert!(!Dialect::Glsl150.uses_explicit_locations());
        assert!(Dialect::Glsl330.uses_explicit_locations());
        assert!(!Dialect::Glsl400.uses_varying_locations());
        assert!(Dialect::Glsl410.uses_varying_locations());
    }
}
