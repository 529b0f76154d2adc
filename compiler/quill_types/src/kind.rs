//! Kind bitset for type values.
//!
//! A `Kind` describes the coarse category of a type. Every concrete
//! category is a single bit; the abstract categories (`num`, `char`,
//! `idxr`, ...) are unions of those bits. Unifying two kinds is a bitwise
//! intersection, so `num` narrowed by `int` is `int`.
//!
//! The high bits are markers that do not take part in that intersection:
//! - `VAR`: the type is a type variable
//! - `NONE`: the type is optional (`?` suffix)
//! - `SOME`: the type is definite (`!` suffix)
//! - `SEL`: the type is a selector into an enclosing parameter list
//! - `REF`: the type is a named reference to a declared type

use bitflags::bitflags;

bitflags! {
    /// Coarse category of a type.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Kind: u32 {
        // === Numbers (bits 0-3) ===
        const BOOL = 1 << 0;
        const INT  = 1 << 1;
        const REAL = 1 << 2;
        const BITS = 1 << 3;

        // === Characters (bits 4-9) ===
        const STR  = 1 << 4;
        const RAW  = 1 << 5;
        const UUID = 1 << 6;
        const TIME = 1 << 7;
        const SPAN = 1 << 8;
        const ENUM = 1 << 9;

        // === Containers (bits 10-13) ===
        const LIST = 1 << 10;
        const DICT = 1 << 11;
        const REC  = 1 << 12;
        const TUPL = 1 << 13;

        // === Meta (bits 14-20) ===
        const TYP  = 1 << 14;
        const FORM = 1 << 15;
        const FUNC = 1 << 16;
        const SYM  = 1 << 17;
        const TAG  = 1 << 18;
        const CALL = 1 << 19;
        const ALT  = 1 << 20;

        // === Markers (bits 24-28) ===
        const SEL  = 1 << 24;
        const REF  = 1 << 25;
        const VAR  = 1 << 26;
        const NONE = 1 << 27;
        const SOME = 1 << 28;

        // === Groups ===
        const NUM  = Self::INT.bits() | Self::REAL.bits() | Self::BITS.bits();
        const CHAR = Self::STR.bits() | Self::RAW.bits() | Self::UUID.bits()
            | Self::TIME.bits() | Self::SPAN.bits() | Self::ENUM.bits();
        const IDXR = Self::LIST.bits() | Self::REC.bits() | Self::TUPL.bits();
        const KEYR = Self::DICT.bits() | Self::REC.bits();
        const SPEC = Self::FORM.bits() | Self::FUNC.bits();
        const EXP  = Self::SYM.bits() | Self::TAG.bits() | Self::CALL.bits();
        const ANY  = Self::BOOL.bits() | Self::NUM.bits() | Self::CHAR.bits()
            | Self::IDXR.bits() | Self::KEYR.bits() | Self::TYP.bits()
            | Self::SPEC.bits() | Self::EXP.bits();

        /// Flags stripped before comparing base kinds.
        const MARKERS = Self::VAR.bits() | Self::NONE.bits() | Self::SOME.bits();
    }
}

/// Canonical kind names, most specific first within each group.
///
/// Printing looks for an exact match of the base kind in this table.
const NAMES: &[(&str, Kind)] = &[
    ("bool", Kind::BOOL),
    ("int", Kind::INT),
    ("real", Kind::REAL),
    ("bits", Kind::BITS),
    ("num", Kind::NUM),
    ("str", Kind::STR),
    ("raw", Kind::RAW),
    ("uuid", Kind::UUID),
    ("time", Kind::TIME),
    ("span", Kind::SPAN),
    ("enum", Kind::ENUM),
    ("char", Kind::CHAR),
    ("list", Kind::LIST),
    ("dict", Kind::DICT),
    ("rec", Kind::REC),
    ("tupl", Kind::TUPL),
    ("idxr", Kind::IDXR),
    ("keyr", Kind::KEYR),
    ("typ", Kind::TYP),
    ("form", Kind::FORM),
    ("func", Kind::FUNC),
    ("spec", Kind::SPEC),
    ("sym", Kind::SYM),
    ("tag", Kind::TAG),
    ("call", Kind::CALL),
    ("exp", Kind::EXP),
    ("alt", Kind::ALT),
    ("any", Kind::ANY),
];

impl Kind {
    /// The kind with `VAR`, `NONE` and `SOME` stripped.
    #[inline]
    pub const fn base(self) -> Self {
        self.difference(Self::MARKERS)
    }

    /// Only the `VAR`, `NONE` and `SOME` markers of this kind.
    #[inline]
    pub const fn markers(self) -> Self {
        self.intersection(Self::MARKERS)
    }

    #[inline]
    pub const fn is_var(self) -> bool {
        self.contains(Self::VAR)
    }

    #[inline]
    pub const fn is_optional(self) -> bool {
        self.contains(Self::NONE)
    }

    /// Whether the type still needs name or selector resolution.
    #[inline]
    pub const fn is_unresolved(self) -> bool {
        self.intersects(Self::SEL.union(Self::REF))
    }

    /// Whether the base kind is a single concrete category.
    #[inline]
    pub const fn is_leaf(self) -> bool {
        self.base().bits().count_ones() == 1
    }

    /// Whether this kind declares its signature with a parameter list.
    #[inline]
    pub const fn is_spec(self) -> bool {
        self.base().intersects(Self::SPEC) && self.base().difference(Self::SPEC).is_empty()
    }

    /// Canonical name of the base kind, if it has one.
    pub fn name(self) -> Option<&'static str> {
        let base = self.base();
        NAMES
            .iter()
            .find(|(_, kind)| *kind == base)
            .map(|(name, _)| *name)
    }

    /// Look up a kind by its canonical name or a `+` joined list of names.
    pub fn from_kind_name(name: &str) -> Option<Self> {
        if name == "_" {
            return Some(Self::empty());
        }
        let mut kind = Self::empty();
        for part in name.split('+') {
            let (_, k) = NAMES.iter().find(|(n, _)| *n == part)?;
            kind |= *k;
        }
        Some(kind)
    }

    /// Write the printable name of the base kind.
    ///
    /// Returns `false` without writing anything when the base is empty.
    /// A base that has no canonical name is written as its single-bit
    /// members joined by `+`.
    pub fn write_name(self, buf: &mut String) -> bool {
        let base = self.base();
        if base.is_empty() {
            return false;
        }
        if let Some(name) = self.name() {
            buf.push_str(name);
            return true;
        }
        let mut first = true;
        for (name, kind) in NAMES {
            if kind.bits().count_ones() == 1 && base.contains(*kind) {
                if !first {
                    buf.push('+');
                }
                buf.push_str(name);
                first = false;
            }
        }
        true
    }
}
