// Copyright (c) 2025 knix
// All rights reserved.

//! Layout and functor tables.
//!
//! The layout table has one entry per primary tag and tells a decoder what a
//! value carrying that tag looks like. The functor table lists the type's
//! constructors in declaration order, independent of how they are tagged.

pub mod assign;
pub mod decode;


use std::fmt::{Display, Formatter};

use crate::names::Name;
use crate::typeinfo::PseudoTypeInfo;
use crate::{SV4, SV8};

/// Fixed kinds of layout entry, by their table code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BuiltinKind {
    Unassigned = 0,
    Unused = 1,
    String = 2,
    Float = 3,
    Int = 4,
    Character = 5,
    Univ = 6,
    Predicate = 7,
    Void = 8,
    Array = 9,
    TypeInfo = 10,
    CPointer = 11,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 12] = [
        BuiltinKind::Unassigned,
        BuiltinKind::Unused,
        BuiltinKind::String,
        BuiltinKind::Float,
        BuiltinKind::Int,
        BuiltinKind::Character,
        BuiltinKind::Univ,
        BuiltinKind::Predicate,
        BuiltinKind::Void,
        BuiltinKind::Array,
        BuiltinKind::TypeInfo,
        BuiltinKind::CPointer,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<BuiltinKind> {
        BuiltinKind::ALL.get(code as usize).copied()
    }

    /// Atomic kinds have no constructor index
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            BuiltinKind::String | BuiltinKind::Float | BuiltinKind::Int | BuiltinKind::Character
        )
    }
}

impl Display for BuiltinKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuiltinKind::Unassigned => "unassigned",
            BuiltinKind::Unused => "unused",
            BuiltinKind::String => "string",
            BuiltinKind::Float => "float",
            BuiltinKind::Int => "int",
            BuiltinKind::Character => "character",
            BuiltinKind::Univ => "univ",
            BuiltinKind::Predicate => "predicate",
            BuiltinKind::Void => "void",
            BuiltinKind::Array => "array",
            BuiltinKind::TypeInfo => "type_info",
            BuiltinKind::CPointer => "c_pointer",
        };
        f.write_str(s)
    }
}

/// How one constructor's values are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctorRep {
    /// Raw ordinal of an enumeration
    Enum { value: u32 },
    /// `mkword(tag, value << tag_bits)`
    Const { tag: u32, value: u32 },
    /// Tagged pointer to `[args...]`
    Unshared { tag: u32 },
    /// Tagged pointer to `[sectag, args...]`
    Shared { tag: u32, sectag: u32 },
    /// The single argument itself
    NoTag,
}

impl FunctorRep {
    pub fn primary_tag(self) -> Option<u32> {
        match self {
            FunctorRep::Enum { .. } | FunctorRep::NoTag => None,
            FunctorRep::Const { tag, .. }
            | FunctorRep::Unshared { tag }
            | FunctorRep::Shared { tag, .. } => Some(tag),
        }
    }
}

/// One constructor: name, declaration ordinal, argument types and
/// representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleVector {
    pub name: Name,
    pub ordinal: u32,
    pub arg_types: SV4<PseudoTypeInfo>,
    pub rep: FunctorRep,
}

impl SimpleVector {
    pub fn arity(&self) -> u32 {
        self.arg_types.len() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: Name,
    pub ordinal: u32,
}

/// Nullary constructors, indexed by their stored value.
///
/// For a pure enumeration the value is the declaration ordinal; for the
/// constants of a mixed type it is the position among the constants and the
/// word carries the tag scheme's shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVector {
    pub is_enum: bool,
    pub constants: SV8<EnumConstant>,
}

impl EnumVector {
    pub fn num_functors(&self) -> u32 {
        self.constants.len() as u32
    }

    pub fn get(&self, value: u64) -> Option<&EnumConstant> {
        self.constants.get(usize::try_from(value).ok()?)
    }
}

/// Constructors sharing one primary tag, as ordinals indexed by secondary tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplicatedVector {
    pub sharers: SV8<u32>,
}

impl ComplicatedVector {
    pub fn num_sharers(&self) -> u32 {
        self.sharers.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    Unassigned,
    Builtin(BuiltinKind),
    Const,
    /// Ordinal of the one constructor on this tag
    Simple(u32),
    Complicated(ComplicatedVector),
    Equiv,
    NoTag,
}

/// Per-tag entries plus the constants vector the `Const` entries share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLayout {
    pub entries: SV8<LayoutEntry>,
    pub constants: Option<EnumVector>,
}

impl TypeLayout {
    pub fn entry(&self, tag: u32) -> &LayoutEntry {
        self.entries.get(tag as usize).unwrap_or(&LayoutEntry::Unassigned)
    }
}

pub const TYPEFUNCTORS_DU: u8 = 0;
pub const TYPEFUNCTORS_ENUM: u8 = 1;
pub const TYPEFUNCTORS_EQUIV: u8 = 2;
pub const TYPEFUNCTORS_SPECIAL: u8 = 3;
pub const TYPEFUNCTORS_NO_TAG: u8 = 4;
pub const TYPEFUNCTORS_UNIV: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFunctors {
    /// All constructors in declaration order, constants included
    Du(Vec<SimpleVector>),
    Enum(EnumVector),
    Equiv(PseudoTypeInfo),
    NoTag(SimpleVector),
    Special,
    Univ,
}

impl TypeFunctors {
    pub fn indicator(&self) -> u8 {
        match self {
            TypeFunctors::Du(_) => TYPEFUNCTORS_DU,
            TypeFunctors::Enum(_) => TYPEFUNCTORS_ENUM,
            TypeFunctors::Equiv(_) => TYPEFUNCTORS_EQUIV,
            TypeFunctors::Special => TYPEFUNCTORS_SPECIAL,
            TypeFunctors::NoTag(_) => TYPEFUNCTORS_NO_TAG,
            TypeFunctors::Univ => TYPEFUNCTORS_UNIV,
        }
    }

    pub fn num_functors(&self) -> Option<u32> {
        match self {
            TypeFunctors::Du(functors) => Some(functors.len() as u32),
            TypeFunctors::Enum(ev) => Some(ev.num_functors()),
            TypeFunctors::NoTag(_) => Some(1),
            TypeFunctors::Equiv(_) | TypeFunctors::Special | TypeFunctors::Univ => None,
        }
    }

    pub fn functor(&self, ordinal: u32) -> Option<&SimpleVector> {
        match self {
            TypeFunctors::Du(functors) => functors.get(ordinal as usize),
            TypeFunctors::NoTag(sv) if ordinal == 0 => Some(sv),
            _ => None,
        }
    }

    pub fn expect_du(&self) -> &[SimpleVector] {
        match self {
            TypeFunctors::Du(functors) => functors,
            other => panic!("expect_du called on functors with indicator {}", other.indicator()),
        }
    }

    pub fn expect_equiv(&self) -> &PseudoTypeInfo {
        match self {
            TypeFunctors::Equiv(pti) => pti,
            other => panic!("expect_equiv called on functors with indicator {}", other.indicator()),
        }
    }
}

/// A layout entry resolved against its functor table, with the discriminant
/// checked before any vector is handed out.
#[derive(Debug, Clone, Copy)]
pub enum LayoutView<'a> {
    Unassigned,
    Builtin(BuiltinKind),
    Const(&'a EnumVector),
    Simple(&'a SimpleVector),
    Complicated(ComplicatedView<'a>),
    Equiv(&'a PseudoTypeInfo),
    NoTag(&'a SimpleVector),
}

#[derive(Debug, Clone, Copy)]
pub struct ComplicatedView<'a> {
    vector: &'a ComplicatedVector,
    functors: &'a [SimpleVector],
}

impl<'a> ComplicatedView<'a> {
    pub fn num_sharers(&self) -> u32 {
        self.vector.num_sharers()
    }

    pub fn get(&self, sectag: u64) -> Option<&'a SimpleVector> {
        let ordinal = *self.vector.sharers.get(usize::try_from(sectag).ok()?)?;
        self.functors.get(ordinal as usize)
    }
}

/// Resolves the entry for `tag`. Tables built by the builder are consistent,
/// so a dangling ordinal here is a table bug and panics.
pub fn classify<'a>(layout: &'a TypeLayout, functors: &'a TypeFunctors, tag: u32) -> LayoutView<'a> {
    match layout.entry(tag) {
        LayoutEntry::Unassigned => LayoutView::Unassigned,
        LayoutEntry::Builtin(kind) => LayoutView::Builtin(*kind),
        LayoutEntry::Const => match (&layout.constants, functors) {
            (Some(ev), _) => LayoutView::Const(ev),
            (None, TypeFunctors::Enum(ev)) => LayoutView::Const(ev),
            (None, _) => panic!("const layout entry on tag {tag} without a constants vector"),
        },
        LayoutEntry::Simple(ordinal) => match functors.functor(*ordinal) {
            Some(sv) => LayoutView::Simple(sv),
            None => panic!("simple layout entry on tag {tag} names missing functor {ordinal}"),
        },
        LayoutEntry::Complicated(vector) => {
            LayoutView::Complicated(ComplicatedView { vector, functors: functors.expect_du() })
        }
        LayoutEntry::Equiv => LayoutView::Equiv(functors.expect_equiv()),
        LayoutEntry::NoTag => match functors {
            TypeFunctors::NoTag(sv) => LayoutView::NoTag(sv),
            other => panic!("no-tag layout entry with functor indicator {}", other.indicator()),
        },
    }
}
