// Copyright (c) 2025 knix
// All rights reserved.

//! Type descriptors.
//!
//! A type info is a type constructor applied to argument type infos. In memory
//! it is one word: either the static reference of a zero-arity constructor,
//! which then describes itself, or the address of a cell
//! `[ctor_ref, arg_1, ..., arg_n]`. Predicate and function types of every
//! arity share the two `pred` and `func` constructors, so their cells carry
//! the packed kind and arity explicitly: `[ho_ref, packed, arg_1, ..., arg_arity]`.

pub mod pseudo;
pub mod table;

#[cfg(test)]
mod typeinfo_test;

use std::cmp::Ordering;

use crate::heap::{Heap, MAX_VARINT, StaticRef, Word};
use crate::typeinfo::table::TypeTable;
use crate::{SV4, nz_u32_id};

pub use pseudo::PseudoTypeInfo;

nz_u32_id!(TypeCtorId);

/// Offset of the base reference in a type info cell
pub const TYPEINFO_OFFSET_FOR_BASE: usize = 0;
/// Offset of the first argument in a first-order type info cell
pub const OFFSET_FOR_ARG_TYPE_INFOS: usize = 1;
pub const TYPEINFO_OFFSET_FOR_PRED_ARITY: usize = 1;
pub const TYPEINFO_OFFSET_FOR_PRED_ARGS: usize = 2;

/// Nesting deeper than this while decoding a word is treated as garbage
pub const MAX_TYPE_INFO_DEPTH: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HigherOrderKind {
    Pred,
    Func,
}

impl HigherOrderKind {
    pub fn name(self) -> &'static str {
        match self {
            HigherOrderKind::Pred => "pred",
            HigherOrderKind::Func => "func",
        }
    }
}

/// Even for predicates, odd for functions: `pred/N` is `2N`, `func/N` is `2N + 1`.
pub const fn pack_higher_order(kind: HigherOrderKind, arity: u32) -> Word {
    let base = arity as Word * 2;
    match kind {
        HigherOrderKind::Pred => base,
        HigherOrderKind::Func => base + 1,
    }
}

/// Largest packed higher-order word, `func/MAX_VARINT`. Still below every
/// static reference word.
pub const MAX_PACKED_HIGHER_ORDER: Word = pack_higher_order(HigherOrderKind::Func, MAX_VARINT as u32);

pub const fn unpack_higher_order(packed: Word) -> (HigherOrderKind, u32) {
    let kind = if packed % 2 == 0 { HigherOrderKind::Pred } else { HigherOrderKind::Func };
    (kind, (packed / 2) as u32)
}

/// A type constructor as stored in a constructor slot: a reference to a
/// base descriptor, or a packed higher-order arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCtorDesc {
    Ctor(TypeCtorId),
    HigherOrder { kind: HigherOrderKind, arity: u32 },
}

impl TypeCtorDesc {
    pub fn to_word(self) -> Word {
        match self {
            TypeCtorDesc::Ctor(id) => StaticRef::Ctor(id).to_word(),
            TypeCtorDesc::HigherOrder { kind, arity } => pack_higher_order(kind, arity),
        }
    }

    pub fn from_word(table: &TypeTable, word: Word) -> Option<TypeCtorDesc> {
        if word <= MAX_PACKED_HIGHER_ORDER {
            let (kind, arity) = unpack_higher_order(word);
            return Some(TypeCtorDesc::HigherOrder { kind, arity });
        }
        match StaticRef::from_word(word)? {
            StaticRef::Ctor(id) => table.try_ctor(id).map(|_| TypeCtorDesc::Ctor(id)),
            StaticRef::TypeclassBase(_) => None,
        }
    }

    pub fn arity(self, table: &TypeTable) -> u32 {
        match self {
            TypeCtorDesc::Ctor(id) => table.ctor(id).arity,
            TypeCtorDesc::HigherOrder { arity, .. } => arity,
        }
    }

    pub fn name(self, table: &TypeTable) -> &str {
        match self {
            TypeCtorDesc::Ctor(id) => table.name(table.ctor(id).type_name),
            TypeCtorDesc::HigherOrder { kind, .. } => kind.name(),
        }
    }

    pub fn module_name(self, table: &TypeTable) -> &str {
        match self {
            TypeCtorDesc::Ctor(id) => table.name(table.ctor(id).module_name),
            TypeCtorDesc::HigherOrder { .. } => table::BUILTIN_MODULE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    Ctor { ctor: TypeCtorId, args: Vec<TypeInfo> },
    /// For functions the return type is the last argument
    HigherOrder { kind: HigherOrderKind, args: Vec<TypeInfo> },
}

impl TypeInfo {
    pub fn base(ctor: TypeCtorId) -> TypeInfo {
        TypeInfo::Ctor { ctor, args: Vec::new() }
    }

    pub fn apply(ctor: TypeCtorId, args: impl IntoIterator<Item = TypeInfo>) -> TypeInfo {
        TypeInfo::Ctor { ctor, args: args.into_iter().collect() }
    }

    pub fn pred(args: impl IntoIterator<Item = TypeInfo>) -> TypeInfo {
        TypeInfo::HigherOrder { kind: HigherOrderKind::Pred, args: args.into_iter().collect() }
    }

    pub fn func(
        args: impl IntoIterator<Item = TypeInfo>,
        return_type: TypeInfo,
    ) -> TypeInfo {
        let mut args: Vec<TypeInfo> = args.into_iter().collect();
        args.push(return_type);
        TypeInfo::HigherOrder { kind: HigherOrderKind::Func, args }
    }

    pub fn ctor_desc(&self) -> TypeCtorDesc {
        match self {
            TypeInfo::Ctor { ctor, .. } => TypeCtorDesc::Ctor(*ctor),
            TypeInfo::HigherOrder { kind, args } => {
                TypeCtorDesc::HigherOrder { kind: *kind, arity: args.len() as u32 }
            }
        }
    }

    pub fn args(&self) -> &[TypeInfo] {
        match self {
            TypeInfo::Ctor { args, .. } => args,
            TypeInfo::HigherOrder { args, .. } => args,
        }
    }

    pub fn arity(&self) -> u32 {
        self.args().len() as u32
    }

    pub fn is_higher_order(&self) -> bool {
        matches!(self, TypeInfo::HigherOrder { .. })
    }

    pub fn as_ctor(&self) -> Option<TypeCtorId> {
        match self {
            TypeInfo::Ctor { ctor, .. } => Some(*ctor),
            TypeInfo::HigherOrder { .. } => None,
        }
    }

    /// Only first-order types have a module and type name; asking a
    /// higher-order type info is a caller bug.
    pub fn expect_ctor(&self) -> TypeCtorId {
        match self {
            TypeInfo::Ctor { ctor, .. } => *ctor,
            TypeInfo::HigherOrder { kind, .. } => {
                panic!("expect_ctor called on a {} type info", kind.name())
            }
        }
    }

    pub fn module_name<'t>(&self, table: &'t TypeTable) -> &'t str {
        table.name(table.ctor(self.expect_ctor()).module_name)
    }

    pub fn type_name<'t>(&self, table: &'t TypeTable) -> &'t str {
        table.name(table.ctor(self.expect_ctor()).type_name)
    }

    /// Writes the type info to the heap and returns its word.
    pub fn to_word(&self, table: &TypeTable, heap: &mut Heap) -> Word {
        match self {
            TypeInfo::Ctor { ctor, args } if args.is_empty() => StaticRef::Ctor(*ctor).to_word(),
            TypeInfo::Ctor { ctor, args } => {
                let mut cell: SV4<Word> = SV4::with_capacity(args.len() + 1);
                cell.push(StaticRef::Ctor(*ctor).to_word());
                for arg in args {
                    cell.push(arg.to_word(table, heap));
                }
                heap.alloc(&cell)
            }
            TypeInfo::HigherOrder { kind, args } => {
                let base = StaticRef::Ctor(table.builtins.higher_order(*kind)).to_word();
                if args.is_empty() {
                    return base;
                }
                let mut cell: SV4<Word> = SV4::with_capacity(args.len() + 2);
                cell.push(base);
                cell.push(self.ctor_desc().to_word());
                for arg in args {
                    cell.push(arg.to_word(table, heap));
                }
                heap.alloc(&cell)
            }
        }
    }

    /// Decodes a type info word. Anything that is not a well-formed type info
    /// over `table` yields `None`; type variables are not type infos.
    pub fn from_word(table: &TypeTable, heap: &Heap, word: Word) -> Option<TypeInfo> {
        Self::from_word_depth(table, heap, word, MAX_TYPE_INFO_DEPTH)
    }

    fn from_word_depth(table: &TypeTable, heap: &Heap, word: Word, depth: u32) -> Option<TypeInfo> {
        let depth = depth.checked_sub(1)?;
        if word <= MAX_VARINT {
            return None;
        }
        if let Some(static_ref) = StaticRef::from_word(word) {
            let StaticRef::Ctor(ctor) = static_ref else { return None };
            if let Some(kind) = table.builtins.higher_order_kind(ctor) {
                return Some(TypeInfo::HigherOrder { kind, args: Vec::new() });
            }
            let base = table.try_ctor(ctor)?;
            return (base.arity == 0).then(|| TypeInfo::base(ctor));
        }

        let Some(StaticRef::Ctor(ctor)) = StaticRef::from_word(heap.get(word)?) else {
            return None;
        };
        let (desc, first_arg) = match table.builtins.higher_order_kind(ctor) {
            Some(kind) => {
                let packed = heap.field(word, TYPEINFO_OFFSET_FOR_PRED_ARITY)?;
                let desc = TypeCtorDesc::from_word(table, packed)?;
                let TypeCtorDesc::HigherOrder { kind: packed_kind, arity } = desc else {
                    return None;
                };
                if packed_kind != kind || arity as Word > MAX_VARINT {
                    return None;
                }
                (desc, TYPEINFO_OFFSET_FOR_PRED_ARGS)
            }
            None => {
                // A zero-arity type info is always the bare reference
                if table.try_ctor(ctor)?.arity == 0 {
                    return None;
                }
                (TypeCtorDesc::Ctor(ctor), OFFSET_FOR_ARG_TYPE_INFOS)
            }
        };
        let arg_words = heap
            .slice(word + first_arg as Word * crate::heap::WORD_BYTES, desc.arity(table) as usize)?;
        let args = arg_words
            .iter()
            .map(|w| Self::from_word_depth(table, heap, *w, depth))
            .collect::<Option<Vec<TypeInfo>>>()?;
        Some(match desc {
            TypeCtorDesc::Ctor(ctor) => TypeInfo::Ctor { ctor, args },
            TypeCtorDesc::HigherOrder { kind, .. } => TypeInfo::HigherOrder { kind, args },
        })
    }

    fn name_key<'t>(&self, table: &'t TypeTable) -> (&'t str, &'t str) {
        let desc = self.ctor_desc();
        (desc.module_name(table), desc.name(table))
    }

    /// Structural ordering: module name, type name, arity, then arguments.
    pub fn compare(&self, other: &TypeInfo, table: &TypeTable) -> Ordering {
        self.name_key(table)
            .cmp(&other.name_key(table))
            .then(self.arity().cmp(&other.arity()))
            .then_with(|| {
                for (a, b) in self.args().iter().zip(other.args()) {
                    let ord = a.compare(b, table);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
    }
}
