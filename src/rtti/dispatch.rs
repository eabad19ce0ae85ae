// Copyright (c) 2025 knix
// All rights reserved.

//! Special operations: unify, compare and index, plus the optional
//! to-string and from-string conversions, looked up through a type info's
//! base and invoked with the full type info so they can recurse on argument
//! types.
//!
//! Callers must pass values that really have the given type. Nothing here
//! checks that; a mismatch is a caller bug and may panic.

pub mod builtins;

#[cfg(test)]
mod dispatch_test;

use std::cmp::Ordering;

use log::trace;

use crate::heap::{Heap, Word};
use crate::layout::decode::Decoded;
use crate::layout::{TypeFunctors, TypeLayout};
use crate::names::Name;
use crate::typeinfo::table::{BaseTypeInfo, TypeTable};
use crate::typeinfo::{TypeCtorDesc, TypeInfo};

pub const OFFSET_FOR_COUNT: usize = 0;
pub const OFFSET_FOR_UNIFY_PRED: usize = 1;
pub const OFFSET_FOR_INDEX_PRED: usize = 2;
pub const OFFSET_FOR_COMPARE_PRED: usize = 3;
pub const OFFSET_FOR_BASE_TYPE_LAYOUT: usize = 4;
pub const OFFSET_FOR_BASE_TYPE_FUNCTORS: usize = 5;
pub const OFFSET_FOR_TYPE_MODULE_NAME: usize = 6;
pub const OFFSET_FOR_TYPE_NAME: usize = 7;
pub const OFFSET_FOR_TO_STRING_PRED: usize = 8;
pub const OFFSET_FOR_FROM_STRING_PRED: usize = 9;

pub const COMPARE_EQUAL: u8 = 0;
pub const COMPARE_LESS: u8 = 1;
pub const COMPARE_GREATER: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Comparison {
    Equal = COMPARE_EQUAL,
    Less = COMPARE_LESS,
    Greater = COMPARE_GREATER,
}

impl Comparison {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Comparison> {
        match code {
            COMPARE_EQUAL => Some(Comparison::Equal),
            COMPARE_LESS => Some(Comparison::Less),
            COMPARE_GREATER => Some(Comparison::Greater),
            _ => None,
        }
    }

    pub fn to_ordering(self) -> Ordering {
        match self {
            Comparison::Equal => Ordering::Equal,
            Comparison::Less => Ordering::Less,
            Comparison::Greater => Ordering::Greater,
        }
    }
}

impl From<Ordering> for Comparison {
    fn from(ord: Ordering) -> Self {
        match ord {
            Ordering::Equal => Comparison::Equal,
            Ordering::Less => Comparison::Less,
            Ordering::Greater => Comparison::Greater,
        }
    }
}

pub type UnifyPred = fn(&Runtime, &TypeInfo, Word, Word) -> bool;
pub type IndexPred = fn(&Runtime, &TypeInfo, Word) -> i64;
pub type ComparePred = fn(&Runtime, &TypeInfo, Word, Word) -> Comparison;
pub type ToStringPred = fn(&Runtime, &TypeInfo, Word) -> Option<String>;
pub type FromStringPred = fn(&mut Runtime, &TypeInfo, &str) -> Option<Word>;

/// The operations a base type info carries.
#[derive(Debug, Clone, Copy)]
pub struct SpecialPreds {
    pub unify: UnifyPred,
    pub index: IndexPred,
    pub compare: ComparePred,
    pub to_string: Option<ToStringPred>,
    pub from_string: Option<FromStringPred>,
}

impl SpecialPreds {
    /// Table-driven operations for user-defined types
    pub const GENERIC: SpecialPreds = SpecialPreds {
        unify: generic_unify,
        index: generic_index,
        compare: generic_compare,
        to_string: None,
        from_string: None,
    };

    /// The value of the count slot
    pub fn count(&self) -> u32 {
        if self.to_string.is_some() || self.from_string.is_some() { 5 } else { 3 }
    }

    pub fn without_conversions(self) -> SpecialPreds {
        SpecialPreds { to_string: None, from_string: None, ..self }
    }
}

/// One slot of a base type info, by its fixed offset.
#[derive(Debug, Clone, Copy)]
pub enum BaseSlot<'a> {
    Count(u32),
    Unify(UnifyPred),
    Index(IndexPred),
    Compare(ComparePred),
    Layout(&'a TypeLayout),
    Functors(&'a TypeFunctors),
    ModuleName(Name),
    TypeName(Name),
    ToString(ToStringPred),
    FromString(FromStringPred),
}

/// Reads slot `offset`. The conversion slots exist only in extended mode.
pub fn base_slot(base: &BaseTypeInfo, offset: usize) -> Option<BaseSlot<'_>> {
    let special = &base.special;
    match offset {
        OFFSET_FOR_COUNT => Some(BaseSlot::Count(special.count())),
        OFFSET_FOR_UNIFY_PRED => Some(BaseSlot::Unify(special.unify)),
        OFFSET_FOR_INDEX_PRED => Some(BaseSlot::Index(special.index)),
        OFFSET_FOR_COMPARE_PRED => Some(BaseSlot::Compare(special.compare)),
        OFFSET_FOR_BASE_TYPE_LAYOUT => Some(BaseSlot::Layout(&base.layout)),
        OFFSET_FOR_BASE_TYPE_FUNCTORS => Some(BaseSlot::Functors(&base.functors)),
        OFFSET_FOR_TYPE_MODULE_NAME => Some(BaseSlot::ModuleName(base.module_name)),
        OFFSET_FOR_TYPE_NAME => Some(BaseSlot::TypeName(base.type_name)),
        OFFSET_FOR_TO_STRING_PRED => special.to_string.map(BaseSlot::ToString),
        OFFSET_FOR_FROM_STRING_PRED => special.from_string.map(BaseSlot::FromString),
        _ => None,
    }
}

/// The type tables plus the heap values live in.
pub struct Runtime {
    pub table: TypeTable,
    pub heap: Heap,
}

impl Runtime {
    pub fn new(table: TypeTable) -> Runtime {
        Runtime { table, heap: Heap::new() }
    }

    pub fn base_of(&self, ti: &TypeInfo) -> &BaseTypeInfo {
        match ti.ctor_desc() {
            TypeCtorDesc::Ctor(id) => self.table.ctor(id),
            TypeCtorDesc::HigherOrder { kind, .. } => {
                self.table.ctor(self.table.builtins.higher_order(kind))
            }
        }
    }

    pub fn special_preds(&self, ti: &TypeInfo) -> &SpecialPreds {
        &self.base_of(ti).special
    }

    pub fn unify(&self, ti: &TypeInfo, x: Word, y: Word) -> bool {
        (self.special_preds(ti).unify)(self, ti, x, y)
    }

    pub fn compare(&self, ti: &TypeInfo, x: Word, y: Word) -> Comparison {
        (self.special_preds(ti).compare)(self, ti, x, y)
    }

    pub fn index(&self, ti: &TypeInfo, x: Word) -> i64 {
        (self.special_preds(ti).index)(self, ti, x)
    }

    pub fn to_string(&self, ti: &TypeInfo, x: Word) -> Option<String> {
        let to_string = self.special_preds(ti).to_string?;
        to_string(self, ti, x)
    }

    pub fn from_string(&mut self, ti: &TypeInfo, s: &str) -> Option<Word> {
        let from_string = self.special_preds(ti).from_string?;
        from_string(self, ti, s)
    }

    pub fn type_info_to_string(&self, ti: &TypeInfo) -> String {
        self.table.type_info_to_string(ti)
    }

    fn expect_deconstruct(&self, ti: &TypeInfo, x: Word) -> (u32, crate::SV4<(TypeInfo, Word)>) {
        match self.deconstruct(ti, x) {
            Ok(Decoded::Functor(f)) => (f.ordinal, f.args),
            Ok(other) => panic!(
                "generic operation on {} reached builtin value {:?}",
                self.type_info_to_string(ti),
                other
            ),
            Err(e) => panic!("generic operation on {}: {}", self.type_info_to_string(ti), e),
        }
    }

    /// Equivalences carry the generic operations but forward to the type
    /// they stand for.
    fn forward_equiv(&self, ti: &TypeInfo) -> Option<TypeInfo> {
        let ctor = ti.as_ctor()?;
        if !self.table.ctor(ctor).is_equiv() {
            return None;
        }
        Some(self.table.expand_equivs(ti))
    }
}

pub fn generic_unify(rt: &Runtime, ti: &TypeInfo, x: Word, y: Word) -> bool {
    if let Some(expanded) = rt.forward_equiv(ti) {
        return rt.unify(&expanded, x, y);
    }
    let (x_ordinal, x_args) = rt.expect_deconstruct(ti, x);
    let (y_ordinal, y_args) = rt.expect_deconstruct(ti, y);
    x_ordinal == y_ordinal
        && x_args.iter().zip(y_args.iter()).all(|((arg_ti, a), (_, b))| rt.unify(arg_ti, *a, *b))
}

/// Constructor ordinal first, then arguments left to right.
pub fn generic_compare(rt: &Runtime, ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    if let Some(expanded) = rt.forward_equiv(ti) {
        return rt.compare(&expanded, x, y);
    }
    let (x_ordinal, x_args) = rt.expect_deconstruct(ti, x);
    let (y_ordinal, y_args) = rt.expect_deconstruct(ti, y);
    trace!("generic compare at {}: {} vs {}", rt.type_info_to_string(ti), x_ordinal, y_ordinal);
    match x_ordinal.cmp(&y_ordinal) {
        Ordering::Equal => {}
        ord => return ord.into(),
    }
    for ((arg_ti, a), (_, b)) in x_args.iter().zip(y_args.iter()) {
        match rt.compare(arg_ti, *a, *b) {
            Comparison::Equal => {}
            res => return res,
        }
    }
    Comparison::Equal
}

pub fn generic_index(rt: &Runtime, ti: &TypeInfo, x: Word) -> i64 {
    if let Some(expanded) = rt.forward_equiv(ti) {
        return rt.index(&expanded, x);
    }
    let (ordinal, _) = rt.expect_deconstruct(ti, x);
    ordinal as i64
}
