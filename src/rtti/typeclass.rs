// Copyright (c) 2025 knix
// All rights reserved.

//! Typeclass infos: the runtime evidence that a type is an instance of a
//! class.
//!
//! An instance cell is `[base_ref, constraint_1, ..., constraint_A, extra_1, ...]`
//! where `A` is the instance arity, the number of typeclass infos for the
//! instance's own constraints. The base holds the method addresses, so method
//! lookup never depends on `A`. Superclass infos and the type infos of the
//! instance's type variables both live in the extra region and are found with
//! the same formula: item `K` is at slot `A + K`.

#[cfg(test)]
mod typeclass_test;

use crate::dispatch::Runtime;
use crate::heap::{StaticRef, Word};
use crate::names::Name;
use crate::typeinfo::TypeInfo;
use crate::{SV8, nz_u32_id};

nz_u32_id!(BaseTypeclassId);

/// Address of a method's code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcAddr(pub Word);

#[derive(Debug, Clone)]
pub struct BaseTypeclassInfo {
    pub class_name: Name,
    pub instance_arity: u32,
    /// Method `n` is `methods[n - 1]`
    pub methods: SV8<ProcAddr>,
}

impl BaseTypeclassInfo {
    pub fn method(&self, n: u32) -> Option<ProcAddr> {
        self.methods.get((n as usize).checked_sub(1)?).copied()
    }
}

pub const TYPECLASS_INFO_OFFSET_FOR_BASE: usize = 0;

/// Slot of extra item `k` (1-based) in an instance of arity `instance_arity`
pub const fn extra_slot(instance_arity: u32, k: u32) -> usize {
    (instance_arity + k) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeclassInfo(Word);

impl TypeclassInfo {
    pub fn from_word(word: Word) -> TypeclassInfo {
        TypeclassInfo(word)
    }

    pub fn word(self) -> Word {
        self.0
    }

    /// Allocates an instance cell. `extras` holds superclass infos and type
    /// infos in the order the class lays them out.
    pub fn alloc(
        rt: &mut Runtime,
        base: BaseTypeclassId,
        constraints: &[TypeclassInfo],
        extras: &[Word],
    ) -> TypeclassInfo {
        let base_info = rt.table.typeclass_base(base);
        debug_assert_eq!(base_info.instance_arity as usize, constraints.len());
        let mut cell: Vec<Word> = Vec::with_capacity(1 + constraints.len() + extras.len());
        cell.push(StaticRef::TypeclassBase(base).to_word());
        cell.extend(constraints.iter().map(|c| c.0));
        cell.extend_from_slice(extras);
        TypeclassInfo(rt.heap.alloc(&cell))
    }

    pub fn base_id(self, rt: &Runtime) -> Option<BaseTypeclassId> {
        let base_word = rt.heap.field(self.0, TYPECLASS_INFO_OFFSET_FOR_BASE)?;
        match StaticRef::from_word(base_word)? {
            StaticRef::TypeclassBase(id) => rt.table.try_typeclass_base(id).map(|_| id),
            StaticRef::Ctor(_) => None,
        }
    }

    pub fn expect_base(self, rt: &Runtime) -> &BaseTypeclassInfo {
        match self.base_id(rt) {
            Some(id) => rt.table.typeclass_base(id),
            None => panic!("no typeclass info at {:#x}", self.0),
        }
    }

    pub fn instance_arity(self, rt: &Runtime) -> u32 {
        self.expect_base(rt).instance_arity
    }

    pub fn class_name(self, rt: &Runtime) -> &str {
        rt.table.name(self.expect_base(rt).class_name)
    }

    /// Method `n`, 1-based
    pub fn method(self, rt: &Runtime, n: u32) -> Option<ProcAddr> {
        self.expect_base(rt).method(n)
    }

    /// Typeclass info for the instance's `k`th own constraint, 1-based
    pub fn constraint(self, rt: &Runtime, k: u32) -> Option<TypeclassInfo> {
        if k == 0 || k > self.instance_arity(rt) {
            return None;
        }
        rt.heap.field(self.0, k as usize).map(TypeclassInfo)
    }

    pub fn superclass_info(self, rt: &Runtime, k: u32) -> Option<TypeclassInfo> {
        self.extra_word(rt, k).map(TypeclassInfo)
    }

    pub fn type_info_word(self, rt: &Runtime, k: u32) -> Option<Word> {
        self.extra_word(rt, k)
    }

    pub fn type_info(self, rt: &Runtime, k: u32) -> Option<TypeInfo> {
        let word = self.type_info_word(rt, k)?;
        TypeInfo::from_word(&rt.table, &rt.heap, word)
    }

    fn extra_word(self, rt: &Runtime, k: u32) -> Option<Word> {
        if k == 0 {
            return None;
        }
        rt.heap.field(self.0, extra_slot(self.instance_arity(rt), k))
    }
}
