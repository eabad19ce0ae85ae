// Copyright (c) 2025 knix
// All rights reserved.

//! Representation assignment for discriminated unions.

use log::debug;

use crate::layout::{
    ComplicatedVector, EnumConstant, EnumVector, FunctorRep, LayoutEntry, SimpleVector,
    TypeFunctors, TypeLayout,
};
use crate::names::Name;
use crate::tags::TagBits;
use crate::typeinfo::PseudoTypeInfo;
use crate::{SV4, SV8};

/// Assigns representations to `ctors`, given in declaration order. The
/// caller guarantees there is at least one.
pub fn assign_du(bits: TagBits, ctors: &[(Name, SV4<PseudoTypeInfo>)]) -> (TypeLayout, TypeFunctors) {
    debug_assert!(!ctors.is_empty());

    if ctors.iter().all(|(_, args)| args.is_empty()) {
        return assign_enum(bits, ctors);
    }

    if let [(name, args)] = ctors {
        if args.len() == 1 {
            let sv = SimpleVector { name: *name, ordinal: 0, arg_types: args.clone(), rep: FunctorRep::NoTag };
            let layout = TypeLayout { entries: bits.for_all_tags(LayoutEntry::NoTag), constants: None };
            return (layout, TypeFunctors::NoTag(sv));
        }
    }

    if bits == TagBits::Zero {
        return assign_boxed(ctors);
    }

    let mut entries: SV8<LayoutEntry> = bits.for_all_tags(LayoutEntry::Unassigned);
    let mut functors: Vec<SimpleVector> = Vec::with_capacity(ctors.len());

    let num_constants = ctors.iter().filter(|(_, args)| args.is_empty()).count();
    let mut constants: SV8<EnumConstant> = SV8::with_capacity(num_constants);
    let first_functor_tag: u32 = if num_constants > 0 { 1 } else { 0 };
    let num_functors = (ctors.len() - num_constants) as u32;
    let available = bits.num_tags() - first_functor_tag;

    // With more functors than tags, the last tag is shared by the overflow
    let shared_from = if num_functors > available { Some(bits.last_tag()) } else { None };

    let mut next_tag = first_functor_tag;
    let mut sharers: SV8<u32> = SV8::new();
    for (ordinal, (name, args)) in ctors.iter().enumerate() {
        let ordinal = ordinal as u32;
        let rep = if args.is_empty() {
            let value = constants.len() as u32;
            constants.push(EnumConstant { name: *name, ordinal });
            FunctorRep::Const { tag: 0, value }
        } else if shared_from == Some(next_tag) {
            let sectag = sharers.len() as u32;
            sharers.push(ordinal);
            FunctorRep::Shared { tag: next_tag, sectag }
        } else {
            let tag = next_tag;
            entries[tag as usize] = LayoutEntry::Simple(ordinal);
            next_tag += 1;
            FunctorRep::Unshared { tag }
        };
        functors.push(SimpleVector { name: *name, ordinal, arg_types: args.clone(), rep });
    }

    if num_constants > 0 {
        entries[0] = LayoutEntry::Const;
    }
    if let Some(tag) = shared_from {
        entries[tag as usize] = LayoutEntry::Complicated(ComplicatedVector { sharers });
    }

    debug!(
        "assigned {} constants and {} functors over {}, shared tag {:?}",
        num_constants, num_functors, bits, shared_from
    );

    let constants =
        (num_constants > 0).then_some(EnumVector { is_enum: false, constants });
    (TypeLayout { entries, constants }, TypeFunctors::Du(functors))
}

fn assign_enum(bits: TagBits, ctors: &[(Name, SV4<PseudoTypeInfo>)]) -> (TypeLayout, TypeFunctors) {
    let constants = ctors
        .iter()
        .enumerate()
        .map(|(ordinal, (name, _))| EnumConstant { name: *name, ordinal: ordinal as u32 })
        .collect();
    let ev = EnumVector { is_enum: true, constants };
    let layout = TypeLayout { entries: bits.for_all_tags(LayoutEntry::Const), constants: Some(ev.clone()) };
    (layout, TypeFunctors::Enum(ev))
}

/// No tag bits: everything lives behind an untagged pointer. A lone
/// functor needs no secondary tag.
fn assign_boxed(ctors: &[(Name, SV4<PseudoTypeInfo>)]) -> (TypeLayout, TypeFunctors) {
    if let [(name, args)] = ctors {
        let sv = SimpleVector {
            name: *name,
            ordinal: 0,
            arg_types: args.clone(),
            rep: FunctorRep::Unshared { tag: 0 },
        };
        let layout = TypeLayout { entries: smallvec::smallvec![LayoutEntry::Simple(0)], constants: None };
        return (layout, TypeFunctors::Du(vec![sv]));
    }

    let functors: Vec<SimpleVector> = ctors
        .iter()
        .enumerate()
        .map(|(ordinal, (name, args))| SimpleVector {
            name: *name,
            ordinal: ordinal as u32,
            arg_types: args.clone(),
            rep: FunctorRep::Shared { tag: 0, sectag: ordinal as u32 },
        })
        .collect();
    let sharers = (0..functors.len() as u32).collect();
    let layout = TypeLayout {
        entries: smallvec::smallvec![LayoutEntry::Complicated(ComplicatedVector { sharers })],
        constants: None,
    };
    (layout, TypeFunctors::Du(functors))
}
