// Copyright (c) 2025 knix
// All rights reserved.

#[cfg(test)]
mod type_info_tests {
    use std::cmp::Ordering;

    use crate::config::RuntimeConfig;
    use crate::error::ErrorKind;
    use crate::heap::{HEAP_BASE, StaticRef};
    use crate::tags::TagBits;
    use crate::testing::runtime;
    use crate::typeinfo::table::{CtorDecl, TypeTableBuilder};
    use crate::typeinfo::*;

    #[test]
    fn word_round_trip() {
        let (mut rt, types) = runtime(TagBits::Two);
        let b = rt.table.builtins;
        let cases = [
            types.int(),
            types.list_int(),
            types.list_of(types.list_of(TypeInfo::base(b.string))),
            TypeInfo::apply(types.tree, [TypeInfo::apply(types.maybe, [types.int()])]),
            TypeInfo::apply(b.array, [TypeInfo::base(b.float)]),
            TypeInfo::pred([]),
            TypeInfo::pred([types.int(), TypeInfo::base(b.character)]),
            TypeInfo::func([types.int()], TypeInfo::base(b.string)),
            TypeInfo::func([], types.int()),
            types.list_of(TypeInfo::pred([types.list_int()])),
        ];
        for ti in cases {
            let word = ti.to_word(&rt.table, &mut rt.heap);
            assert_eq!(TypeInfo::from_word(&rt.table, &rt.heap, word), Some(ti));
        }
    }

    #[test]
    fn zero_arity_is_a_bare_reference() {
        let (mut rt, types) = runtime(TagBits::Two);
        let hp = rt.heap.hp();
        let word = types.int().to_word(&rt.table, &mut rt.heap);
        assert_eq!(word, StaticRef::Ctor(types.int).to_word());
        assert_eq!(rt.heap.hp(), hp);
    }

    #[test]
    fn higher_order_packing() {
        for arity in [0, 1, 8, 1024] {
            for kind in [HigherOrderKind::Pred, HigherOrderKind::Func] {
                let packed = pack_higher_order(kind, arity);
                assert_eq!(unpack_higher_order(packed), (kind, arity));
                assert_eq!(packed % 2 == 1, kind == HigherOrderKind::Func);
            }
        }
        let (rt, _) = runtime(TagBits::Two);
        assert_eq!(
            TypeCtorDesc::from_word(&rt.table, pack_higher_order(HigherOrderKind::Func, 3)),
            Some(TypeCtorDesc::HigherOrder { kind: HigherOrderKind::Func, arity: 3 })
        );
        let desc = TypeInfo::func([], TypeInfo::base(rt.table.builtins.int)).ctor_desc();
        assert_eq!(TypeCtorDesc::from_word(&rt.table, desc.to_word()), Some(desc));
        assert_eq!(
            TypeCtorDesc::from_word(&rt.table, MAX_PACKED_HIGHER_ORDER),
            Some(TypeCtorDesc::HigherOrder { kind: HigherOrderKind::Func, arity: 1024 })
        );
        assert_eq!(TypeCtorDesc::from_word(&rt.table, MAX_PACKED_HIGHER_ORDER + 1), None);
        assert_eq!(desc.name(&rt.table), "func");
        assert_eq!(desc.module_name(&rt.table), "builtin");
        assert_eq!(desc.arity(&rt.table), 1);
        assert_eq!(TypeCtorDesc::Ctor(rt.table.builtins.array).arity(&rt.table), 1);
    }

    #[test]
    fn higher_order_cells_carry_the_packed_arity() {
        let (mut rt, types) = runtime(TagBits::Two);
        let string = TypeInfo::base(rt.table.builtins.string);
        let f = TypeInfo::func([types.int()], string.clone());
        let word = f.to_word(&rt.table, &mut rt.heap);
        assert_eq!(
            rt.heap.field(word, TYPEINFO_OFFSET_FOR_PRED_ARITY),
            Some(pack_higher_order(HigherOrderKind::Func, 2))
        );

        // A pred cell whose slot claims func, or an arity past MAX_VARINT
        let pred_ref = StaticRef::Ctor(rt.table.builtins.pred).to_word();
        let int_word = types.int().to_word(&rt.table, &mut rt.heap);
        let wrong_kind = rt.heap.alloc(&[pred_ref, pack_higher_order(HigherOrderKind::Func, 1), int_word]);
        let too_many = rt.heap.alloc(&[pred_ref, MAX_PACKED_HIGHER_ORDER + 2]);
        let good = rt.heap.alloc(&[pred_ref, pack_higher_order(HigherOrderKind::Pred, 1), int_word]);
        assert_eq!(TypeInfo::from_word(&rt.table, &rt.heap, wrong_kind), None);
        assert_eq!(TypeInfo::from_word(&rt.table, &rt.heap, too_many), None);
        assert_eq!(TypeInfo::from_word(&rt.table, &rt.heap, good), Some(TypeInfo::pred([types.int()])));
    }

    #[test]
    fn garbage_words_are_not_type_infos() {
        let (mut rt, types) = runtime(TagBits::Two);
        let bare_list = StaticRef::Ctor(types.list).to_word();
        let int_in_cell = rt.heap.alloc(&[StaticRef::Ctor(types.int).to_word()]);
        let missing_ctor = StaticRef::Ctor(TypeCtorId::from_u32(999).unwrap()).to_word();
        let list_of_var = rt.heap.alloc(&[bare_list, 1]);
        for word in [0, 1, 1024, HEAP_BASE + 4096, bare_list, int_in_cell, missing_ctor, list_of_var] {
            assert_eq!(TypeInfo::from_word(&rt.table, &rt.heap, word), None, "word {word:#x}");
        }
    }

    #[test]
    fn self_referential_cell_is_rejected() {
        let (mut rt, types) = runtime(TagBits::Two);
        let addr = rt.heap.alloc(&[StaticRef::Ctor(types.list).to_word(), 0]);
        rt.heap.set_field(addr, 1, addr);
        assert_eq!(TypeInfo::from_word(&rt.table, &rt.heap, addr), None);
    }

    #[test]
    fn names() {
        let (rt, types) = runtime(TagBits::Two);
        let b = rt.table.builtins;
        let s = |ti: &TypeInfo| rt.table.type_info_to_string(ti);
        assert_eq!(s(&types.list_int()), "list.list(int)");
        assert_eq!(s(&TypeInfo::func([types.int()], TypeInfo::base(b.string))), "func(int) = string");
        assert_eq!(s(&TypeInfo::func([], types.int())), "func = int");
        assert_eq!(s(&TypeInfo::pred([types.int(), TypeInfo::base(b.character)])), "pred(int, character)");
        assert_eq!(s(&TypeInfo::pred([])), "pred");
        assert_eq!(s(&TypeInfo::apply(b.array, [TypeInfo::base(b.float)])), "array.array(float)");
        assert_eq!(types.list_int().module_name(&rt.table), "list");
        assert_eq!(types.list_int().type_name(&rt.table), "list");
        assert_eq!(
            rt.table.pseudo_to_string(&PseudoTypeInfo::apply(types.tree, [PseudoTypeInfo::var(1)])),
            "tree.tree(T1)"
        );
    }

    #[test]
    #[should_panic(expected = "expect_ctor called on a pred type info")]
    fn higher_order_has_no_module() {
        let (rt, _) = runtime(TagBits::Two);
        TypeInfo::pred([]).module_name(&rt.table);
    }

    #[test]
    fn structural_order() {
        let (rt, types) = runtime(TagBits::Two);
        let b = rt.table.builtins;
        let string = TypeInfo::base(b.string);
        assert_eq!(types.int().compare(&string, &rt.table), Ordering::Less);
        assert_eq!(types.list_int().compare(&types.list_of(string.clone()), &rt.table), Ordering::Less);
        assert_eq!(
            types.list_int().compare(&TypeInfo::apply(types.maybe, [types.int()]), &rt.table),
            Ordering::Less
        );
        assert_eq!(types.list_int().compare(&types.list_int(), &rt.table), Ordering::Equal);
        assert_eq!(
            TypeInfo::pred([types.int(), types.int()]).compare(&TypeInfo::pred([types.int()]), &rt.table),
            Ordering::Greater
        );
    }

    #[test]
    fn pseudo_instantiation() {
        let (rt, types) = runtime(TagBits::Two);
        let pti = PseudoTypeInfo::apply(types.list, [PseudoTypeInfo::var(2)]);
        assert!(!pti.is_ground());
        assert_eq!(pti.max_var(), 2);
        let string = TypeInfo::base(rt.table.builtins.string);
        assert_eq!(pti.instantiate(&[types.int(), string.clone()]), Some(types.list_of(string)));
        assert_eq!(pti.instantiate(&[types.int()]), None);
        assert_eq!(PseudoTypeInfo::Var(0).instantiate(&[types.int()]), None);
        assert_eq!(PseudoTypeInfo::from(&types.list_int()).instantiate(&[]), Some(types.list_int()));
    }

    #[test]
    fn equivalences_expand() {
        let (rt, types) = runtime(TagBits::Two);
        assert_eq!(rt.table.expand_equivs(&TypeInfo::base(types.ints)), types.list_int());
        assert_eq!(rt.table.expand_equivs(&TypeInfo::base(types.money)), types.int());
        assert_eq!(rt.table.expand_equivs(&types.list_int()), types.list_int());
    }

    #[test]
    fn builder_errors() {
        let mut b = TypeTableBuilder::new(RuntimeConfig::default());
        let int = PseudoTypeInfo::base(b.builtins().int);
        let t = b.declare("m", "t", 1).unwrap();
        assert_eq!(b.declare("m", "t", 1).unwrap_err().kind, ErrorKind::Table);
        assert!(b.declare("m", "t", 2).is_ok());

        assert_eq!(b.define_du(t, []).unwrap_err().kind, ErrorKind::Table);
        let e = b.define_du(t, [CtorDecl::new("f", [PseudoTypeInfo::var(2)])]).unwrap_err();
        assert!(e.message.contains("T2"), "{}", e.message);
        let e = b.define_du(t, [CtorDecl::new("f", [PseudoTypeInfo::apply(t, [])])]).unwrap_err();
        assert!(e.message.contains("applied to 0 arguments"), "{}", e.message);
        let e = b.define_du(t, [CtorDecl::constant("a"), CtorDecl::constant("a")]).unwrap_err();
        assert!(e.message.contains("appears twice"), "{}", e.message);
        assert!(b.define_du(t, [CtorDecl::constant("a"), CtorDecl::new("a", [int])]).is_ok());
        assert!(b.define_du(t, [CtorDecl::constant("b")]).unwrap_err().message.contains("already defined"));

        let Err(e) = b.finish() else { panic!("finish accepted an undefined type") };
        assert!(e.message.contains("m.t/2 was declared but never defined"), "{}", e.message);
    }

    #[test]
    fn cyclic_equivalence_is_rejected() {
        let mut b = TypeTableBuilder::new(RuntimeConfig::default());
        let a = b.declare("m", "a", 0).unwrap();
        let c = b.declare("m", "c", 0).unwrap();
        b.define_equiv(a, PseudoTypeInfo::base(c)).unwrap();
        b.define_equiv(c, PseudoTypeInfo::base(a)).unwrap();
        let Err(e) = b.finish() else { panic!("finish accepted a cyclic equivalence") };
        assert_eq!(e.kind, ErrorKind::Table);
        assert!(e.message.contains("cyclically"), "{}", e.message);
    }

    #[test]
    fn cycles_through_type_parameters_are_rejected() {
        let mut b = TypeTableBuilder::new(RuntimeConfig::default());
        let id = b.declare("m", "id", 1).unwrap();
        let a = b.declare("m", "a", 0).unwrap();
        b.define_equiv(id, PseudoTypeInfo::var(1)).unwrap();
        b.define_equiv(a, PseudoTypeInfo::apply(id, [PseudoTypeInfo::base(a)])).unwrap();
        let Err(e) = b.finish() else { panic!("finish accepted a cycle through id") };
        assert_eq!(e.kind, ErrorKind::Table);
        assert!(e.message.contains("m.a/0 is cyclically equivalent"), "{}", e.message);

        let mut b = TypeTableBuilder::new(RuntimeConfig::default());
        let pair = b.declare("m", "pair", 2).unwrap();
        let grow = b.declare("m", "grow", 1).unwrap();
        let t1 = || PseudoTypeInfo::var(1);
        b.define_du(pair, [CtorDecl::new("pair", [t1(), PseudoTypeInfo::var(2)])]).unwrap();
        b.define_equiv(grow, PseudoTypeInfo::apply(grow, [PseudoTypeInfo::apply(pair, [t1(), t1()])])).unwrap();
        let Err(e) = b.finish() else { panic!("finish accepted an ever-growing equivalence") };
        assert!(e.message.contains("m.grow/1 is cyclically equivalent"), "{}", e.message);
    }

    #[test]
    fn nested_identity_equivalences_are_accepted() {
        let mut b = TypeTableBuilder::new(RuntimeConfig::default());
        let int = PseudoTypeInfo::base(b.builtins().int);
        let id = b.declare("m", "id", 1).unwrap();
        let k = b.declare("m", "k", 0).unwrap();
        b.define_equiv(id, PseudoTypeInfo::var(1)).unwrap();
        b.define_equiv(k, PseudoTypeInfo::apply(id, [PseudoTypeInfo::apply(id, [int])])).unwrap();
        let table = b.finish().unwrap();
        let int = TypeInfo::base(table.builtins.int);
        assert_eq!(table.expand_equivs(&TypeInfo::base(k)), int);
    }

    #[test]
    fn lookup_by_name() {
        let (rt, types) = runtime(TagBits::Two);
        assert_eq!(rt.table.lookup("list", "list", 1), Some(types.list));
        assert_eq!(rt.table.lookup("list", "list", 2), None);
        assert_eq!(rt.table.lookup("builtin", "int", 0), Some(types.int));
        assert_eq!(rt.table.lookup("array", "array", 1), Some(types.array));
    }
}
