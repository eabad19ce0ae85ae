// Copyright (c) 2025 knix
// All rights reserved.

#[cfg(test)]
mod dispatch_tests {
    use std::cmp::Ordering;

    use crate::config::RuntimeConfig;
    use crate::dispatch::*;
    use crate::heap::{Word, float_to_word};
    use crate::tags::TagBits;
    use crate::testing::{make_int_list, runtime, runtime_with};
    use crate::typeinfo::TypeInfo;
    use crate::univ::Univ;

    #[test]
    fn comparison_codes() {
        assert_eq!(Comparison::Equal.code(), 0);
        assert_eq!(Comparison::Less.code(), 1);
        assert_eq!(Comparison::Greater.code(), 2);
        for c in [Comparison::Equal, Comparison::Less, Comparison::Greater] {
            assert_eq!(Comparison::from_code(c.code()), Some(c));
            assert_eq!(Comparison::from(c.to_ordering()), c);
        }
        assert_eq!(Comparison::from_code(3), None);
    }

    #[test]
    fn lists_compare_lexicographically() {
        for bits in TagBits::ALL {
            let (mut rt, types) = runtime(bits);
            let ti = types.list_int();
            let a = make_int_list(&mut rt, &types, &[1, 2, 3]);
            let b = make_int_list(&mut rt, &types, &[1, 2, 4]);
            let c = make_int_list(&mut rt, &types, &[1, 2]);
            let a2 = make_int_list(&mut rt, &types, &[1, 2, 3]);
            assert_eq!(rt.compare(&ti, a, b), Comparison::Less, "{bits}");
            assert_eq!(rt.compare(&ti, b, a), Comparison::Greater, "{bits}");
            // `[]` is declared before `[|]`
            assert_eq!(rt.compare(&ti, c, a), Comparison::Less, "{bits}");
            assert_eq!(rt.compare(&ti, a, a2), Comparison::Equal, "{bits}");
            assert!(rt.unify(&ti, a, a2));
            assert!(!rt.unify(&ti, a, c));
        }
    }

    #[test]
    fn negative_ints_order_as_signed() {
        let (rt, types) = runtime(TagBits::Two);
        assert_eq!(rt.compare(&types.int(), -5i64 as Word, 3), Comparison::Less);
    }

    #[test]
    fn enums_compare_in_declaration_order() {
        let (mut rt, types) = runtime(TagBits::Two);
        let color = TypeInfo::base(types.color);
        let red = rt.construct_named(&color, "red", &[]).unwrap();
        let blue = rt.construct_named(&color, "blue", &[]).unwrap();
        assert_eq!(rt.compare(&color, red, blue), Comparison::Less);
        assert_eq!(rt.index(&color, blue), 2);
    }

    #[test]
    fn index_is_the_declaration_ordinal() {
        for bits in TagBits::ALL {
            let (mut rt, types) = runtime(bits);
            let shape = TypeInfo::base(types.shape);
            let none = rt.construct_named(&shape, "none", &[]).unwrap();
            let tri = rt.construct_named(&shape, "tri", &[1, 2, 3]).unwrap();
            let circle = rt.construct_named(&shape, "circle", &[1]).unwrap();
            assert_eq!(rt.index(&shape, none), 0);
            assert_eq!(rt.index(&shape, circle), 1);
            assert_eq!(rt.index(&shape, tri), 4);
            assert_eq!(rt.compare(&shape, tri, circle), Comparison::Greater);
            assert_eq!(rt.index(&types.int(), 7), -1);
        }
    }

    #[test]
    fn equivalences_dispatch_to_their_target() {
        let (mut rt, types) = runtime(TagBits::Two);
        let money = TypeInfo::base(types.money);
        assert_eq!(rt.compare(&money, 10, 20), Comparison::Less);
        assert!(rt.unify(&money, 10, 10));
        let ints = TypeInfo::base(types.ints);
        let a = make_int_list(&mut rt, &types, &[2]);
        let b = make_int_list(&mut rt, &types, &[1, 5]);
        assert_eq!(rt.compare(&ints, a, b), Comparison::Greater);
        assert_eq!(rt.index(&ints, a), 1);
    }

    #[test]
    fn univs_compare_type_first() {
        let (mut rt, types) = runtime(TagBits::Two);
        let b = rt.table.builtins;
        let univ = TypeInfo::base(b.univ);
        let s = rt.heap.alloc_string("a");
        let u_int = Univ::new(&mut rt, &types.int(), 100);
        let u_string = Univ::new(&mut rt, &TypeInfo::base(b.string), s);
        let u_int2 = Univ::new(&mut rt, &types.int(), 3);
        assert_eq!(rt.compare(&univ, u_int.word(), u_string.word()), Comparison::Less);
        assert_eq!(rt.compare(&univ, u_int.word(), u_int2.word()), Comparison::Greater);
        assert!(!rt.unify(&univ, u_int.word(), u_string.word()));
        assert_eq!(u_int.to_type(&rt, &types.int()), Some(100));
        assert_eq!(u_int.to_type(&rt, &TypeInfo::base(b.string)), None);
        assert_eq!(u_string.type_name(&rt).as_deref(), Some("string"));
    }

    #[test]
    fn builtin_comparisons() {
        let (mut rt, types) = runtime(TagBits::Two);
        let b = rt.table.builtins;
        let float = TypeInfo::base(b.float);
        assert_eq!(rt.compare(&float, float_to_word(-1.0), float_to_word(0.5)), Comparison::Less);
        assert_eq!(rt.compare(&float, float_to_word(f64::NAN), float_to_word(1.0)), Comparison::Equal);

        let string = TypeInfo::base(b.string);
        let abc = rt.heap.alloc_string("abc");
        let abd = rt.heap.alloc_string("abd");
        let abc2 = rt.heap.alloc_string("abc");
        assert_eq!(rt.compare(&string, abc, abd), Comparison::Less);
        assert!(rt.unify(&string, abc, abc2));

        let array = TypeInfo::apply(b.array, [types.int()]);
        let short = rt.heap.alloc(&[2, 1, 2]);
        let long = rt.heap.alloc(&[3, 1, 2, 0]);
        let bigger = rt.heap.alloc(&[1, 5]);
        assert_eq!(rt.compare(&array, short, long), Comparison::Less);
        assert_eq!(rt.compare(&array, bigger, long), Comparison::Greater);

        let ti = TypeInfo::base(b.type_info);
        let list_word = types.list_int().to_word(&rt.table, &mut rt.heap);
        let int_word = types.int().to_word(&rt.table, &mut rt.heap);
        assert_eq!(rt.compare(&ti, int_word, list_word), Comparison::Less);
        assert_eq!(types.int().compare(&types.list_int(), &rt.table), Ordering::Less);
    }

    #[test]
    fn conversions() {
        let (mut rt, types) = runtime(TagBits::Two);
        let b = rt.table.builtins;
        assert_eq!(rt.to_string(&types.int(), -12i64 as Word).as_deref(), Some("-12"));
        assert_eq!(rt.from_string(&types.int(), "-12"), Some(-12i64 as Word));
        assert_eq!(rt.from_string(&types.int(), "twelve"), None);
        let float = TypeInfo::base(b.float);
        assert_eq!(rt.to_string(&float, float_to_word(2.0)).as_deref(), Some("2.0"));
        let character = TypeInfo::base(b.character);
        assert_eq!(rt.from_string(&character, "q"), Some('q' as Word));
        assert_eq!(rt.from_string(&character, "qq"), None);
        let string = TypeInfo::base(b.string);
        let word = rt.from_string(&string, "hi").unwrap();
        assert_eq!(rt.to_string(&string, word).as_deref(), Some("hi"));
        assert_eq!(rt.to_string(&types.list_int(), 0), None);
    }

    #[test]
    fn base_slots() {
        let (rt, types) = runtime(TagBits::Two);
        let int = rt.table.ctor(types.int);
        assert!(matches!(base_slot(int, OFFSET_FOR_COUNT), Some(BaseSlot::Count(5))));
        assert!(matches!(base_slot(int, OFFSET_FOR_TO_STRING_PRED), Some(BaseSlot::ToString(_))));
        assert!(matches!(base_slot(int, OFFSET_FOR_FROM_STRING_PRED), Some(BaseSlot::FromString(_))));
        assert!(matches!(base_slot(int, 10), None));
        let list = rt.table.ctor(types.list);
        assert!(matches!(base_slot(list, OFFSET_FOR_COUNT), Some(BaseSlot::Count(3))));
        assert!(matches!(base_slot(list, OFFSET_FOR_TO_STRING_PRED), None));
        match base_slot(list, OFFSET_FOR_TYPE_NAME) {
            Some(BaseSlot::TypeName(name)) => assert_eq!(rt.table.name(name), "list"),
            other => panic!("unexpected slot {other:?}"),
        }
        match base_slot(list, OFFSET_FOR_BASE_TYPE_FUNCTORS) {
            Some(BaseSlot::Functors(functors)) => assert_eq!(functors.num_functors(), Some(2)),
            other => panic!("unexpected slot {other:?}"),
        }
        if let Some(BaseSlot::Compare(compare)) = base_slot(int, OFFSET_FOR_COMPARE_PRED) {
            assert_eq!(compare(&rt, &types.int(), 1, 2), Comparison::Less);
        } else {
            panic!("no compare slot");
        }
    }

    #[test]
    fn without_extended_preds_there_are_no_conversions() {
        let (mut rt, types) = runtime_with(RuntimeConfig {
            tag_bits: TagBits::Two,
            extended_special_preds: false,
        });
        let int = rt.table.ctor(types.int);
        assert!(matches!(base_slot(int, OFFSET_FOR_COUNT), Some(BaseSlot::Count(3))));
        assert!(base_slot(int, OFFSET_FOR_TO_STRING_PRED).is_none());
        assert_eq!(rt.to_string(&types.int(), 1), None);
        assert_eq!(rt.from_string(&types.int(), "1"), None);
        assert_eq!(rt.compare(&types.int(), 1, 2), Comparison::Less);
    }

    #[test]
    #[should_panic(expected = "attempted comparison of higher-order terms")]
    fn higher_order_comparison_panics() {
        let (rt, types) = runtime(TagBits::Two);
        rt.compare(&TypeInfo::pred([types.int()]), 1, 2);
    }

    #[test]
    #[should_panic(expected = "attempted unification of higher-order terms")]
    fn higher_order_unification_panics() {
        let (rt, types) = runtime(TagBits::Two);
        rt.unify(&TypeInfo::func([], types.int()), 1, 1);
    }

    #[test]
    #[should_panic(expected = "attempted comparison of void values")]
    fn void_comparison_panics() {
        let (rt, _) = runtime(TagBits::Two);
        let void = TypeInfo::base(rt.table.builtins.void);
        rt.compare(&void, 0, 0);
    }
}
