// Copyright (c) 2025 knix
// All rights reserved.

#[cfg(test)]
mod typeclass_tests {
    use crate::config::RuntimeConfig;
    use crate::dispatch::Runtime;
    use crate::typeclass::*;
    use crate::typeinfo::TypeInfo;
    use crate::typeinfo::table::TypeTableBuilder;

    struct Classes {
        /// `show(int)`: no constraints
        show_int: BaseTypeclassId,
        /// `show(pair(A, B)) <= (show(A), show(B))`
        show_pair: BaseTypeclassId,
        /// `ord(int)`, whose superclass is `eq`
        ord_int: BaseTypeclassId,
    }

    fn setup() -> (Runtime, Classes) {
        let mut b = TypeTableBuilder::new(RuntimeConfig::default());
        let methods = [ProcAddr(0x1000), ProcAddr(0x2000)];
        let classes = Classes {
            show_int: b.add_typeclass_base("show", 0, methods),
            show_pair: b.add_typeclass_base("show", 2, methods),
            ord_int: b.add_typeclass_base("ord", 0, [ProcAddr(0x3000)]),
        };
        (Runtime::new(b.finish().unwrap()), classes)
    }

    #[test]
    fn extra_items_follow_the_constraints() {
        assert_eq!(extra_slot(0, 1), 1);
        assert_eq!(extra_slot(2, 1), 3);
        assert_eq!(extra_slot(3, 4), 7);
    }

    #[test]
    fn method_lookup_ignores_instance_arity() {
        let (mut rt, c) = setup();
        let int = TypeInfo::base(rt.table.builtins.int);
        let int_word = int.to_word(&rt.table, &mut rt.heap);
        let show_int = TypeclassInfo::alloc(&mut rt, c.show_int, &[], &[int_word]);
        let show_pair = TypeclassInfo::alloc(&mut rt, c.show_pair, &[show_int, show_int], &[int_word, int_word]);
        for n in 1..=2 {
            assert_eq!(show_int.method(&rt, n), show_pair.method(&rt, n));
        }
        assert_eq!(show_pair.method(&rt, 2), Some(ProcAddr(0x2000)));
        assert_eq!(show_pair.method(&rt, 0), None);
        assert_eq!(show_pair.method(&rt, 3), None);
        assert_eq!(show_pair.class_name(&rt), "show");
        assert_eq!(show_pair.instance_arity(&rt), 2);
    }

    #[test]
    fn constraints_and_extras() {
        let (mut rt, c) = setup();
        let int = TypeInfo::base(rt.table.builtins.int);
        let string = TypeInfo::base(rt.table.builtins.string);
        let int_word = int.to_word(&rt.table, &mut rt.heap);
        let string_word = string.to_word(&rt.table, &mut rt.heap);

        let ord_int = TypeclassInfo::alloc(&mut rt, c.ord_int, &[], &[]);
        let show_int = TypeclassInfo::alloc(&mut rt, c.show_int, &[], &[int_word]);
        let show_pair = TypeclassInfo::alloc(
            &mut rt,
            c.show_pair,
            &[show_int, ord_int],
            &[ord_int.word(), int_word, string_word],
        );

        assert_eq!(show_pair.constraint(&rt, 1), Some(show_int));
        assert_eq!(show_pair.constraint(&rt, 2), Some(ord_int));
        assert_eq!(show_pair.constraint(&rt, 0), None);
        assert_eq!(show_pair.constraint(&rt, 3), None);

        assert_eq!(show_pair.superclass_info(&rt, 1), Some(ord_int));
        assert_eq!(show_pair.type_info(&rt, 2), Some(int.clone()));
        assert_eq!(show_pair.type_info(&rt, 3), Some(string));
        assert_eq!(show_pair.type_info(&rt, 4), None);
        assert_eq!(show_pair.type_info_word(&rt, 0), None);

        assert_eq!(show_int.type_info(&rt, 1), Some(int));
        assert_eq!(show_int.base_id(&rt), Some(c.show_int));
    }

    #[test]
    fn non_instances_have_no_base() {
        let (mut rt, _) = setup();
        let int_word = TypeInfo::base(rt.table.builtins.int).to_word(&rt.table, &mut rt.heap);
        let cell = rt.heap.alloc(&[int_word]);
        assert_eq!(TypeclassInfo::from_word(cell).base_id(&rt), None);
        assert_eq!(TypeclassInfo::from_word(0).base_id(&rt), None);
    }
}
