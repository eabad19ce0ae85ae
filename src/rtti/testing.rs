// Copyright (c) 2025 knix
// All rights reserved.

//! Small type tables shared by the unit tests.

use crate::config::RuntimeConfig;
use crate::dispatch::Runtime;
use crate::heap::Word;
use crate::tags::TagBits;
use crate::typeinfo::table::{CtorDecl, TypeTableBuilder};
use crate::typeinfo::{PseudoTypeInfo, TypeCtorId, TypeInfo};

#[derive(Debug, Clone, Copy)]
pub struct Types {
    pub int: TypeCtorId,
    pub array: TypeCtorId,
    /// `list(T)`: `[]` and `[|](T, list(T))`
    pub list: TypeCtorId,
    /// `maybe(T)`: `no` and `yes(T)`
    pub maybe: TypeCtorId,
    /// `tree(T)`: `empty`, `leaf(T)` and `node(tree(T), T, tree(T))`
    pub tree: TypeCtorId,
    /// One constant and five functors, enough to share a tag under two bits
    pub shape: TypeCtorId,
    /// `red`, `green`, `blue`
    pub color: TypeCtorId,
    /// `wrap(int)`
    pub wrapper: TypeCtorId,
    /// `== int`
    pub money: TypeCtorId,
    /// `== list(int)`
    pub ints: TypeCtorId,
    /// `lit(int)`, `neg(expr)`, `block(stmt)`
    pub expr: TypeCtorId,
    /// `skip`, `eval(expr)`, `seq(stmt, stmt)`
    pub stmt: TypeCtorId,
}

impl Types {
    pub fn int(&self) -> TypeInfo {
        TypeInfo::base(self.int)
    }

    pub fn list_of(&self, elem: TypeInfo) -> TypeInfo {
        TypeInfo::apply(self.list, [elem])
    }

    pub fn list_int(&self) -> TypeInfo {
        self.list_of(self.int())
    }
}

pub fn runtime_with(config: RuntimeConfig) -> (Runtime, Types) {
    let mut b = TypeTableBuilder::new(config);
    let builtins = b.builtins();
    let int = PseudoTypeInfo::base(builtins.int);

    let list = b.declare("list", "list", 1).unwrap();
    let maybe = b.declare("maybe", "maybe", 1).unwrap();
    let tree = b.declare("tree", "tree", 1).unwrap();
    let shape = b.declare("shapes", "shape", 0).unwrap();
    let color = b.declare("colors", "color", 0).unwrap();
    let wrapper = b.declare("wrapper", "wrapper", 0).unwrap();
    let money = b.declare("money", "money", 0).unwrap();
    let ints = b.declare("money", "ints", 0).unwrap();
    let expr = b.declare("lang", "expr", 0).unwrap();
    let stmt = b.declare("lang", "stmt", 0).unwrap();

    let t1 = || PseudoTypeInfo::var(1);
    b.define_du(
        list,
        [CtorDecl::constant("[]"), CtorDecl::new("[|]", [t1(), PseudoTypeInfo::apply(list, [t1()])])],
    )
    .unwrap();
    b.define_du(maybe, [CtorDecl::constant("no"), CtorDecl::new("yes", [t1()])]).unwrap();
    let tree_t = || PseudoTypeInfo::apply(tree, [t1()]);
    b.define_du(
        tree,
        [
            CtorDecl::constant("empty"),
            CtorDecl::new("leaf", [t1()]),
            CtorDecl::new("node", [tree_t(), t1(), tree_t()]),
        ],
    )
    .unwrap();
    b.define_du(
        shape,
        [
            CtorDecl::constant("none"),
            CtorDecl::new("circle", [int.clone()]),
            CtorDecl::new("square", [int.clone()]),
            CtorDecl::new("rect", [int.clone(), int.clone()]),
            CtorDecl::new("tri", [int.clone(), int.clone(), int.clone()]),
            CtorDecl::new("poly", [PseudoTypeInfo::apply(list, [int.clone()])]),
        ],
    )
    .unwrap();
    b.define_du(color, ["red", "green", "blue"].map(|n| CtorDecl::constant(n))).unwrap();
    b.define_du(wrapper, [CtorDecl::new("wrap", [int.clone()])]).unwrap();
    b.define_equiv(money, int.clone()).unwrap();
    b.define_equiv(ints, PseudoTypeInfo::apply(list, [int.clone()])).unwrap();
    b.define_du(
        expr,
        [
            CtorDecl::new("lit", [int.clone()]),
            CtorDecl::new("neg", [PseudoTypeInfo::base(expr)]),
            CtorDecl::new("block", [PseudoTypeInfo::base(stmt)]),
        ],
    )
    .unwrap();
    b.define_du(
        stmt,
        [
            CtorDecl::constant("skip"),
            CtorDecl::new("eval", [PseudoTypeInfo::base(expr)]),
            CtorDecl::new("seq", [PseudoTypeInfo::base(stmt), PseudoTypeInfo::base(stmt)]),
        ],
    )
    .unwrap();

    let table = b.finish().unwrap();
    let types = Types {
        int: builtins.int,
        array: builtins.array,
        list,
        maybe,
        tree,
        shape,
        color,
        wrapper,
        money,
        ints,
        expr,
        stmt,
    };
    (Runtime::new(table), types)
}

pub fn runtime(bits: TagBits) -> (Runtime, Types) {
    runtime_with(RuntimeConfig::with_tag_bits(bits))
}

pub fn make_list(rt: &mut Runtime, elem: &TypeInfo, items: &[Word]) -> Word {
    let list_ti = TypeInfo::apply(rt.table.lookup("list", "list", 1).unwrap(), [elem.clone()]);
    let mut tail = rt.construct_named(&list_ti, "[]", &[]).unwrap();
    for item in items.iter().rev() {
        tail = rt.construct_named(&list_ti, "[|]", &[*item, tail]).unwrap();
    }
    tail
}

pub fn make_int_list(rt: &mut Runtime, types: &Types, items: &[i64]) -> Word {
    let words: Vec<Word> = items.iter().map(|i| *i as Word).collect();
    make_list(rt, &types.int(), &words)
}
