// Copyright (c) 2025 knix
// All rights reserved.

//! Special operations of the builtin types.

use std::cmp::Ordering;

use crate::dispatch::{Comparison, Runtime, SpecialPreds};
use crate::heap::{Word, float_to_word, word_to_float};
use crate::typeinfo::TypeInfo;
use crate::univ::Univ;

fn no_index(_rt: &Runtime, _ti: &TypeInfo, _x: Word) -> i64 {
    -1
}

fn ordered<T: PartialOrd>(x: T, y: T) -> Comparison {
    if x < y {
        Comparison::Less
    } else if x > y {
        Comparison::Greater
    } else {
        Comparison::Equal
    }
}

// int

fn int_unify(_rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> bool {
    x == y
}

fn int_compare(_rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    ordered(x as i64, y as i64)
}

fn int_to_string(_rt: &Runtime, _ti: &TypeInfo, x: Word) -> Option<String> {
    Some((x as i64).to_string())
}

fn int_from_string(_rt: &mut Runtime, _ti: &TypeInfo, s: &str) -> Option<Word> {
    s.parse::<i64>().ok().map(|i| i as Word)
}

pub const INT: SpecialPreds = SpecialPreds {
    unify: int_unify,
    index: no_index,
    compare: int_compare,
    to_string: Some(int_to_string),
    from_string: Some(int_from_string),
};

// character

fn char_compare(_rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    ordered(x as u32, y as u32)
}

fn char_to_string(_rt: &Runtime, _ti: &TypeInfo, x: Word) -> Option<String> {
    char::from_u32(x as u32).map(|c| c.to_string())
}

fn char_from_string(_rt: &mut Runtime, _ti: &TypeInfo, s: &str) -> Option<Word> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c as Word)
}

pub const CHARACTER: SpecialPreds = SpecialPreds {
    unify: int_unify,
    index: no_index,
    compare: char_compare,
    to_string: Some(char_to_string),
    from_string: Some(char_from_string),
};

// float

fn float_unify(_rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> bool {
    word_to_float(x) == word_to_float(y)
}

fn float_compare(_rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    ordered(word_to_float(x), word_to_float(y))
}

fn float_to_string(_rt: &Runtime, _ti: &TypeInfo, x: Word) -> Option<String> {
    Some(format!("{:?}", word_to_float(x)))
}

fn float_from_string(_rt: &mut Runtime, _ti: &TypeInfo, s: &str) -> Option<Word> {
    s.parse::<f64>().ok().map(float_to_word)
}

pub const FLOAT: SpecialPreds = SpecialPreds {
    unify: float_unify,
    index: no_index,
    compare: float_compare,
    to_string: Some(float_to_string),
    from_string: Some(float_from_string),
};

// string

fn expect_string(rt: &Runtime, x: Word) -> String {
    rt.heap.read_string(x).unwrap_or_else(|| panic!("no string at {x:#x}"))
}

fn string_unify(rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> bool {
    x == y || expect_string(rt, x) == expect_string(rt, y)
}

fn string_compare(rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    expect_string(rt, x).cmp(&expect_string(rt, y)).into()
}

fn string_to_string(rt: &Runtime, _ti: &TypeInfo, x: Word) -> Option<String> {
    rt.heap.read_string(x)
}

fn string_from_string(rt: &mut Runtime, _ti: &TypeInfo, s: &str) -> Option<Word> {
    Some(rt.heap.alloc_string(s))
}

pub const STRING: SpecialPreds = SpecialPreds {
    unify: string_unify,
    index: no_index,
    compare: string_compare,
    to_string: Some(string_to_string),
    from_string: Some(string_from_string),
};

// univ: type first, then the value through the stored type

fn expect_univ(rt: &Runtime, x: Word) -> (TypeInfo, Word) {
    let univ = Univ::from_word(x);
    match (univ.type_info(rt), univ.value(rt)) {
        (Some(ti), Some(value)) => (ti, value),
        _ => panic!("no univ at {x:#x}"),
    }
}

fn univ_unify(rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> bool {
    let (x_ti, x_value) = expect_univ(rt, x);
    let (y_ti, y_value) = expect_univ(rt, y);
    x_ti == y_ti && rt.unify(&x_ti, x_value, y_value)
}

fn univ_compare(rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    let (x_ti, x_value) = expect_univ(rt, x);
    let (y_ti, y_value) = expect_univ(rt, y);
    match x_ti.compare(&y_ti, &rt.table) {
        Ordering::Equal => rt.compare(&x_ti, x_value, y_value),
        ord => ord.into(),
    }
}

pub const UNIV: SpecialPreds = SpecialPreds {
    unify: univ_unify,
    index: no_index,
    compare: univ_compare,
    to_string: None,
    from_string: None,
};

// array: [size, elements...]

fn expect_array<'h>(rt: &'h Runtime, x: Word) -> &'h [Word] {
    let size = rt.heap.get(x).unwrap_or_else(|| panic!("no array at {x:#x}"));
    rt.heap
        .slice(x + crate::heap::WORD_BYTES, size as usize)
        .unwrap_or_else(|| panic!("array at {x:#x} runs off the heap"))
}

fn expect_elem_type(ti: &TypeInfo) -> &TypeInfo {
    match ti.args().first() {
        Some(elem) => elem,
        None => panic!("array type info without an element type"),
    }
}

fn array_unify(rt: &Runtime, ti: &TypeInfo, x: Word, y: Word) -> bool {
    let elem = expect_elem_type(ti);
    let xs = expect_array(rt, x);
    let ys = expect_array(rt, y);
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(a, b)| rt.unify(elem, *a, *b))
}

fn array_compare(rt: &Runtime, ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    let elem = expect_elem_type(ti);
    let xs = expect_array(rt, x);
    let ys = expect_array(rt, y);
    for (a, b) in xs.iter().zip(ys) {
        match rt.compare(elem, *a, *b) {
            Comparison::Equal => {}
            res => return res,
        }
    }
    xs.len().cmp(&ys.len()).into()
}

pub const ARRAY: SpecialPreds = SpecialPreds {
    unify: array_unify,
    index: no_index,
    compare: array_compare,
    to_string: None,
    from_string: None,
};

// type_info values

fn expect_type_info(rt: &Runtime, x: Word) -> TypeInfo {
    TypeInfo::from_word(&rt.table, &rt.heap, x).unwrap_or_else(|| panic!("no type info at {x:#x}"))
}

fn type_info_unify(rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> bool {
    expect_type_info(rt, x) == expect_type_info(rt, y)
}

fn type_info_compare(rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    expect_type_info(rt, x).compare(&expect_type_info(rt, y), &rt.table).into()
}

pub const TYPE_INFO: SpecialPreds = SpecialPreds {
    unify: type_info_unify,
    index: no_index,
    compare: type_info_compare,
    to_string: None,
    from_string: None,
};

// c_pointer: by address

fn c_pointer_compare(_rt: &Runtime, _ti: &TypeInfo, x: Word, y: Word) -> Comparison {
    ordered(x, y)
}

pub const C_POINTER: SpecialPreds = SpecialPreds {
    unify: int_unify,
    index: no_index,
    compare: c_pointer_compare,
    to_string: None,
    from_string: None,
};

// pred, func and void have no meaningful equality or order

fn higher_order_unify(_rt: &Runtime, _ti: &TypeInfo, _x: Word, _y: Word) -> bool {
    panic!("attempted unification of higher-order terms")
}

fn higher_order_compare(_rt: &Runtime, _ti: &TypeInfo, _x: Word, _y: Word) -> Comparison {
    panic!("attempted comparison of higher-order terms")
}

fn higher_order_index(_rt: &Runtime, _ti: &TypeInfo, _x: Word) -> i64 {
    panic!("attempted index of higher-order term")
}

pub const HIGHER_ORDER: SpecialPreds = SpecialPreds {
    unify: higher_order_unify,
    index: higher_order_index,
    compare: higher_order_compare,
    to_string: None,
    from_string: None,
};

fn void_unify(_rt: &Runtime, _ti: &TypeInfo, _x: Word, _y: Word) -> bool {
    panic!("attempted unification of void values")
}

fn void_compare(_rt: &Runtime, _ti: &TypeInfo, _x: Word, _y: Word) -> Comparison {
    panic!("attempted comparison of void values")
}

fn void_index(_rt: &Runtime, _ti: &TypeInfo, _x: Word) -> i64 {
    panic!("attempted index of void value")
}

pub const VOID: SpecialPreds = SpecialPreds {
    unify: void_unify,
    index: void_index,
    compare: void_compare,
    to_string: None,
    from_string: None,
};
