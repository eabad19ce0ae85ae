// Copyright (c) 2025 knix
// All rights reserved.

//! `univ`: a value packed together with its type info, as the two-word cell
//! `[type_info, data]`. The pair is only ever created and taken apart as a
//! whole.

use crate::dispatch::Runtime;
use crate::heap::Word;
use crate::typeinfo::TypeInfo;

pub const UNIV_OFFSET_FOR_TYPEINFO: usize = 0;
pub const UNIV_OFFSET_FOR_DATA: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Univ(Word);

impl Univ {
    pub fn from_word(word: Word) -> Univ {
        Univ(word)
    }

    pub fn word(self) -> Word {
        self.0
    }

    /// `type_to_univ`
    pub fn new(rt: &mut Runtime, ti: &TypeInfo, value: Word) -> Univ {
        let ti_word = ti.to_word(&rt.table, &mut rt.heap);
        Univ(rt.heap.alloc(&[ti_word, value]))
    }

    pub fn type_info(self, rt: &Runtime) -> Option<TypeInfo> {
        let ti_word = rt.heap.field(self.0, UNIV_OFFSET_FOR_TYPEINFO)?;
        TypeInfo::from_word(&rt.table, &rt.heap, ti_word)
    }

    pub fn value(self, rt: &Runtime) -> Option<Word> {
        rt.heap.field(self.0, UNIV_OFFSET_FOR_DATA)
    }

    /// `univ_to_type`: the value, if the stored type is exactly `ti`
    pub fn to_type(self, rt: &Runtime, ti: &TypeInfo) -> Option<Word> {
        let stored = self.type_info(rt)?;
        if stored != *ti {
            return None;
        }
        self.value(rt)
    }

    pub fn type_name(self, rt: &Runtime) -> Option<String> {
        self.type_info(rt).map(|ti| rt.type_info_to_string(&ti))
    }
}
