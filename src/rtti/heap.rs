// Copyright (c) 2025 knix
// All rights reserved.

//! Word-addressed heap that values and type infos live in.
//!
//! Cells are 8-byte aligned and start at [`HEAP_BASE`], so a heap address is
//! never mistaken for a type variable number or a static table reference.

use crate::typeclass::BaseTypeclassId;
use crate::typeinfo::TypeCtorId;

pub type Word = u64;

pub const WORD_BYTES: Word = 8;

/// Highest type variable number, and highest higher-order arity. Words in
/// `1..=MAX_VARINT` found where a type info is expected are variables.
pub const MAX_VARINT: Word = 1024;

pub const HEAP_BASE: Word = 0x1_0000;

const STATIC_REF_SHIFT: u32 = 2;
const STATIC_REF_CTOR: Word = 0b01;
const STATIC_REF_TYPECLASS: Word = 0b11;

/// A reference into the static tables, as stored in a word.
///
/// Always odd and always above [`MAX_VARINT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticRef {
    Ctor(TypeCtorId),
    TypeclassBase(BaseTypeclassId),
}

impl StaticRef {
    pub fn to_word(self) -> Word {
        let (index, kind) = match self {
            StaticRef::Ctor(id) => (id.as_u32(), STATIC_REF_CTOR),
            StaticRef::TypeclassBase(id) => (id.as_u32(), STATIC_REF_TYPECLASS),
        };
        ((index as Word + MAX_VARINT + 1) << STATIC_REF_SHIFT) | kind
    }

    pub fn from_word(word: Word) -> Option<StaticRef> {
        if word & 1 == 0 {
            return None;
        }
        let index = (word >> STATIC_REF_SHIFT).checked_sub(MAX_VARINT + 1)?;
        let index = u32::try_from(index).ok()?;
        match word & 0b11 {
            STATIC_REF_CTOR => TypeCtorId::from_u32(index).map(StaticRef::Ctor),
            STATIC_REF_TYPECLASS => BaseTypeclassId::from_u32(index).map(StaticRef::TypeclassBase),
            _ => None,
        }
    }
}

pub fn float_to_word(f: f64) -> Word {
    f.to_bits()
}

pub fn word_to_float(w: Word) -> f64 {
    f64::from_bits(w)
}

#[derive(Default)]
pub struct Heap {
    cells: Vec<Word>,
}

impl Heap {
    pub fn new() -> Heap {
        Heap { cells: Vec::with_capacity(1024) }
    }

    /// The address the next allocation will get; the `hp` register.
    pub fn hp(&self) -> Word {
        HEAP_BASE + self.cells.len() as Word * WORD_BYTES
    }

    pub fn alloc(&mut self, words: &[Word]) -> Word {
        let addr = self.hp();
        self.cells.extend_from_slice(words);
        // Zero-sized cells still get a distinct address
        if words.is_empty() {
            self.cells.push(0);
        }
        addr
    }

    fn cell_index(&self, addr: Word) -> Option<usize> {
        let offset = addr.checked_sub(HEAP_BASE)?;
        if offset % WORD_BYTES != 0 {
            return None;
        }
        let index = (offset / WORD_BYTES) as usize;
        (index < self.cells.len()).then_some(index)
    }

    pub fn is_address(&self, word: Word) -> bool {
        self.cell_index(word).is_some()
    }

    pub fn get(&self, addr: Word) -> Option<Word> {
        self.cell_index(addr).map(|i| self.cells[i])
    }

    pub fn field(&self, addr: Word, offset: usize) -> Option<Word> {
        self.get(addr.checked_add(offset as Word * WORD_BYTES)?)
    }

    pub fn set_field(&mut self, addr: Word, offset: usize, word: Word) {
        let Some(index) = self.cell_index(addr + offset as Word * WORD_BYTES) else {
            panic!("store outside the heap at {addr:#x}+{offset}")
        };
        self.cells[index] = word;
    }

    /// `count` words starting at `addr`, if all of them are on the heap.
    pub fn slice(&self, addr: Word, count: usize) -> Option<&[Word]> {
        if count == 0 {
            // Nullary cells end exactly at their address
            let offset = addr.checked_sub(HEAP_BASE)?;
            let in_bounds = offset % WORD_BYTES == 0 && offset / WORD_BYTES <= self.cells.len() as Word;
            return in_bounds.then_some(&self.cells[..0]);
        }
        let start = self.cell_index(addr)?;
        self.cells.get(start..start.checked_add(count)?)
    }

    /// Strings are `[byte_len, packed bytes...]`, little-endian within a word.
    pub fn alloc_string(&mut self, s: &str) -> Word {
        let bytes = s.as_bytes();
        let mut words: Vec<Word> = Vec::with_capacity(1 + bytes.len().div_ceil(8));
        words.push(bytes.len() as Word);
        for chunk in bytes.chunks(8) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            words.push(Word::from_le_bytes(buf));
        }
        self.alloc(&words)
    }

    pub fn read_string(&self, addr: Word) -> Option<String> {
        let len = self.get(addr)? as usize;
        let words = self.slice(addr + WORD_BYTES, len.div_ceil(8))?;
        let mut bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        bytes.truncate(len);
        String::from_utf8(bytes).ok()
    }
}
