// Copyright (c) 2025 knix
// All rights reserved.

use std::fmt::{Display, Formatter};

use crate::error::{ErrorKind, RttiResult};
use crate::heap::Word;
use crate::{SV8, failf};

/// Number of low bits of a word that carry a primary tag.
///
/// Only the four counts below have a layout scheme; anything else is
/// rejected when the scheme is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagBits {
    Zero,
    One,
    Two,
    Three,
}

pub const DEFAULT_TAG_BITS: TagBits = TagBits::from_count(2);

impl TagBits {
    pub const ALL: [TagBits; 4] = [TagBits::Zero, TagBits::One, TagBits::Two, TagBits::Three];

    /// Panics on an unsupported count, which in a `const` context is a
    /// compile error.
    pub const fn from_count(count: u32) -> TagBits {
        match count {
            0 => TagBits::Zero,
            1 => TagBits::One,
            2 => TagBits::Two,
            3 => TagBits::Three,
            _ => panic!("no layout scheme is defined for this number of tag bits"),
        }
    }

    pub fn try_from_count(count: u32) -> RttiResult<TagBits> {
        match count {
            0..=3 => Ok(TagBits::from_count(count)),
            n => failf!(ErrorKind::Config, "no layout scheme is defined for {n} tag bits"),
        }
    }

    pub const fn count(self) -> u32 {
        match self {
            TagBits::Zero => 0,
            TagBits::One => 1,
            TagBits::Two => 2,
            TagBits::Three => 3,
        }
    }

    pub const fn num_tags(self) -> u32 {
        1 << self.count()
    }

    pub const fn mask(self) -> Word {
        (self.num_tags() - 1) as Word
    }

    pub const fn tag(self, word: Word) -> u32 {
        (word & self.mask()) as u32
    }

    /// The word with its tag bits cleared; for a tagged pointer, the address.
    pub const fn strip(self, word: Word) -> Word {
        word & !self.mask()
    }

    pub const fn mkword(self, tag: u32, body: Word) -> Word {
        debug_assert!(tag < self.num_tags());
        body + tag as Word
    }

    pub const fn mkbody(self, value: Word) -> Word {
        value << self.count()
    }

    pub const fn unmkbody(self, word: Word) -> Word {
        word >> self.count()
    }

    /// The last primary tag, shared by every functor that did not get a tag
    /// of its own.
    pub const fn last_tag(self) -> u32 {
        self.num_tags() - 1
    }

    /// One copy of `entry` per primary tag.
    pub fn for_all_tags<T: Clone>(self, entry: T) -> SV8<T> {
        std::iter::repeat_n(entry, self.num_tags() as usize).collect()
    }
}

impl Display for TagBits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} tag bits", self.count())
    }
}
