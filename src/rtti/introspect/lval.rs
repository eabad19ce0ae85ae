// Copyright (c) 2025 knix
// All rights reserved.

use std::fmt::{Display, Formatter};

use crate::heap::Word;

const LVAL_KIND_BITS: u32 = 4;
const LVAL_KIND_MASK: Word = (1 << LVAL_KIND_BITS) - 1;

const LVAL_REGISTER: Word = 0;
const LVAL_STACKVAR: Word = 1;
const LVAL_FRAMEVAR: Word = 2;
const LVAL_SUCCIP: Word = 3;
const LVAL_MAXFR: Word = 4;
const LVAL_CURFR: Word = 5;
const LVAL_HP: Word = 6;
const LVAL_SP: Word = 7;
const LVAL_UNKNOWN: Word = 8;

/// Fixed slots at the top of every nondet frame: prevfr, redoip, redofr,
/// succip, succfr. Frame variable `n` sits below them.
pub const NONDET_FIXED_SIZE: usize = 5;

/// Where a live value is at a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveLval {
    /// `rN`, 1-based
    Register(u32),
    /// Det stack slot `sp[-n]`
    StackVar(u32),
    /// Nondet stack slot `curfr[-(n + 4)]`
    FrameVar(u32),
    Succip,
    Maxfr,
    Curfr,
    Hp,
    Sp,
    Unknown,
}
crate::static_assert_size!(LiveLval, 8);

impl LiveLval {
    pub fn to_word(self) -> Word {
        let (kind, number) = match self {
            LiveLval::Register(n) => (LVAL_REGISTER, n),
            LiveLval::StackVar(n) => (LVAL_STACKVAR, n),
            LiveLval::FrameVar(n) => (LVAL_FRAMEVAR, n),
            LiveLval::Succip => (LVAL_SUCCIP, 0),
            LiveLval::Maxfr => (LVAL_MAXFR, 0),
            LiveLval::Curfr => (LVAL_CURFR, 0),
            LiveLval::Hp => (LVAL_HP, 0),
            LiveLval::Sp => (LVAL_SP, 0),
            LiveLval::Unknown => (LVAL_UNKNOWN, 0),
        };
        ((number as Word) << LVAL_KIND_BITS) | kind
    }

    /// Anything that does not decode is `Unknown`.
    pub fn from_word(word: Word) -> LiveLval {
        let Ok(number) = u32::try_from(word >> LVAL_KIND_BITS) else {
            return LiveLval::Unknown;
        };
        match word & LVAL_KIND_MASK {
            LVAL_REGISTER => LiveLval::Register(number),
            LVAL_STACKVAR => LiveLval::StackVar(number),
            LVAL_FRAMEVAR => LiveLval::FrameVar(number),
            LVAL_SUCCIP => LiveLval::Succip,
            LVAL_MAXFR => LiveLval::Maxfr,
            LVAL_CURFR => LiveLval::Curfr,
            LVAL_HP => LiveLval::Hp,
            LVAL_SP => LiveLval::Sp,
            _ => LiveLval::Unknown,
        }
    }

    /// Whether reading this location needs the saved registers
    pub fn needs_saved_regs(self) -> bool {
        matches!(self, LiveLval::Register(_) | LiveLval::Succip | LiveLval::Maxfr | LiveLval::Hp)
    }
}

impl Display for LiveLval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LiveLval::Register(n) => write!(f, "r{n}"),
            LiveLval::StackVar(n) => write!(f, "stackvar({n})"),
            LiveLval::FrameVar(n) => write!(f, "framevar({n})"),
            LiveLval::Succip => f.write_str("succip"),
            LiveLval::Maxfr => f.write_str("maxfr"),
            LiveLval::Curfr => f.write_str("curfr"),
            LiveLval::Hp => f.write_str("hp"),
            LiveLval::Sp => f.write_str("sp"),
            LiveLval::Unknown => f.write_str("unknown"),
        }
    }
}
