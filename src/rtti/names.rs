// Copyright (c) 2025 knix
// All rights reserved.

use std::fmt::{Display, Formatter};

use string_interner::{StringInterner, Symbol, backend::StringBackend};

/// Interned module, type, functor and class name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Name(string_interner::symbol::SymbolU32);

impl From<Name> for usize {
    fn from(value: Name) -> Self {
        value.0.to_usize()
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0.to_usize())
    }
}

pub struct Names {
    intern_pool: StringInterner<StringBackend>,
}

impl Default for Names {
    fn default() -> Self {
        Names::with_capacity(256)
    }
}

impl Names {
    pub fn with_capacity(capacity: usize) -> Names {
        Names { intern_pool: StringInterner::with_capacity(capacity) }
    }

    pub fn intern(&mut self, s: impl AsRef<str>) -> Name {
        Name(self.intern_pool.get_or_intern(s.as_ref()))
    }

    pub fn find(&self, s: impl AsRef<str>) -> Option<Name> {
        self.intern_pool.get(s.as_ref()).map(Name)
    }

    pub fn get(&self, name: Name) -> &str {
        self.intern_pool
            .resolve(name.0)
            .unwrap_or_else(|| panic!("Name {} was interned elsewhere", name))
    }

    pub fn len(&self) -> usize {
        self.intern_pool.len()
    }
}
