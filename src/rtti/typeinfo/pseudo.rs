// Copyright (c) 2025 knix
// All rights reserved.

use crate::heap::MAX_VARINT;
use crate::typeinfo::{HigherOrderKind, TypeCtorId, TypeInfo};

/// A type expression that may mention type variables. Argument types of
/// constructors and the types of live variables are stored this way and
/// instantiated against concrete type parameters when needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoTypeInfo {
    /// 1-based, at most `MAX_VARINT`
    Var(u32),
    Ctor { ctor: TypeCtorId, args: Vec<PseudoTypeInfo> },
    HigherOrder { kind: HigherOrderKind, args: Vec<PseudoTypeInfo> },
}

impl PseudoTypeInfo {
    pub fn var(n: u32) -> PseudoTypeInfo {
        debug_assert!(n >= 1 && n as u64 <= MAX_VARINT, "type variable {n} out of range");
        PseudoTypeInfo::Var(n)
    }

    pub fn base(ctor: TypeCtorId) -> PseudoTypeInfo {
        PseudoTypeInfo::Ctor { ctor, args: Vec::new() }
    }

    pub fn apply(ctor: TypeCtorId, args: impl IntoIterator<Item = PseudoTypeInfo>) -> PseudoTypeInfo {
        PseudoTypeInfo::Ctor { ctor, args: args.into_iter().collect() }
    }

    pub fn is_ground(&self) -> bool {
        match self {
            PseudoTypeInfo::Var(_) => false,
            PseudoTypeInfo::Ctor { args, .. } | PseudoTypeInfo::HigherOrder { args, .. } => {
                args.iter().all(|a| a.is_ground())
            }
        }
    }

    /// Highest variable number mentioned, 0 if ground
    pub fn max_var(&self) -> u32 {
        match self {
            PseudoTypeInfo::Var(n) => *n,
            PseudoTypeInfo::Ctor { args, .. } | PseudoTypeInfo::HigherOrder { args, .. } => {
                args.iter().map(|a| a.max_var()).max().unwrap_or(0)
            }
        }
    }

    /// Replaces variable `n` with `params[n - 1]`. `None` if any variable is
    /// out of range.
    pub fn instantiate(&self, params: &[TypeInfo]) -> Option<TypeInfo> {
        self.instantiate_with(&|n| params.get(n as usize - 1).cloned())
    }

    pub fn instantiate_with(&self, lookup: &impl Fn(u32) -> Option<TypeInfo>) -> Option<TypeInfo> {
        match self {
            PseudoTypeInfo::Var(n) => {
                if *n == 0 {
                    return None;
                }
                lookup(*n)
            }
            PseudoTypeInfo::Ctor { ctor, args } => {
                let args =
                    args.iter().map(|a| a.instantiate_with(lookup)).collect::<Option<Vec<_>>>()?;
                Some(TypeInfo::Ctor { ctor: *ctor, args })
            }
            PseudoTypeInfo::HigherOrder { kind, args } => {
                let args =
                    args.iter().map(|a| a.instantiate_with(lookup)).collect::<Option<Vec<_>>>()?;
                Some(TypeInfo::HigherOrder { kind: *kind, args })
            }
        }
    }
}

impl From<&TypeInfo> for PseudoTypeInfo {
    fn from(ti: &TypeInfo) -> Self {
        match ti {
            TypeInfo::Ctor { ctor, args } => {
                PseudoTypeInfo::Ctor { ctor: *ctor, args: args.iter().map(PseudoTypeInfo::from).collect() }
            }
            TypeInfo::HigherOrder { kind, args } => PseudoTypeInfo::HigherOrder {
                kind: *kind,
                args: args.iter().map(PseudoTypeInfo::from).collect(),
            },
        }
    }
}
