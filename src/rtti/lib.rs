// Copyright (c) 2025 knix
// All rights reserved.

//! Runtime type information for compiled code: type descriptors, layout and
//! functor tables, special-operation dispatch, typeclass infos, and the
//! introspection engine a debugger uses to recover live values at a label.

use smallvec::SmallVec;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod heap;
pub mod init;
pub mod introspect;
pub mod layout;
pub mod names;
mod pool;
pub mod tags;
pub mod typeclass;
pub mod typeinfo;
pub mod univ;

#[cfg(test)]
mod testing;

pub use dispatch::{Comparison, Runtime};
pub use error::{ErrorKind, RttiError, RttiResult};
pub use heap::{Heap, Word};
pub use tags::TagBits;
pub use typeinfo::{PseudoTypeInfo, TypeCtorId, TypeInfo, table::TypeTable};

pub type SV8<T> = SmallVec<[T; 8]>;
pub type SV4<T> = SmallVec<[T; 4]>;

#[macro_export]
macro_rules! nz_u32_id {
    ($name: ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(std::num::NonZeroU32);
        impl From<std::num::NonZeroU32> for $name {
            fn from(value: std::num::NonZeroU32) -> Self {
                Self::from_nzu32(value)
            }
        }
        impl From<$name> for std::num::NonZeroU32 {
            fn from(val: $name) -> Self {
                val.0
            }
        }
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl $name {
            pub const fn as_u32(self) -> u32 {
                self.0.get()
            }

            pub const fn from_nzu32(value: std::num::NonZeroU32) -> Self {
                $name(value)
            }
            pub const fn from_u32(value: u32) -> Option<Self> {
                match std::num::NonZeroU32::new(value) {
                    None => None,
                    Some(nz_u32) => Some($name(nz_u32)),
                }
            }
        }
    };
}

#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}
