// Copyright (c) 2025 knix
// All rights reserved.

use std::num::NonZeroU32;

use log::debug;

/// Append-only table of records addressed by a 1-based id. Type tables are
/// built once and never shrink, so handles stay valid for the life of the pool.
pub struct Pool<T, Index: Into<NonZeroU32> + From<NonZeroU32>> {
    vec: Vec<T>,
    name: &'static str,
    _index: std::marker::PhantomData<Index>,
}

impl<T, Index: Into<NonZeroU32> + From<NonZeroU32>> Pool<T, Index> {
    pub fn with_capacity(name: &'static str, capacity: usize) -> Pool<T, Index> {
        Pool { name, vec: Vec::with_capacity(capacity), _index: std::marker::PhantomData }
    }

    pub fn new(name: &'static str) -> Pool<T, Index> {
        Pool { name, vec: Vec::new(), _index: std::marker::PhantomData }
    }

    pub fn next_id(&self) -> Index {
        let Some(index) = NonZeroU32::new(self.vec.len() as u32 + 1) else {
            panic!("pool {} exhausted its id space", self.name)
        };
        Index::from(index)
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn add(&mut self, t: T) -> Index {
        let cap = self.vec.capacity();

        let index = self.next_id();
        self.vec.push(t);

        let new_cap = self.vec.capacity();
        if new_cap != cap {
            debug!("pool {} resized {cap} -> {new_cap}", self.name)
        }

        index
    }

    fn index_to_actual_index(index: Index) -> usize {
        let nz32: NonZeroU32 = index.into();
        nz32.get() as usize - 1
    }

    pub fn get(&self, index: Index) -> &T {
        let index = Self::index_to_actual_index(index);
        &self.vec[index]
    }

    /// Lookup for ids that came out of untrusted words
    pub fn try_get(&self, index: Index) -> Option<&T> {
        let index = Self::index_to_actual_index(index);
        self.vec.get(index)
    }

    pub fn get_mut(&mut self, index: Index) -> &mut T {
        let index = Self::index_to_actual_index(index);
        &mut self.vec[index]
    }

    pub fn iter_with_ids(&self) -> impl Iterator<Item = (Index, &T)> {
        self.vec.iter().enumerate().map(|(i, t)| {
            // Safety: i + 1 is never zero
            let nz = unsafe { NonZeroU32::new_unchecked(i as u32 + 1) };
            (Index::from(nz), t)
        })
    }
}
