//! Slot storage for element records.
//!
//! Records live in a `Vec<Option<T>>`; removed slots go on a free list and
//! are reused by later inserts. Indices are stable for the lifetime of the
//! record they name.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use super::index::ArenaIndex;

/// Arena of records addressed by the typed index `I`.
#[derive(Debug, Clone)]
pub struct Arena<I, T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
    _index: PhantomData<I>,
}

impl<I: ArenaIndex, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaIndex, T> Arena<I, T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _index: PhantomData,
        }
    }

    /// Number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `value`, reusing a free slot if one exists.
    pub fn insert(&mut self, value: T) -> I {
        self.len += 1;
        if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(value);
            I::from_slot(slot)
        } else {
            self.slots.push(Some(value));
            I::from_slot(self.slots.len() - 1)
        }
    }

    /// Remove the record at `id`, returning it.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let value = self.slots.get_mut(id.slot())?.take()?;
        self.free.push(id.slot());
        self.len -= 1;
        Some(value)
    }

    /// Whether `id` names a live record.
    #[inline]
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Get the record at `id`.
    #[inline]
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.slot()).and_then(Option::as_ref)
    }

    /// Get the record at `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Iterate over live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (I::from_slot(i), v)))
    }

    /// Iterate mutably over live records in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (I::from_slot(i), v)))
    }

    /// Iterate over the indices of live records.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Remove every record, returning them.
    pub fn drain(&mut self) -> Vec<T> {
        self.free.clear();
        self.len = 0;
        self.slots.drain(..).flatten().collect()
    }
}

impl<I: ArenaIndex, T> Index<I> for Arena<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(v) => v,
            None => panic!("stale arena index {id:?}"),
        }
    }
}

impl<I: ArenaIndex, T> IndexMut<I> for Arena<I, T> {
    #[inline]
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.get_mut(id) {
            Some(v) => v,
            None => panic!("stale arena index {id:?}"),
        }
    }
}
