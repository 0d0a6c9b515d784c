//! Frame-scoped arena with plain index handles.
//!
//! Values live for exactly one frame. Indices are not generational: a handle
//! from a previous frame is simply out of range (or points at an unrelated
//! value) after [`FrameArena::reset`], so handles must never outlive the frame
//! that produced them.

use std::fmt;
use std::marker::PhantomData;

use crate::pool::Poolable;

/// Index of a value stored in a [`FrameArena`].
pub struct ArenaIndex<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaIndex<T> {
    /// Build an index from its raw position.
    pub const fn from_raw(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Raw position inside the arena.
    pub const fn raw(self) -> u32 {
        self.index
    }

    pub const fn index(self) -> usize {
        self.index as usize
    }
}

// Manual impls: derives would require `T: Clone` etc.
impl<T> Clone for ArenaIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaIndex<T> {}

impl<T> PartialEq for ArenaIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for ArenaIndex<T> {}

impl<T> std::hash::Hash for ArenaIndex<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for ArenaIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaIndex({})", self.index)
    }
}

/// Append-only storage that is reset, not freed, between frames.
#[derive(Debug)]
pub struct FrameArena<T> {
    items: Vec<T>,
}

impl<T> FrameArena<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an arena that can hold `capacity` values without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Store a value for the rest of the frame.
    pub fn alloc(&mut self, value: T) -> ArenaIndex<T> {
        let index = ArenaIndex::from_raw(self.items.len() as u32);
        self.items.push(value);
        index
    }

    pub fn get(&self, index: ArenaIndex<T>) -> Option<&T> {
        self.items.get(index.index())
    }

    pub fn get_mut(&mut self, index: ArenaIndex<T>) -> Option<&mut T> {
        self.items.get_mut(index.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Values in allocation order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate `(index, value)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex<T>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, value)| (ArenaIndex::from_raw(i as u32), value))
    }

    /// Drop every value but keep the backing allocation.
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

impl<T> Default for FrameArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<ArenaIndex<T>> for FrameArena<T> {
    type Output = T;

    fn index(&self, index: ArenaIndex<T>) -> &T {
        &self.items[index.index()]
    }
}

impl<T> Poolable for FrameArena<T> {
    fn new_empty() -> Self {
        Self::new()
    }

    fn reset(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_returns_sequential_indices() {
        let mut arena = FrameArena::new();
        let a = arena.alloc("shadow");
        let b = arena.alloc("gbuffer");

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena[b], "gbuffer");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut arena = FrameArena::with_capacity(4);
        for i in 0..32 {
            arena.alloc(i);
        }
        let capacity = arena.capacity();

        arena.reset();

        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), capacity);
    }

    #[test]
    fn test_stale_index_is_out_of_range_after_reset() {
        let mut arena = FrameArena::new();
        let index = arena.alloc(1u32);
        arena.reset();
        assert!(arena.get(index).is_none());
    }

    #[test]
    fn test_get_mut_updates_value() {
        let mut arena = FrameArena::new();
        let index = arena.alloc(vec![1u8]);
        arena.get_mut(index).unwrap().push(2);
        assert_eq!(arena[index], vec![1, 2]);
    }

    #[test]
    fn test_iter_preserves_allocation_order() {
        let mut arena = FrameArena::new();
        arena.alloc('a');
        arena.alloc('b');
        arena.alloc('c');

        let collected: Vec<_> = arena.iter().map(|(i, v)| (i.index(), *v)).collect();
        assert_eq!(collected, vec![(0, 'a'), (1, 'b'), (2, 'c')]);
    }
}
