//! Allocation reuse for frame-scoped data.
//!
//! A render graph rebuilds its pass list, descriptors and compiled groups every
//! frame. Dropping those containers at the end of a frame and allocating them
//! again at the start of the next one is pure churn. [`Pooled<T>`] keeps the
//! value (and its `Vec`/`HashMap` capacity) alive while marking it as unused.
//!
//! ```
//! use redlilium_core::pool::{Poolable, Pooled};
//!
//! #[derive(Default)]
//! struct Groups {
//!     passes: Vec<u32>,
//! }
//!
//! impl Poolable for Groups {
//!     fn new_empty() -> Self {
//!         Self::default()
//!     }
//!     fn reset(&mut self) {
//!         self.passes.clear();
//!     }
//! }
//!
//! let mut groups = Pooled::<Groups>::default();
//! groups.activate().passes.extend([0, 1, 2]);
//! assert!(groups.is_active());
//!
//! groups.release();
//! assert!(groups.get().is_none());
//! assert!(groups.inner().passes.capacity() >= 3);
//! ```

/// A value that can be cleared in place and reused.
pub trait Poolable {
    /// Create an empty instance.
    fn new_empty() -> Self;

    /// Clear the contents while keeping allocated capacity.
    fn reset(&mut self);
}

/// A value that is either in use ([`Active`](Pooled::Active)) or parked with
/// its allocation intact ([`Pooled`](Pooled::Pooled)).
#[derive(Debug)]
pub enum Pooled<T: Poolable> {
    /// Holds data for the current frame.
    Active(T),
    /// Cleared, waiting to be activated again.
    Pooled(T),
}

impl<T: Poolable> Pooled<T> {
    /// Wrap a value that is already in use.
    pub fn new(value: T) -> Self {
        Self::Active(value)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }

    /// The value if it is active.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Active(value) => Some(value),
            Self::Pooled(_) => None,
        }
    }

    /// Mutable access to the value if it is active.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Active(value) => Some(value),
            Self::Pooled(_) => None,
        }
    }

    /// Reset the value and park it. No-op when already pooled.
    pub fn release(&mut self) {
        if let Self::Active(value) = self {
            value.reset();
            self.swap_variant();
        }
    }

    /// Mark the value as in use and return it.
    ///
    /// A pooled value comes back empty (it was reset on release); an active
    /// value is returned untouched.
    pub fn activate(&mut self) -> &mut T {
        if self.is_pooled() {
            self.swap_variant();
        }
        self.inner_mut()
    }

    /// The value regardless of state.
    pub fn inner(&self) -> &T {
        match self {
            Self::Active(value) | Self::Pooled(value) => value,
        }
    }

    /// Mutable access regardless of state. Does not change the state.
    pub fn inner_mut(&mut self) -> &mut T {
        match self {
            Self::Active(value) | Self::Pooled(value) => value,
        }
    }

    fn swap_variant(&mut self) {
        // `new_empty` is only a placeholder for the duration of the swap.
        *self = match std::mem::replace(self, Self::Pooled(T::new_empty())) {
            Self::Active(value) => Self::Pooled(value),
            Self::Pooled(value) => Self::Active(value),
        };
    }
}

impl<T: Poolable> Default for Pooled<T> {
    fn default() -> Self {
        Self::Pooled(T::new_empty())
    }
}

impl<T> Poolable for Vec<T> {
    fn new_empty() -> Self {
        Vec::new()
    }

    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_starts_pooled() {
        let pooled = Pooled::<Vec<u32>>::default();
        assert!(pooled.is_pooled());
        assert!(pooled.get().is_none());
    }

    #[test]
    fn test_release_keeps_capacity() {
        let mut pooled = Pooled::new(vec![1u32, 2, 3, 4]);
        pooled.release();

        assert!(pooled.is_pooled());
        assert!(pooled.inner().is_empty());
        assert!(pooled.inner().capacity() >= 4);
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut pooled = Pooled::new(vec![7u8]);
        pooled.release();
        pooled.release();
        assert!(pooled.is_pooled());
    }

    #[test]
    fn test_activate_returns_cleared_value() {
        let mut pooled = Pooled::new(vec![1u32, 2, 3]);
        pooled.release();
        let capacity = pooled.inner().capacity();

        let value = pooled.activate();
        assert!(value.is_empty());
        assert_eq!(value.capacity(), capacity);
        value.push(9);

        assert_eq!(pooled.get(), Some(&vec![9]));
    }

    #[test]
    fn test_activate_on_active_keeps_data() {
        let mut pooled = Pooled::new(vec![1u32, 2]);
        assert_eq!(pooled.activate(), &vec![1, 2]);
    }

    #[test]
    fn test_get_mut_only_when_active() {
        let mut pooled = Pooled::<Vec<u32>>::default();
        assert!(pooled.get_mut().is_none());

        pooled.activate();
        pooled.get_mut().unwrap().push(5);
        assert_eq!(pooled.inner(), &vec![5]);
    }

    #[test]
    fn test_frame_cycles_reuse_allocation() {
        let mut pooled = Pooled::<Vec<u32>>::default();
        for frame in 0..3u32 {
            let passes = pooled.activate();
            passes.extend((0..16).map(|i| frame * 16 + i));
            assert_eq!(pooled.get().unwrap().len(), 16);
            pooled.release();
            assert!(pooled.inner().capacity() >= 16);
        }
    }
}
