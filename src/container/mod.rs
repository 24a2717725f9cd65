//! # Allocation-policy-agnostic sequences
//!
//! Every feature in the SDK stores its callback records in a [`Sequence`].
//! The trait is implemented twice:
//!
//! - [`FixedCapacitySequence<T, N>`]: inline storage sized at compile time,
//!   backed by [`heapless::Vec`]. Never allocates and never moves, so
//!   references into it stay valid for as long as the sequence lives.
//! - [`DynamicSequence<T>`] (feature `alloc`): heap storage that doubles its
//!   capacity (starting at one) whenever it is full. References are
//!   invalidated by any growth.
//!
//! Feature code is written once against the trait and the concrete policy
//! is picked by the type the application instantiates.
//!
//! # Failure policy
//!
//! The raw primitive does not report capacity problems as recoverable
//! errors: overflowing a fixed sequence, erasing past the end or calling
//! [`Sequence::at`] out of bounds panics. Callers that need a recoverable
//! path check [`Sequence::can_hold`] first or use [`Sequence::try_push`].
//!
//! ```rust
//! use iotlink::container::{FixedCapacitySequence, Sequence};
//!
//! let mut seq = FixedCapacitySequence::<u8, 2>::new();
//! seq.push(1);
//! assert!(seq.can_hold(1));
//! seq.push(2);
//! assert_eq!(seq.try_push(3), Err(3));
//! assert_eq!(seq.as_slice(), &[1, 2]);
//! ```

mod fixed;
pub use fixed::FixedCapacitySequence;

#[cfg(feature = "alloc")]
mod dynamic;
#[cfg(feature = "alloc")]
pub use dynamic::DynamicSequence;

/// Contiguous, insertion-ordered storage with a vector-like interface.
///
/// Elements `[0, len())` are initialized; `len() <= capacity()` holds at all
/// times.
pub trait Sequence<T>: Default {
    /// Number of stored elements.
    fn len(&self) -> usize;

    /// Number of elements the sequence can hold before it has to grow (or,
    /// for fixed storage, before it overflows).
    fn capacity(&self) -> usize;

    /// Whether `additional` more elements fit without overflowing.
    ///
    /// Always `true` for growable storage.
    fn can_hold(&self, additional: usize) -> bool;

    /// Appends `value`.
    ///
    /// # Panics
    ///
    /// Panics if a fixed-capacity sequence is already full.
    fn push(&mut self, value: T);

    /// Appends `value`, handing it back if there is no room.
    fn try_push(&mut self, value: T) -> Result<(), T>;

    /// Copies `items` into the sequence starting at `position`.
    ///
    /// Elements from `position` onwards are overwritten, and the sequence is
    /// extended where `items` reaches past the current end. Nothing is
    /// shifted. With `position == len()` this appends the whole slice.
    ///
    /// # Panics
    ///
    /// Panics if `position > len()` or if the result would not fit into a
    /// fixed-capacity sequence. The capacity check happens before anything
    /// is written.
    fn insert(&mut self, position: usize, items: &[T])
    where
        T: Clone;

    /// Removes the element at `index`, shifting every later element one
    /// slot to the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn erase(&mut self, index: usize) -> T;

    /// Drops all elements. Storage is retained for reuse.
    fn clear(&mut self);

    /// The initialized elements.
    fn as_slice(&self) -> &[T];

    /// The initialized elements, mutably.
    fn as_mut_slice(&mut self) -> &mut [T];

    /// Whether the sequence holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds-checked element access.
    ///
    /// # Panics
    ///
    /// Panics with the offending index if `index >= len()`.
    fn at(&self, index: usize) -> &T {
        let len = self.len();
        assert!(index < len, "index {} out of bounds for length {}", index, len);
        &self.as_slice()[index]
    }

    /// Bounds-checked mutable element access.
    ///
    /// # Panics
    ///
    /// Panics with the offending index if `index >= len()`.
    fn at_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        assert!(index < len, "index {} out of bounds for length {}", index, len);
        &mut self.as_mut_slice()[index]
    }

    /// Non-panicking element access.
    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Iterates over the elements in insertion order.
    fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Appends every element of `items`.
    fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        let len = self.len();
        self.insert(len, items);
    }
}
