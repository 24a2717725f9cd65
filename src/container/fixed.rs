use core::ops::{Index, IndexMut};

use heapless::Vec;

use super::Sequence;

/// Sequence with inline storage for at most `N` elements.
///
/// Storage never moves, so element references stay valid until the element
/// is erased or the sequence is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedCapacitySequence<T, const N: usize> {
    elements: Vec<T, N>,
}

impl<T, const N: usize> FixedCapacitySequence<T, N> {
    /// Creates an empty sequence.
    pub const fn new() -> Self {
        const { assert!(N > 0, "fixed-capacity sequence needs a non-zero capacity") };
        Self {
            elements: Vec::new(),
        }
    }

    /// Creates a sequence holding a copy of `items`.
    ///
    /// # Panics
    ///
    /// Panics if `items.len() > N`.
    pub fn from_slice(items: &[T]) -> Self
    where
        T: Clone,
    {
        let mut seq = Self::new();
        seq.insert(0, items);
        seq
    }

    /// Creates a sequence holding `count` clones of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `count > N`.
    pub fn from_elem(count: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut seq = Self::new();
        for _ in 0..count {
            seq.push(value.clone());
        }
        seq
    }

    /// Whether no further element fits.
    pub fn is_full(&self) -> bool {
        self.elements.is_full()
    }
}

impl<T, const N: usize> Default for FixedCapacitySequence<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Sequence<T> for FixedCapacitySequence<T, N> {
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn capacity(&self) -> usize {
        N
    }

    fn can_hold(&self, additional: usize) -> bool {
        self.elements.len() + additional <= N
    }

    fn push(&mut self, value: T) {
        if self.elements.push(value).is_err() {
            panic!("fixed-capacity sequence overflow (capacity {})", N);
        }
    }

    fn try_push(&mut self, value: T) -> Result<(), T> {
        self.elements.push(value)
    }

    fn insert(&mut self, position: usize, items: &[T])
    where
        T: Clone,
    {
        let len = self.elements.len();
        assert!(
            position <= len,
            "insert position {} out of bounds for length {}",
            position,
            len
        );
        let required = core::cmp::max(len, position + items.len());
        assert!(
            required <= N,
            "insert of {} elements exceeds capacity {}",
            items.len(),
            N
        );

        for (offset, item) in items.iter().enumerate() {
            let index = position + offset;
            if index < self.elements.len() {
                self.elements[index] = item.clone();
            } else {
                self.push(item.clone());
            }
        }
    }

    fn erase(&mut self, index: usize) -> T {
        let len = self.elements.len();
        assert!(index < len, "erase index {} out of bounds for length {}", index, len);
        self.elements[index..].rotate_left(1);
        match self.elements.pop() {
            Some(value) => value,
            None => unreachable!(),
        }
    }

    fn clear(&mut self) {
        self.elements.clear();
    }

    fn as_slice(&self) -> &[T] {
        &self.elements
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.elements
    }
}

impl<T, const N: usize> Index<usize> for FixedCapacitySequence<T, N> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<T, const N: usize> IndexMut<usize> for FixedCapacitySequence<T, N> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.elements[index]
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a FixedCapacitySequence<T, N> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
