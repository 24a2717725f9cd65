use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use super::Sequence;

/// Heap-backed sequence with geometric growth.
///
/// Capacity starts at zero, becomes one on the first push and doubles each
/// time the sequence is full. The capacity reported by
/// [`Sequence::capacity`] follows exactly that schedule; [`Sequence::clear`]
/// keeps it, so a cleared sequence refills without reallocating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSequence<T> {
    elements: Vec<T>,
    capacity: usize,
}

impl<T> DynamicSequence<T> {
    /// Creates an empty sequence without allocating.
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
            capacity: 0,
        }
    }

    /// Creates a sequence holding a copy of `items`.
    pub fn from_slice(items: &[T]) -> Self
    where
        T: Clone,
    {
        let mut seq = Self::new();
        seq.insert(0, items);
        seq
    }

    /// Creates a sequence holding `count` clones of `value`.
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

    fn increase_capacity(&mut self) {
        if self.elements.len() < self.capacity {
            return;
        }
        let new_capacity = if self.capacity == 0 {
            1
        } else {
            self.capacity * 2
        };
        self.elements.reserve_exact(new_capacity - self.elements.len());
        self.capacity = new_capacity;
    }
}

impl<T> Default for DynamicSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> for DynamicSequence<T> {
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn can_hold(&self, _additional: usize) -> bool {
        true
    }

    fn push(&mut self, value: T) {
        self.increase_capacity();
        self.elements.push(value);
    }

    fn try_push(&mut self, value: T) -> Result<(), T> {
        self.push(value);
        Ok(())
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
        self.elements.remove(index)
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

impl<T> Index<usize> for DynamicSequence<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<T> IndexMut<usize> for DynamicSequence<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.elements[index]
    }
}

impl<'a, T> IntoIterator for &'a DynamicSequence<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
