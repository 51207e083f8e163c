//! Fixed-capacity ring buffer.

use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use crate::BufferError;

/// A bounded double-ended buffer that evicts instead of failing when full.
///
/// Index 0 is the front (oldest for append-only use), `len() - 1` the back.
/// Pushing into a full buffer drops an element from the opposite end, so the
/// newest data always fits.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    /// Create a buffer holding at most `capacity` elements. A capacity of
    /// zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity. Shrinking discards elements from the front, so
    /// the back (newest) survive.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Append at the back, evicting the front element when full.
    pub fn push_back(&mut self, value: T) {
        if self.is_full() {
            self.items.pop_front();
        }
        self.items.push_back(value);
    }

    /// Prepend at the front, evicting the back element when full.
    pub fn push_front(&mut self, value: T) {
        if self.is_full() {
            self.items.pop_back();
        }
        self.items.push_front(value);
    }

    /// Insert before position `index` (so `push_index(len, v)` appends).
    ///
    /// When full, the front element is evicted, except for an insert at the
    /// very front which evicts the back instead; either way the inserted
    /// element is kept.
    ///
    /// # Panics
    /// Panics if `index > len()`.
    pub fn push_index(&mut self, index: usize, value: T) {
        assert!(
            index <= self.items.len(),
            "insertion index {index} out of range for buffer of length {}",
            self.items.len()
        );
        let mut index = index;
        if self.is_full() {
            if index == 0 {
                self.items.pop_back();
            } else {
                self.items.pop_front();
                index = index.min(self.items.len());
            }
        }
        self.items.insert(index, value);
    }

    pub fn pop_front(&mut self) -> Result<T, BufferError> {
        self.items.pop_front().ok_or(BufferError::Empty)
    }

    pub fn pop_back(&mut self) -> Result<T, BufferError> {
        self.items.pop_back().ok_or(BufferError::Empty)
    }

    pub fn front(&self) -> Result<&T, BufferError> {
        self.items.front().ok_or(BufferError::Empty)
    }

    pub fn back(&self) -> Result<&T, BufferError> {
        self.items.back().ok_or(BufferError::Empty)
    }

    pub fn get(&self, index: usize) -> Result<&T, BufferError> {
        self.items.get(index).ok_or(BufferError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, BufferError> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(BufferError::IndexOutOfRange { index, len })
    }

    /// Iterate front to back.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

impl<T> Index<usize> for CircularBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for CircularBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<T> Extend<T> for CircularBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}
