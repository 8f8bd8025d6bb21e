//! Array backed binary heap ordered by an injected comparator.
//!
//! The comparator decides which item is "greatest"; the greatest item is the root and is popped
//! first. Passing a reversed comparison turns the heap into a min-heap, which is how the merge
//! selects the next line for both ascending and descending sorts.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display};

/// Returned by [BinaryHeap::peek_root] and [BinaryHeap::pop_root] when the heap is empty.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EmptyHeapError;

impl Display for EmptyHeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "empty heap")
    }
}

impl Error for EmptyHeapError {}

/// Binary heap over `T` ordered by the comparator `F`.
///
/// # Examples
/// ```
/// use flex_file_sort::binary_heap::BinaryHeap;
///
/// // min-heap
/// let mut heap = BinaryHeap::new(|a: &i32, b: &i32| b.cmp(a));
/// heap.insert(3);
/// heap.insert(1);
/// heap.insert(2);
/// assert_eq!(heap.pop_root(), Ok(1));
/// assert_eq!(heap.peek_root(), Ok(&2));
/// assert_eq!(heap.len(), 2);
/// ```
pub struct BinaryHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    items: Vec<T>,
    compare: F,
}

impl<T, F> BinaryHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Create an empty heap ordered by `compare`.
    pub fn new(compare: F) -> BinaryHeap<T, F> {
        BinaryHeap {
            items: Vec::new(),
            compare,
        }
    }

    /// Create an empty heap with room for `capacity` items.
    pub fn with_capacity(capacity: usize, compare: F) -> BinaryHeap<T, F> {
        BinaryHeap {
            items: Vec::with_capacity(capacity),
            compare,
        }
    }

    /// Build a heap from existing items in O(n).
    pub fn from_vec(items: Vec<T>, compare: F) -> BinaryHeap<T, F> {
        let mut heap = BinaryHeap {
            items,
            compare,
        };
        if heap.items.len() > 1 {
            for i in (0..=Self::parent(heap.items.len() - 1)).rev() {
                heap.sift_down(i);
            }
        }
        heap
    }

    /// Number of items in the heap.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, O(log n).
    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// The greatest item under the comparator.
    pub fn peek_root(&self) -> Result<&T, EmptyHeapError> {
        self.items.first().ok_or(EmptyHeapError)
    }

    /// Remove and return the greatest item under the comparator, O(log n).
    pub fn pop_root(&mut self) -> Result<T, EmptyHeapError> {
        if self.items.is_empty() {
            return Err(EmptyHeapError);
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let root = self.items.pop().ok_or(EmptyHeapError)?;
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        Ok(root)
    }

    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    fn greater(&self, i: usize, j: usize) -> bool {
        (self.compare)(&self.items[i], &self.items[j]) == Ordering::Greater
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = Self::parent(i);
            if !self.greater(i, parent) {
                break;
            }
            self.items.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.greater(right, left) {
                right
            } else {
                left
            };
            if !self.greater(child, i) {
                break;
            }
            self.items.swap(i, child);
            i = child;
        }
    }
}

impl<T: Debug, F> Debug for BinaryHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryHeap").field("items", &self.items).finish()
    }
}

/// Sort `items` in ascending order under `compare` using a [BinaryHeap].
///
/// # Examples
/// ```
/// use flex_file_sort::binary_heap::heap_sort;
/// assert_eq!(heap_sort(vec![5, 1, 4, 2], |a, b| a.cmp(b)), vec![1, 2, 4, 5]);
/// ```
pub fn heap_sort<T, F>(items: Vec<T>, compare: F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut heap = BinaryHeap::from_vec(items, compare);
    let mut sorted = Vec::with_capacity(heap.len());
    while let Ok(item) = heap.pop_root() {
        sorted.push(item);
    }
    sorted.reverse();
    sorted
}
