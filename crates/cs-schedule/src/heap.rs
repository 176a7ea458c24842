//! `BinaryHeap` — an array-backed min-heap with out-of-order removal.
//!
//! `std::collections::BinaryHeap` cannot remove an arbitrary element, which
//! the engine needs to interrupt one specific pending event.  This heap keeps
//! its backing `Vec` visible (read-only) so callers can locate an element and
//! then remove it by index.
//!
//! # Sorted flag
//!
//! A sorted array is a valid min-heap.  The heap remembers when its array is
//! known to be sorted (after [`BinaryHeap::sort`] or [`BinaryHeap::extend`])
//! and keeps that knowledge through operations that provably preserve it, so
//! [`BinaryHeap::index_of`] can binary-search instead of scanning.
//!
//! # Capacity
//!
//! The logical capacity starts at 16, doubles when full, and shrinks back to
//! the current length when a removal leaves less than a quarter of it in use.

use std::cmp::Ordering;

/// Minimal logical capacity.
pub const MIN_CAPACITY: usize = 16;

#[derive(Clone, Debug)]
pub struct BinaryHeap<T> {
    data:     Vec<T>,
    capacity: usize,
    sorted:   bool,
}

impl<T: Ord> Default for BinaryHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> BinaryHeap<T> {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self { data: Vec::with_capacity(capacity), capacity, sorted: true }
    }

    // ── Index helpers ────────────────────────────────────────────────────

    #[inline(always)]
    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    #[inline(always)]
    fn child(i: usize) -> usize {
        2 * i + 1
    }

    /// Move the element at `p` towards the root; returns its final index.
    fn bubble_up(&mut self, mut p: usize) -> usize {
        while p > 0 {
            let par = Self::parent(p);
            if self.data[p] < self.data[par] {
                self.data.swap(p, par);
                p = par;
            } else {
                break;
            }
        }
        p
    }

    /// Move the element at `p` towards the leaves; returns its final index.
    fn bubble_down(&mut self, mut p: usize) -> usize {
        let n = self.data.len();
        loop {
            let ch1 = Self::child(p);
            if ch1 >= n {
                break;
            }
            let ch2 = ch1 + 1;
            let c = if ch2 < n && self.data[ch2] < self.data[ch1] { ch2 } else { ch1 };
            if self.data[p] <= self.data[c] {
                break;
            }
            self.data.swap(p, c);
            p = c;
        }
        p
    }

    fn heapify(&mut self) {
        for i in (0..self.data.len() / 2).rev() {
            self.bubble_down(i);
        }
    }

    fn maybe_shrink(&mut self) {
        let n = self.data.len();
        if n > MIN_CAPACITY && n < self.capacity / 4 {
            self.set_capacity(n);
        }
    }

    // ── Capacity ─────────────────────────────────────────────────────────

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize the logical capacity; never below [`MIN_CAPACITY`] or `len()`.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.max(MIN_CAPACITY).max(self.data.len());
        if capacity == self.capacity {
            return;
        }
        if capacity > self.data.capacity() {
            self.data.reserve_exact(capacity - self.data.len());
        } else {
            self.data.shrink_to(capacity);
        }
        self.capacity = capacity;
    }

    // ── Queue operations ─────────────────────────────────────────────────

    /// Insert an element.  O(log n).
    pub fn push(&mut self, item: T) {
        if self.data.len() == self.capacity {
            self.set_capacity(self.capacity * 2);
        }
        if self.sorted {
            self.sorted = self.data.last().is_none_or(|last| *last <= item);
        }
        self.data.push(item);
        let last = self.data.len() - 1;
        self.bubble_up(last);
    }

    /// The minimum element.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Remove and return the minimum element.  O(log n).
    pub fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let v = self.data.swap_remove(0);
        if !self.data.is_empty() {
            let moved = self.bubble_down(0) != 0;
            self.sorted &= !moved;
        }
        self.maybe_shrink();
        Some(v)
    }

    /// Remove the element at `index`, restoring the heap property.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> T {
        let v = self.data.swap_remove(index);
        if index < self.data.len() {
            self.sorted = false;
            if self.bubble_down(index) == index {
                self.bubble_up(index);
            }
        }
        self.maybe_shrink();
        v
    }

    /// Remove the first element comparing equal to `item`.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.index_of(item) {
            Some(i) => {
                self.remove_at(i);
                true
            }
            None => false,
        }
    }

    /// Remove every element matching `pred` and return them in heap order.
    pub fn remove_matching<F>(&mut self, mut pred: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let (removed, kept): (Vec<T>, Vec<T>) = self.data.drain(..).partition(|x| pred(x));
        self.data = kept;
        if !self.sorted {
            self.heapify();
            self.sorted = self.data.len() <= 1;
        }
        self.data.reserve_exact(self.capacity.saturating_sub(self.data.len()));
        removed
    }

    /// Append all items and sort the backing array.
    pub fn extend<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.data.extend(items);
        if self.data.len() > self.capacity {
            self.capacity = self.data.len();
        }
        self.sorted = false;
        self.sort();
    }

    /// Sort the backing array (which keeps it a valid heap).
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.data.sort();
        self.sorted = true;
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.sorted = true;
    }

    // ── Lookup ───────────────────────────────────────────────────────────

    /// Index of an element comparing equal to `item`.  Binary search when the
    /// array is known to be sorted, linear scan otherwise.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        if self.sorted {
            self.data.binary_search(item).ok()
        } else {
            self.data.iter().position(|x| x.cmp(item) == Ordering::Equal)
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// Index of the smallest element matching `pred`.
    pub fn find_index<F>(&self, mut pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut best: Option<usize> = None;
        for (i, x) in self.data.iter().enumerate() {
            if pred(x) && best.is_none_or(|b| *x < self.data[b]) {
                best = Some(i);
            }
        }
        best
    }

    /// The smallest element matching `pred`.
    pub fn find<F>(&self, pred: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.find_index(pred).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `true` while the backing array is known to be sorted.
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Elements in backing-array order (not sorted in general).
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the heap, returning its elements in ascending order.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        self.sort();
        self.data
    }

    /// Empty the heap, returning its elements in backing-array order.
    pub fn take_all(&mut self) -> Vec<T> {
        self.sorted = true;
        std::mem::take(&mut self.data)
    }
}

impl<T: Ord> FromIterator<T> for BinaryHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}

impl<'a, T> IntoIterator for &'a BinaryHeap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
