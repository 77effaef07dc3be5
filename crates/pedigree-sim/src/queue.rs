//! Resizable binary-heap priority queue with pluggable ordering.
//!
//! The same structure serves three roles in a run:
//!
//! - the event schedule (natural order: earliest event first),
//! - the living population (natural order: earliest death first),
//! - the two post-run ancestry queues (injected comparator: youngest first).
//!
//! The heap lives in a dense vector addressed with 1-based implicit indices
//! (slot 0 is never occupied). Parent of slot `k` is `k / 2`, children are
//! `2k` and `2k + 1`. The top of the heap is the element that compares
//! *least* under the active [`Comparator`]; a max-heap is a min-heap over
//! [`Reversed`] ordering.
//!
//! Capacity doubles when the heap fills up and halves once occupancy falls
//! to a quarter, never going below the capacity the queue was created with.

use core::cmp::Ordering;

/// Default number of usable slots for a new queue.
pub const DEFAULT_CAPACITY: usize = 10;

/// Errors raised by queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Peek or extract on an empty queue.
    #[error("priority queue underflow")]
    Underflow,
}

// ---------------------------------------------------------------------------
// Orderings
// ---------------------------------------------------------------------------

/// A total ordering over queue elements.
///
/// The element comparing [`Ordering::Less`] than all others sits at the top.
pub trait Comparator<T> {
    /// Compare two elements.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The element type's own [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts another ordering, turning a min-heap into a max-heap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reversed<C>(pub C);

impl<T, C: Comparator<T>> Comparator<T> for Reversed<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Adapts a comparison closure into a [`Comparator`].
#[derive(Clone, Copy)]
pub struct FnOrder<F>(pub F);

impl<T, F> Comparator<T> for FnOrder<F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> core::fmt::Debug for FnOrder<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnOrder(..)")
    }
}

// ---------------------------------------------------------------------------
// PriorityQueue
// ---------------------------------------------------------------------------

/// Array-backed binary heap ordered by a [`Comparator`].
#[derive(Debug, Clone)]
pub struct PriorityQueue<T, C = NaturalOrder> {
    /// Heap slots; index 0 is a permanently empty sentinel.
    slots: Vec<Option<T>>,
    /// Number of occupied slots (`1..=len`).
    len: usize,
    /// Capacity the queue never shrinks below.
    min_capacity: usize,
    /// Active ordering.
    comparator: C,
}

impl<T: Ord> PriorityQueue<T> {
    /// Create an empty queue under the natural ordering.
    pub fn new() -> Self {
        Self::with_capacity_and_comparator(DEFAULT_CAPACITY, NaturalOrder)
    }

    /// Create an empty queue with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, NaturalOrder)
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Comparator<T>> PriorityQueue<T, C> {
    /// Create an empty queue ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_capacity_and_comparator(DEFAULT_CAPACITY, comparator)
    }

    /// Create an empty queue with room for `capacity` elements, ordered by
    /// `comparator`. A zero capacity is raised to one.
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::new();
        slots.resize_with(capacity.saturating_add(1), || None);
        Self {
            slots,
            len: 0,
            min_capacity: capacity,
            comparator,
        }
    }

    /// Number of elements in the queue.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the backing storage can hold before growing.
    pub const fn capacity(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// Add an element, growing the backing storage when it is full.
    pub fn insert(&mut self, value: T) {
        if self.len >= self.capacity() {
            self.resize(self.capacity().saturating_mul(2));
        }
        self.len = self.len.saturating_add(1);
        if let Some(slot) = self.slots.get_mut(self.len) {
            *slot = Some(value);
        }
        self.sift_up(self.len);
    }

    /// Borrow the top element without removing it.
    pub fn peek_top(&self) -> Result<&T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Underflow);
        }
        self.slot(1).ok_or(QueueError::Underflow)
    }

    /// Remove and return the top element.
    pub fn extract_top(&mut self) -> Result<T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Underflow);
        }

        let last = self.len;
        self.slots.swap(1, last);
        let top = self.slots.get_mut(last).and_then(Option::take);
        self.len = last.saturating_sub(1);
        self.sift_down(1);

        let capacity = self.capacity();
        if self.len > 0 && self.len <= capacity / 4 && capacity / 2 >= self.min_capacity {
            self.resize(capacity / 2);
        }

        top.ok_or(QueueError::Underflow)
    }

    /// Whether any queued element satisfies `predicate`.
    ///
    /// Linear scan in heap order; the ordering is not consulted.
    pub fn contains_by<P>(&self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool,
    {
        self.iter().any(predicate)
    }

    /// Iterate over the queued elements in heap (not priority) order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().skip(1).take(self.len).filter_map(Option::as_ref)
    }

    // -- heap maintenance -------------------------------------------------

    fn slot(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Whether slot `i` strictly precedes slot `j`.
    fn precedes(&self, i: usize, j: usize) -> bool {
        match (self.slot(i), self.slot(j)) {
            (Some(a), Some(b)) => self.comparator.compare(a, b) == Ordering::Less,
            _ => false,
        }
    }

    fn sift_up(&mut self, mut k: usize) {
        while k > 1 {
            let parent = k / 2;
            if !self.precedes(k, parent) {
                break;
            }
            self.slots.swap(k, parent);
            k = parent;
        }
    }

    fn sift_down(&mut self, mut k: usize) {
        loop {
            let Some(left) = k.checked_mul(2) else { break };
            if left > self.len {
                break;
            }
            let right = left.saturating_add(1);
            let child = if right <= self.len && self.precedes(right, left) {
                right
            } else {
                left
            };
            if !self.precedes(child, k) {
                break;
            }
            self.slots.swap(k, child);
            k = child;
        }
    }

    /// Change the usable capacity; occupied slots are always a prefix.
    fn resize(&mut self, capacity: usize) {
        let capacity = capacity.max(self.len).max(1);
        let new_len = capacity.saturating_add(1);
        self.slots.truncate(new_len);
        self.slots.resize_with(new_len, || None);
    }
}

impl<T: PartialEq, C: Comparator<T>> PriorityQueue<T, C> {
    /// Whether `value` is queued, compared by equality rather than ordering.
    ///
    /// For identifier elements this is an identity check.
    pub fn contains(&self, value: &T) -> bool {
        self.contains_by(|queued| queued == value)
    }
}

impl<T: Clone, C: Comparator<T>> PriorityQueue<T, C> {
    /// Copy the queued elements out in heap order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn drain<T, C: Comparator<T>>(queue: &mut PriorityQueue<T, C>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(value) = queue.extract_top() {
            out.push(value);
        }
        out
    }

    #[test]
    fn extracts_in_ascending_order() {
        let mut queue = PriorityQueue::new();
        for value in [5, 1, 9, 3, 7, 3, 0] {
            queue.insert(value);
        }
        assert_eq!(queue.len(), 7);
        assert_eq!(queue.peek_top(), Ok(&0));
        assert_eq!(drain(&mut queue), vec![0, 1, 3, 3, 5, 7, 9]);
        assert!(queue.is_empty());
    }

    #[test]
    fn reversed_ordering_is_max_heap() {
        let mut queue = PriorityQueue::with_comparator(Reversed(NaturalOrder));
        for value in [2, 8, 4, 6] {
            queue.insert(value);
        }
        assert_eq!(drain(&mut queue), vec![8, 6, 4, 2]);
    }

    #[test]
    fn closure_ordering_is_respected() {
        let by_len = FnOrder(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        let mut queue = PriorityQueue::with_comparator(by_len);
        for word in ["three", "a", "sixsix", "to"] {
            queue.insert(word);
        }
        assert_eq!(drain(&mut queue), vec!["a", "to", "three", "sixsix"]);
    }

    #[test]
    fn empty_queue_underflows() {
        let mut queue: PriorityQueue<u32> = PriorityQueue::new();
        assert_eq!(queue.peek_top(), Err(QueueError::Underflow));
        assert_eq!(queue.extract_top(), Err(QueueError::Underflow));

        queue.insert(1);
        assert_eq!(queue.extract_top(), Ok(1));
        assert_eq!(queue.extract_top(), Err(QueueError::Underflow));
    }

    #[test]
    fn capacity_doubles_and_halves_within_bounds() {
        let mut queue = PriorityQueue::with_capacity(4);
        assert_eq!(queue.capacity(), 4);

        for value in 0..33 {
            queue.insert(value);
        }
        assert!(queue.capacity() >= 33);
        assert_eq!(queue.capacity(), 64);

        while queue.len() > 1 {
            queue.extract_top().unwrap();
            assert!(queue.capacity() >= 4, "shrunk below initial capacity");
            assert!(queue.capacity() >= queue.len());
        }
        assert!(queue.capacity() <= 8);
    }

    #[test]
    fn zero_capacity_is_usable() {
        let mut queue = PriorityQueue::with_capacity(0);
        queue.insert(3);
        queue.insert(1);
        assert_eq!(drain(&mut queue), vec![1, 3]);
    }

    #[test]
    fn contains_scans_by_equality() {
        let mut queue = PriorityQueue::new();
        queue.insert(10);
        queue.insert(20);
        assert!(queue.contains(&20));
        assert!(!queue.contains(&30));
        assert!(queue.contains_by(|v| *v > 15));

        assert_eq!(queue.extract_top(), Ok(10));
        assert!(!queue.contains(&10));
    }

    #[test]
    fn to_vec_returns_every_element() {
        let mut queue = PriorityQueue::new();
        for value in [4, 2, 6] {
            queue.insert(value);
        }
        let mut items = queue.to_vec();
        items.sort_unstable();
        assert_eq!(items, vec![2, 4, 6]);
        assert_eq!(queue.len(), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(i32),
        Extract,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<i32>().prop_map(Op::Insert),
            1 => Just(Op::Extract),
        ]
    }

    proptest! {
        #[test]
        fn interleaved_extracts_never_go_backwards(ops in proptest::collection::vec(op_strategy(), 0..200)) {
            let mut queue = PriorityQueue::with_capacity(2);
            let mut reference: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(value) => {
                        queue.insert(value);
                        reference.push(value);
                    }
                    Op::Extract => {
                        let got = queue.extract_top().ok();
                        let expected = reference.iter().copied().min();
                        prop_assert_eq!(got, expected);
                        if let Some(min) = expected {
                            if let Some(pos) = reference.iter().position(|v| *v == min) {
                                reference.swap_remove(pos);
                            }
                        }
                    }
                }
                prop_assert_eq!(queue.len(), reference.len());
            }

            let drained = drain(&mut queue);
            prop_assert!(drained.windows(2).all(|w| matches!(w, [a, b] if a <= b)));
        }

        #[test]
        fn size_after_inserts_and_extracts(values in proptest::collection::vec(any::<u16>(), 1..100), extract_frac in 0.0_f64..1.0) {
            let mut queue = PriorityQueue::with_comparator(Reversed(NaturalOrder));
            for value in &values {
                queue.insert(*value);
            }
            let k = values.len();
            let m = ((k as f64) * extract_frac) as usize;
            let mut previous: Option<u16> = None;
            for _ in 0..m {
                let value = queue.extract_top().unwrap();
                if let Some(prev) = previous {
                    prop_assert!(value <= prev);
                }
                previous = Some(value);
            }
            prop_assert_eq!(queue.len(), k - m);
        }
    }
}
