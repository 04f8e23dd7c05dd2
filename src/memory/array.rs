use super::ledger::Ledger;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// In-band element count, stored immediately before the element region.
/// 16-byte aligned (and 16 bytes big) so the elements that follow are
/// aligned for any fundamental type.
#[repr(C, align(16))]
struct ArrayHeader {
    count: usize,
}

const HEADER_SIZE: usize = std::mem::size_of::<ArrayHeader>();
const MAX_ELEMENT_ALIGN: usize = std::mem::align_of::<ArrayHeader>();

/// Growable heap-backed buffer of `Copy` elements, allocated through a
/// [`Ledger`].
///
/// Capacity is never stored: it is recomputed from the backing block's real
/// size as reported by the ledger, so it stays exact across reallocations.
/// An unallocated array (`ptr == None`) is the valid empty, zero-capacity
/// state; every operation treats it as a length-0 buffer.
///
/// Growth doubles the current capacity or jumps straight to the required
/// one, whichever is larger; the first allocation holds at least 4
/// elements.
pub struct Array<T: Copy> {
    /// `None` is the empty state: no backing block exists yet.
    ptr: Option<NonNull<T>>,
    ledger: &'static Ledger,
    /// Intentionally permanent: skip the ledger and the final free.
    leaked: bool,
}

// Safety: Array owns its backing block; the ledger reference is Sync.
unsafe impl<T: Copy + Send> Send for Array<T> {}

impl<T: Copy> Array<T> {
    const ELEMENT_SIZE: usize = std::mem::size_of::<T>();

    /// An empty array accounted by the process-wide ledger. Allocates
    /// nothing until the first element arrives.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ledger(Ledger::global())
    }

    /// An empty array accounted by an explicit ledger.
    ///
    /// # Panics
    ///
    /// Panics for zero-sized element types and for element alignments
    /// above 16.
    #[must_use]
    pub fn with_ledger(ledger: &'static Ledger) -> Self {
        assert!(
            Self::ELEMENT_SIZE != 0,
            "zero-sized element types are not supported"
        );
        assert!(
            std::mem::align_of::<T>() <= MAX_ELEMENT_ALIGN,
            "element alignment above {MAX_ELEMENT_ALIGN} is not supported"
        );
        Self {
            ptr: None,
            ledger,
            leaked: false,
        }
    }

    fn header(&self) -> Option<NonNull<ArrayHeader>> {
        // Safety: the header sits HEADER_SIZE bytes before the elements,
        // at the start of the ledger payload.
        self.ptr.map(|p| unsafe {
            NonNull::new_unchecked(p.as_ptr().cast::<u8>().sub(HEADER_SIZE).cast::<ArrayHeader>())
        })
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.header() {
            // Safety: the header is initialised for any live allocation.
            Some(h) => unsafe { h.as_ref().count },
            None => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element capacity, recomputed from the backing block's actual size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match self.header() {
            // Safety: the header address is the ledger payload pointer.
            Some(h) => {
                let block = unsafe { Ledger::size_of(h.as_ptr().cast::<u8>().cast_const()) };
                (block - HEADER_SIZE) / Self::ELEMENT_SIZE
            }
            None => 0,
        }
    }

    fn block_bytes(capacity: usize) -> usize {
        capacity
            .checked_mul(Self::ELEMENT_SIZE)
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
            .expect("array capacity overflow")
    }

    /// Grow (never shrink) so that at least `required_capacity` elements
    /// fit, and return the element base pointer.
    #[track_caller]
    fn ensure_capacity(&mut self, required_capacity: usize) -> NonNull<T> {
        match self.header() {
            None => {
                let capacity = required_capacity.max(4);
                let block = self.ledger.alloc(Self::block_bytes(capacity));
                // Safety: the block starts with header storage.
                unsafe {
                    block
                        .as_ptr()
                        .cast::<ArrayHeader>()
                        .write(ArrayHeader { count: 0 });
                }
                if self.leaked {
                    // leak() ran while we were still unallocated; keep the
                    // promise for the block that now exists.
                    // Safety: block is this ledger's payload pointer.
                    unsafe { self.ledger.mark_leaked(block.as_ptr()) };
                }
                // Safety: elements start right after the header.
                let elements =
                    unsafe { NonNull::new_unchecked(block.as_ptr().add(HEADER_SIZE).cast::<T>()) };
                self.ptr = Some(elements);
                elements
            }
            Some(header) => {
                let current = self.capacity();
                if required_capacity <= current {
                    // Safety: header() returned Some, so ptr is Some.
                    return unsafe { self.ptr.unwrap_unchecked() };
                }
                let capacity = (current * 2).max(required_capacity);
                // The ledger realloc copies header and live elements alike.
                // Safety: the header address is this array's backing block.
                let block = unsafe {
                    self.ledger
                        .realloc(header.as_ptr().cast::<u8>(), Self::block_bytes(capacity))
                };
                // Safety: elements start right after the header.
                let elements =
                    unsafe { NonNull::new_unchecked(block.as_ptr().add(HEADER_SIZE).cast::<T>()) };
                self.ptr = Some(elements);
                elements
            }
        }
    }

    /// Ensure capacity for at least `required_capacity` elements without
    /// changing the length.
    #[track_caller]
    pub fn reserve(&mut self, required_capacity: usize) {
        let _ = self.ensure_capacity(required_capacity);
    }

    fn set_count(&mut self, count: usize) {
        if let Some(mut h) = self.header() {
            // Safety: the header is initialised and exclusively borrowed.
            unsafe { h.as_mut().count = count };
        }
    }

    /// Append one element, growing as needed.
    #[track_caller]
    pub fn push(&mut self, val: T) {
        let count = self.len();
        let base = self.ensure_capacity(count + 1);
        // Safety: room for count+1 elements exists; slot `count` is ours.
        unsafe { base.as_ptr().add(count).write(val) };
        self.set_count(count + 1);
    }

    /// Append a copy of every element in `vals`.
    #[track_caller]
    pub fn extend_from_slice(&mut self, vals: &[T]) {
        let count = self.len();
        let base = self.ensure_capacity(count + vals.len());
        // Safety: room exists and the source cannot overlap a fresh slot.
        unsafe {
            std::ptr::copy_nonoverlapping(vals.as_ptr(), base.as_ptr().add(count), vals.len());
        }
        self.set_count(count + vals.len());
    }

    /// Remove and return the last element; `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        let ptr = self.ptr?;
        // Safety: element count-1 is initialised; T: Copy, so reading it
        // out needs no drop bookkeeping.
        let val = unsafe { ptr.as_ptr().add(count - 1).read() };
        self.set_count(count - 1);
        Some(val)
    }

    /// Remove the element at `index`, shifting everything after it down by
    /// one (O(n)). Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) {
        let count = self.len();
        if index >= count {
            return;
        }
        let Some(ptr) = self.ptr else { return };
        // Safety: source and destination lie within the initialised prefix.
        unsafe {
            std::ptr::copy(
                ptr.as_ptr().add(index + 1),
                ptr.as_ptr().add(index),
                count - index - 1,
            );
        }
        self.set_count(count - 1);
    }

    /// Forget every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.set_count(0);
    }

    /// Declare this buffer intentionally permanent: its backing block is
    /// taken off the ledger (so it never shows up in a leak report) and is
    /// not freed on drop. The buffer stays fully usable and growable;
    /// re-allocations stay off the ledger too.
    pub fn leak(&mut self) {
        if let Some(header) = self.header() {
            // Safety: the header address is this array's backing block.
            unsafe { self.ledger.mark_leaked(header.as_ptr().cast::<u8>()) };
        }
        self.leaked = true;
    }
}

impl<T: Copy> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Deref for Array<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match self.ptr {
            // Safety: elements 0..len are initialised.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len()) },
            None => &[],
        }
    }
}

impl<T: Copy> DerefMut for Array<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self.ptr {
            // Safety: elements 0..len are initialised; we are exclusively
            // borrowed.
            Some(ptr) => unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len()) },
            None => &mut [],
        }
    }
}

impl<T: Copy> Drop for Array<T> {
    fn drop(&mut self) {
        if self.leaked {
            // Process-lifetime buffer: the block outlives us on purpose.
            return;
        }
        if let Some(header) = self.header() {
            // Safety: the block came from this ledger and is not used again.
            unsafe { self.ledger.free(header.as_ptr().cast::<u8>()) };
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    fn test_ledger() -> &'static Ledger {
        Box::leak(Box::new(Ledger::new()))
    }

    #[test]
    fn test_push_from_empty() {
        let mut array = Array::<u32>::with_ledger(test_ledger());
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);

        array.push(1);
        array.push(2);
        array.push(3);

        assert_eq!(array.len(), 3);
        assert_eq!(&array[..], &[1, 2, 3]);
        assert!(array.capacity() >= 4);
    }

    #[test]
    fn test_growth_law() {
        let mut array = Array::<u64>::with_ledger(test_ledger());

        // First allocation: max(4, required).
        array.reserve(1);
        assert_eq!(array.capacity(), 4);

        // Overflowing the capacity doubles it.
        for i in 0..5u64 {
            array.push(i);
        }
        assert_eq!(array.capacity(), 8);

        // A large requirement wins over doubling.
        array.reserve(100);
        assert_eq!(array.capacity(), 100);

        // First allocation with a large requirement skips the minimum.
        let mut big = Array::<u64>::with_ledger(test_ledger());
        big.reserve(10);
        assert_eq!(big.capacity(), 10);
    }

    #[test]
    fn test_elements_survive_growth() {
        let mut array = Array::<u32>::with_ledger(test_ledger());
        for i in 0..1000u32 {
            array.push(i);
        }
        assert_eq!(array.len(), 1000);
        for (i, v) in array.iter().enumerate() {
            assert_eq!(*v, i as u32);
        }
    }

    #[test]
    fn test_pop() {
        let mut array = Array::<i32>::with_ledger(test_ledger());
        array.extend_from_slice(&[10, 20, 30]);

        assert_eq!(array.pop(), Some(30));
        assert_eq!(array.pop(), Some(20));
        assert_eq!(array.len(), 1);
        assert_eq!(array.pop(), Some(10));
        assert_eq!(array.pop(), None);
    }

    #[test]
    fn test_remove_shifts_down() {
        let mut array = Array::<u8>::with_ledger(test_ledger());
        array.extend_from_slice(&[1, 2, 3, 4]);

        array.remove(1);
        assert_eq!(&array[..], &[1, 3, 4]);

        array.remove(2);
        assert_eq!(&array[..], &[1, 3]);

        // Out-of-range delete is a no-op.
        array.remove(10);
        assert_eq!(&array[..], &[1, 3]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut array = Array::<u16>::with_ledger(test_ledger());
        array.extend_from_slice(&[1, 2, 3, 4, 5]);
        let capacity = array.capacity();

        array.clear();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn test_empty_state_ops_are_noops() {
        let mut array = Array::<u32>::with_ledger(test_ledger());
        assert_eq!(array.pop(), None);
        array.remove(0);
        array.clear();
        assert!(array.is_empty());
        assert_eq!(&array[..], &[] as &[u32]);
    }

    #[test]
    fn test_drop_frees_through_ledger() {
        let ledger = test_ledger();
        {
            let mut array = Array::<u64>::with_ledger(ledger);
            array.push(42);
            #[cfg(debug_assertions)]
            assert_eq!(ledger.live_allocations(), 1);
        }
        assert_eq!(ledger.live_allocations(), 0);
    }

    #[test]
    fn test_leak_excludes_and_survives() {
        let ledger = test_ledger();
        let mut array = Array::<u32>::with_ledger(ledger);
        array.extend_from_slice(&[1, 2, 3]);
        array.leak();
        assert_eq!(ledger.live_allocations(), 0);

        // Still usable and growable, and growth stays off the ledger.
        for i in 0..100 {
            array.push(i);
        }
        assert_eq!(ledger.live_allocations(), 0);
        assert_eq!(array.len(), 103);

        drop(array); // keeps the block alive; nothing to report
        assert_eq!(ledger.live_allocations(), 0);
    }

    #[test]
    fn test_leak_before_first_allocation() {
        let ledger = test_ledger();
        let mut array = Array::<u32>::with_ledger(ledger);
        array.leak();
        array.push(7);
        assert_eq!(ledger.live_allocations(), 0);
    }

    #[test]
    fn test_capacity_matches_block_size() {
        let ledger = test_ledger();
        let mut array = Array::<u32>::with_ledger(ledger);
        array.reserve(7);
        // Capacity is derived from the block's stored size, not cached.
        assert_eq!(array.capacity(), 7);
        #[cfg(debug_assertions)]
        assert_eq!(
            ledger.live_bytes(),
            HEADER_SIZE + 7 * std::mem::size_of::<u32>()
        );
    }

    #[test]
    fn test_deref_mut() {
        let mut array = Array::<i64>::with_ledger(test_ledger());
        array.extend_from_slice(&[5, 6, 7]);
        array[1] = 60;
        array.sort_unstable();
        assert_eq!(&array[..], &[5, 7, 60]);
    }
}
