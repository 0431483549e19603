//! An ordered free-list of byte ranges, used to sub-allocate transient heap segments.
//!
//! Free ranges are kept sorted, disjoint and non-adjacent. Allocation is first-fit, releasing a range
//! merges it with its byte-adjacent neighbours.
//!
//! # Example
//! ```
//! # use phobos_rg::allocator::free_list::FreeList;
//! let mut list = FreeList::new(1024);
//! let a = list.allocate(256, 256).unwrap();
//! let b = list.allocate(256, 256).unwrap();
//! assert_eq!((a, b), (0, 256));
//! list.release(a..a + 256);
//! list.release(b..b + 256);
//! assert_eq!(list.ranges(), &[0..1024]);
//! ```

use std::ops::Range;

use crate::util::align::align;

/// Sorted list of free byte ranges inside a block of memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreeList {
    ranges: Vec<Range<u64>>,
}

impl FreeList {
    /// Create a free list where the whole block of `size` bytes is free.
    pub fn new(size: u64) -> Self {
        let ranges = if size == 0 {
            vec![]
        } else {
            vec![0..size]
        };
        Self {
            ranges,
        }
    }

    /// Allocate `size` bytes with the start aligned to `alignment`. Returns the offset of the allocation,
    /// or `None` if no free range is large enough.
    pub fn allocate(&mut self, size: u64, alignment: u64) -> Option<u64> {
        debug_assert!(size != 0, "Zero sized allocation");
        for (index, block) in self.ranges.iter().enumerate() {
            let begin = align(block.start, alignment);
            let end = begin + size;
            if end > block.end {
                continue;
            }

            let before = block.start..begin;
            let after = end..block.end;
            match (before.is_empty(), after.is_empty()) {
                (false, false) => {
                    self.ranges[index] = after;
                    self.ranges.insert(index, before);
                }
                (false, true) => self.ranges[index] = before,
                (true, false) => self.ranges[index] = after,
                (true, true) => {
                    self.ranges.remove(index);
                }
            }
            return Some(begin);
        }
        None
    }

    /// Return a range to the free list. The range must not overlap any free range.
    pub fn release(&mut self, range: Range<u64>) {
        if range.is_empty() {
            return;
        }

        // First free range that starts after the released one
        let index = self.ranges.partition_point(|free| free.start < range.start);
        debug_assert!(index == 0 || self.ranges[index - 1].end <= range.start, "Double free of {range:?}");
        debug_assert!(
            index == self.ranges.len() || range.end <= self.ranges[index].start,
            "Double free of {range:?}"
        );

        let merge_prev = index > 0 && self.ranges[index - 1].end == range.start;
        let merge_next = index < self.ranges.len() && self.ranges[index].start == range.end;
        match (merge_prev, merge_next) {
            (true, true) => {
                self.ranges[index - 1].end = self.ranges[index].end;
                self.ranges.remove(index);
            }
            (true, false) => self.ranges[index - 1].end = range.end,
            (false, true) => self.ranges[index].start = range.start,
            (false, false) => self.ranges.insert(index, range),
        }
    }

    /// The free ranges, sorted by offset.
    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }

    /// Total amount of free bytes.
    pub fn free_bytes(&self) -> u64 {
        self.ranges.iter().map(|range| range.end - range.start).sum()
    }
}
