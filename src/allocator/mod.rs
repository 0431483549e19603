//! The allocator module exposes the transient heap and its building blocks.
//! <br>
//! <br>
//! # Transient heap
//! The [`TransientHeap`](transient_heap::TransientHeap) places short-lived resources in large segments of device memory.
//! Resources that are never alive at the same time can share memory.
//! # Free list
//! A sorted list of free byte ranges used to sub-allocate a single segment. For more information check the
//! [`free_list`] module documentation.

pub mod free_list;
pub mod heap_usage;
pub mod memory_type;
pub mod transient_heap;
