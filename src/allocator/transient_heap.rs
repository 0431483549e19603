//! The transient heap places short-lived resources in large blocks of device memory, so that resources whose
//! lifetimes never overlap can share the same physical memory.
//!
//! Memory is reserved in segments. Every segment has a memory type and a set of [`HeapUsage`] flags, and keeps a
//! [`FreeList`] of unused byte ranges. An allocation searches all compatible segments first-fit, and creates a new
//! segment when nothing fits. Segments are never compacted or freed until the heap is dropped.

use std::ops::Range;

use anyhow::Result;
use slotmap::{new_key_type, SlotMap};

use crate::allocator::free_list::FreeList;
use crate::allocator::heap_usage::HeapUsage;
use crate::allocator::memory_type::MemoryType;
use crate::core::settings::HeapSettings;
use crate::device::traits::Device;
use crate::resource::desc::ResourceDescriptor;
use crate::Error;

new_key_type! {
    /// Handle to a resource allocated from a [`TransientHeap`]. Handles are generation-tagged, a handle
    /// whose allocation was released will never resolve to a newer allocation.
    pub struct TransientHandle;
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct Segment<D: Device> {
    memory_type: MemoryType,
    usage: HeapUsage,
    size: u64,
    #[derivative(Debug = "ignore")]
    heap: D::Heap,
    free: FreeList,
}

impl<D: Device> Segment<D> {
    fn is_compatible(&self, memory_type: MemoryType, usage: HeapUsage) -> bool {
        self.memory_type == memory_type && self.usage.contains(usage)
    }
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct Allocation<D: Device> {
    segment: usize,
    range: Range<u64>,
    resource: D::Resource,
}

/// Segmented heap for transient resources. Owned by a single render graph and not internally synchronized.
///
/// # Example
/// ```
/// # use phobos_rg::*;
/// # use anyhow::Result;
/// fn reuse<D: Device>(device: &D) -> Result<()> {
///     let mut heap = TransientHeap::new(device.clone(), HeapSettings::default());
///     let desc = ResourceDescriptor::buffer(MemoryType::GpuOnly, 256, vk::BufferUsageFlags::STORAGE_BUFFER);
///     let a = heap.allocate(&desc)?;
///     heap.release(a);
///     // The released range is reused for the next compatible allocation.
///     let b = heap.allocate(&desc)?;
///     assert_eq!(heap.segment_count(), 1);
///     heap.release(b);
///     Ok(())
/// }
/// ```
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct TransientHeap<D: Device> {
    #[derivative(Debug = "ignore")]
    device: D,
    settings: HeapSettings,
    segments: Vec<Segment<D>>,
    allocations: SlotMap<TransientHandle, Allocation<D>>,
}

impl<D: Device> TransientHeap<D> {
    /// Create an empty heap. No memory is reserved until the first allocation.
    pub fn new(device: D, settings: HeapSettings) -> Self {
        Self {
            device,
            settings,
            segments: Vec::new(),
            allocations: SlotMap::with_key(),
        }
    }

    /// Place a resource with this descriptor in the heap.
    /// # Errors
    /// * Fails with [`Error::InvalidResourceDesc`] if the descriptor is not valid.
    /// * Fails if the device cannot create a new segment or place the resource. In the latter case the reserved
    ///   range is returned to the free list.
    pub fn allocate(&mut self, desc: &ResourceDescriptor) -> Result<TransientHandle> {
        if !desc.is_valid() {
            return Err(Error::InvalidResourceDesc(format!("{:?}", desc.resource_type())).into());
        }

        let (size, alignment) = self.device.resource_size_and_alignment(desc);
        let memory_type = desc.memory_type();
        let usage = HeapUsage::required_for(desc);

        let found = self
            .segments
            .iter_mut()
            .enumerate()
            .filter(|(_, segment)| segment.is_compatible(memory_type, usage))
            .find_map(|(index, segment)| segment.free.allocate(size, alignment).map(|offset| (index, offset)));

        let (index, offset) = match found {
            Some(found) => found,
            None => {
                let index = self.create_segment(memory_type, usage, size)?;
                let offset = self.segments[index]
                    .free
                    .allocate(size, alignment)
                    .ok_or(Error::Uncategorized("Allocation from a new heap segment failed"))?;
                (index, offset)
            }
        };

        let range = offset..offset + size;
        let segment = &mut self.segments[index];
        match self.device.resource_from_heap(&segment.heap, offset, desc) {
            Ok(resource) => Ok(self.allocations.insert(Allocation {
                segment: index,
                range,
                resource,
            })),
            Err(err) => {
                segment.free.release(range);
                Err(err)
            }
        }
    }

    /// Return an allocation to the heap. Releasing a stale handle does nothing.
    pub fn release(&mut self, handle: TransientHandle) {
        match self.allocations.remove(handle) {
            Some(allocation) => {
                self.segments[allocation.segment].free.release(allocation.range);
            }
            None => {
                warn!("Ignoring release of stale transient handle {handle:?}");
            }
        }
    }

    /// Get the resource behind a handle, or `None` if the handle was released.
    pub fn resource(&self, handle: TransientHandle) -> Option<&D::Resource> {
        self.allocations.get(handle).map(|allocation| &allocation.resource)
    }

    /// Get the segment index and byte range backing a live allocation.
    pub fn allocation_range(&self, handle: TransientHandle) -> Option<(usize, Range<u64>)> {
        self.allocations
            .get(handle)
            .map(|allocation| (allocation.segment, allocation.range.clone()))
    }

    /// The settings this heap was created with.
    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    /// Number of segments created so far.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total amount of bytes reserved over all segments.
    pub fn reserved_bytes(&self) -> u64 {
        self.segments.iter().map(|segment| segment.size).sum()
    }

    /// Number of allocations that were not released yet.
    pub fn live_allocations(&self) -> usize {
        self.allocations.len()
    }

    /// Usage flags of a segment.
    pub fn segment_usage(&self, segment: usize) -> Option<HeapUsage> {
        self.segments.get(segment).map(|segment| segment.usage)
    }

    /// Free byte ranges of a segment, sorted by offset.
    pub fn free_ranges(&self, segment: usize) -> Option<&[Range<u64>]> {
        self.segments.get(segment).map(|segment| segment.free.ranges())
    }

    fn create_segment(&mut self, memory_type: MemoryType, usage: HeapUsage, size: u64) -> Result<usize> {
        let size = self.settings.segment_size.max(size);
        let heap = self.device.create_heap(memory_type.into(), usage, size)?;
        #[cfg(feature = "log-objects")]
        trace!("Created new transient heap segment ({size} bytes, {memory_type:?}, {usage:?})");
        self.segments.push(Segment {
            memory_type,
            usage,
            size,
            heap,
            free: FreeList::new(size),
        });
        Ok(self.segments.len() - 1)
    }
}

impl<D: Device> Drop for TransientHeap<D> {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying transient heap with {} segments", self.segments.len());
        if !self.allocations.is_empty() {
            warn!("Transient heap dropped with {} live allocations", self.allocations.len());
        }
    }
}
