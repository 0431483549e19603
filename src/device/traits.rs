//! Traits the graphics backend implements so the render graph can create, place and synchronize resources.

use std::fmt::Debug;

use anyhow::Result;
use ash::vk;
use gpu_allocator::MemoryLocation;

use crate::allocator::heap_usage::HeapUsage;
use crate::resource::desc::ResourceDescriptor;

/// An aliasing barrier for a resource that was just placed in transient memory. The memory previously held
/// other resources, so its contents are undefined and the resource must be transitioned from the aliased state
/// into its initial state before first use.
#[derive(Debug)]
pub struct AliasingBarrier<'a, R> {
    /// The newly placed resource
    pub resource: &'a R,
    /// The descriptor the resource was created with
    pub desc: &'a ResourceDescriptor,
}

/// A command stream that passes record into. The graph itself only needs aliasing barriers and debug markers,
/// everything else is recorded by the passes on the concrete type.
pub trait CommandStream {
    /// Physical resource type referenced by barriers.
    type Resource;

    /// Record a batch of aliasing barriers. The graph calls this once per pass for all resources created at that pass.
    fn aliasing_barriers(&mut self, barriers: &[AliasingBarrier<'_, Self::Resource>]) -> Result<()>;

    /// Open a debug label region. Does nothing by default.
    fn begin_event(&mut self, _name: &str) {}

    /// Close the most recently opened debug label region. Does nothing by default.
    fn end_event(&mut self) {}
}

/// The graphics device the render graph allocates from.
///
/// Implementations are expected to be cheap handles that can be cloned freely. The transient heap keeps its own clone.
pub trait Device: Clone + 'static {
    /// A physical buffer or image.
    type Resource: Clone + Debug;
    /// A raw, addressable block of memory that resources can be placed in.
    type Heap;
    /// A pool of timestamp or pipeline statistics queries.
    type QueryPool;
    /// The command stream passes record into.
    type CommandStream: CommandStream<Resource = Self::Resource>;

    /// Create a resource with its own dedicated memory.
    fn create_resource(&self, desc: &ResourceDescriptor) -> Result<Self::Resource>;

    /// Create a heap of `size` bytes in memory at `location` that can hold the resource classes in `usage`.
    /// `location` is derived from the [`MemoryType`](crate::MemoryType) of the resources the heap is created for.
    fn create_heap(&self, location: MemoryLocation, usage: HeapUsage, size: u64) -> Result<Self::Heap>;

    /// Create a resource placed in `heap` at byte `offset`. The range starting at `offset` is at least as large as
    /// reported by [`Device::resource_size_and_alignment()`] and `offset` respects the reported alignment.
    fn resource_from_heap(&self, heap: &Self::Heap, offset: u64, desc: &ResourceDescriptor) -> Result<Self::Resource>;

    /// Returns the size and alignment in bytes a resource with this descriptor needs.
    fn resource_size_and_alignment(&self, desc: &ResourceDescriptor) -> (u64, u64);

    /// Create a query pool with `count` queries of type `ty`. `statistic_flags` is only meaningful for
    /// [`vk::QueryType::PIPELINE_STATISTICS`].
    fn create_query_pool(&self, ty: vk::QueryType, count: u32, statistic_flags: vk::QueryPipelineStatisticFlags) -> Result<Self::QueryPool>;

    /// Read back `count` queries starting at `first`, flattened. Timestamp queries produce one value each,
    /// pipeline statistics queries produce one value per enabled statistic flag.
    fn query_results(&self, pool: &Self::QueryPool, first: u32, count: u32) -> Result<Vec<u64>>;

    /// Attach a debug name to a resource. Does nothing by default.
    fn set_resource_name(&self, _resource: &Self::Resource, _name: &str) {}
}
