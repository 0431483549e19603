//! Exposes different memory types that determine where resource memory should live.

use gpu_allocator::MemoryLocation;

/// The memory type of a resource indicates where its memory should live. It is part of every
/// [`ResourceDescriptor`](crate::ResourceDescriptor), and the [`TransientHeap`](crate::TransientHeap) only places
/// resources in segments of the same memory type.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MemoryType {
    /// Store the resource in GPU only accessible memory - typically this is the faster GPU memory and this should be
    /// where most render targets and intermediate buffers live.
    #[default]
    GpuOnly,
    /// Memory useful for uploading data to the GPU and potentially for constant buffers.
    CpuToGpu,
    /// Memory useful for CPU readback of data.
    GpuToCpu,
}

/// Transient heap segments are requested from the [`Device`](crate::Device) with this location.
impl From<MemoryType> for MemoryLocation {
    fn from(ty: MemoryType) -> Self {
        match ty {
            MemoryType::GpuOnly => MemoryLocation::GpuOnly,
            MemoryType::CpuToGpu => MemoryLocation::CpuToGpu,
            MemoryType::GpuToCpu => MemoryLocation::GpuToCpu,
        }
    }
}
