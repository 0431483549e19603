pub use ash::vk;
pub use gpu_allocator::MemoryLocation;

pub use crate::core::error::Error;
pub use crate::core::settings::*;

pub use crate::device::traits::*;

pub use crate::allocator::free_list::FreeList;
pub use crate::allocator::heap_usage::HeapUsage;
pub use crate::allocator::memory_type::MemoryType;
pub use crate::allocator::transient_heap::{TransientHandle, TransientHeap};

pub use crate::resource::desc::*;
pub use crate::resource::query_pool::{PassQueries, PipelineStatistics};

pub use crate::graph::compiler::CompileContext;
pub use crate::graph::desc::*;
pub use crate::graph::executor::PassContext;
pub use crate::graph::graphviz::GraphViz;
pub use crate::graph::pass::{PassType, RenderPass};
pub use crate::graph::registry::{PassParameter, PassTypeDesc, Registry};
pub use crate::graph::render_graph::{Lifetime, RenderGraph, RenderGraphBuilder, ResourceHandle};
