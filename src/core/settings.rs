//! Exposes all structs needed to store graph compilation and heap parameters.

use ash::vk;

/// Default capacity of a single transient heap segment, 32 MiB.
pub const DEFAULT_SEGMENT_SIZE: u64 = 32 * 1024 * 1024;

/// Settings for the [`TransientHeap`](crate::TransientHeap).
///
/// # Example
/// ```
/// # use phobos_rg::*;
/// let settings = HeapSettings {
///     segment_size: 8 * 1024 * 1024,
/// };
/// assert_eq!(settings.segment_size, 8388608);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeapSettings {
    /// Minimum size of every segment created by the heap. Requests larger than this get a segment sized
    /// exactly to the request.
    pub segment_size: u64,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}

/// Options passed to [`RenderGraph::compile()`](crate::RenderGraph::compile).
///
/// # Example
/// ```
/// # use phobos_rg::*;
/// let options = CompileOptions {
///     enable_time_profiling: true,
///     ..Default::default()
/// };
/// assert!(!options.enable_statistics_profiling);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Reserve two timestamp queries per enabled pass. Passes can write their begin and end timestamps to the
    /// slots exposed through [`PassContext::timestamp_queries()`](crate::PassContext::timestamp_queries), and the
    /// elapsed ticks can be read back with [`RenderGraph::pass_time_intervals()`](crate::RenderGraph::pass_time_intervals).
    pub enable_time_profiling: bool,
    /// Reserve one pipeline statistics query per enabled pass.
    pub enable_statistics_profiling: bool,
    /// Statistics recorded by every statistics query. Only used if `enable_statistics_profiling` is set.
    pub statistic_flags: vk::QueryPipelineStatisticFlags,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            enable_time_profiling: false,
            enable_statistics_profiling: false,
            statistic_flags: vk::QueryPipelineStatisticFlags::VERTEX_SHADER_INVOCATIONS
                | vk::QueryPipelineStatisticFlags::FRAGMENT_SHADER_INVOCATIONS
                | vk::QueryPipelineStatisticFlags::COMPUTE_SHADER_INVOCATIONS,
        }
    }
}
