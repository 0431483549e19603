//! Profiling query pools owned by the render graph.
//!
//! When profiling is enabled at compile time, every enabled pass gets two timestamp query slots and one pipeline
//! statistics query slot. Passes write to these slots themselves, the graph only sizes the pools and reads the results.

use anyhow::Result;
use ash::vk;

use crate::core::settings::CompileOptions;
use crate::device::traits::Device;

const STATISTIC_BITS: [vk::QueryPipelineStatisticFlags; 11] = [
    vk::QueryPipelineStatisticFlags::INPUT_ASSEMBLY_VERTICES,
    vk::QueryPipelineStatisticFlags::INPUT_ASSEMBLY_PRIMITIVES,
    vk::QueryPipelineStatisticFlags::VERTEX_SHADER_INVOCATIONS,
    vk::QueryPipelineStatisticFlags::GEOMETRY_SHADER_INVOCATIONS,
    vk::QueryPipelineStatisticFlags::GEOMETRY_SHADER_PRIMITIVES,
    vk::QueryPipelineStatisticFlags::CLIPPING_INVOCATIONS,
    vk::QueryPipelineStatisticFlags::CLIPPING_PRIMITIVES,
    vk::QueryPipelineStatisticFlags::FRAGMENT_SHADER_INVOCATIONS,
    vk::QueryPipelineStatisticFlags::TESSELLATION_CONTROL_SHADER_PATCHES,
    vk::QueryPipelineStatisticFlags::TESSELLATION_EVALUATION_SHADER_INVOCATIONS,
    vk::QueryPipelineStatisticFlags::COMPUTE_SHADER_INVOCATIONS,
];

fn num_statistics(flags: vk::QueryPipelineStatisticFlags) -> usize {
    STATISTIC_BITS.iter().filter(|bit| flags.contains(**bit)).count()
}

/// Pipeline statistics of a single pass. Each field is only filled in if the matching bit was enabled
/// in [`CompileOptions::statistic_flags`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PipelineStatistics {
    /// Number of vertices in the input assembly stage
    pub input_assembly_vertices: Option<u64>,
    /// Number of primitives in the input assembly stage
    pub input_assembly_primitives: Option<u64>,
    /// Number of vertex shader invocations
    pub vertex_shader_invocations: Option<u64>,
    /// Number of geometry shader invocations
    pub geometry_shader_invocations: Option<u64>,
    /// Number of geometry shader primitives
    pub geometry_shader_primitives: Option<u64>,
    /// Number of clipping stage invocations
    pub clipping_invocations: Option<u64>,
    /// Number of clipping stage primitives
    pub clipping_primitives: Option<u64>,
    /// Number of fragment shader invocations
    pub fragment_shader_invocations: Option<u64>,
    /// Number of patches in the tessellation control shader
    pub tessellation_control_shader_patches: Option<u64>,
    /// Number of tessellation evaluation shader invocations
    pub tessellation_evaluation_shader_invocations: Option<u64>,
    /// Number of compute shader invocations
    pub compute_shader_invocations: Option<u64>,
}

impl PipelineStatistics {
    /// Parse the values of one statistics query. `data` holds one value per bit set in `flags`, in bit order.
    pub fn parse(flags: vk::QueryPipelineStatisticFlags, data: &[u64]) -> Self {
        let mut output = Self::default();
        let enabled = STATISTIC_BITS.iter().filter(|bit| flags.contains(**bit));
        for (bit, value) in enabled.zip(data.iter().copied()) {
            output.read_bit(*bit, value);
        }
        output
    }

    fn read_bit(&mut self, bit: vk::QueryPipelineStatisticFlags, value: u64) {
        let field = match bit {
            vk::QueryPipelineStatisticFlags::INPUT_ASSEMBLY_VERTICES => &mut self.input_assembly_vertices,
            vk::QueryPipelineStatisticFlags::INPUT_ASSEMBLY_PRIMITIVES => &mut self.input_assembly_primitives,
            vk::QueryPipelineStatisticFlags::VERTEX_SHADER_INVOCATIONS => &mut self.vertex_shader_invocations,
            vk::QueryPipelineStatisticFlags::GEOMETRY_SHADER_INVOCATIONS => &mut self.geometry_shader_invocations,
            vk::QueryPipelineStatisticFlags::GEOMETRY_SHADER_PRIMITIVES => &mut self.geometry_shader_primitives,
            vk::QueryPipelineStatisticFlags::CLIPPING_INVOCATIONS => &mut self.clipping_invocations,
            vk::QueryPipelineStatisticFlags::CLIPPING_PRIMITIVES => &mut self.clipping_primitives,
            vk::QueryPipelineStatisticFlags::FRAGMENT_SHADER_INVOCATIONS => &mut self.fragment_shader_invocations,
            vk::QueryPipelineStatisticFlags::TESSELLATION_CONTROL_SHADER_PATCHES => &mut self.tessellation_control_shader_patches,
            vk::QueryPipelineStatisticFlags::TESSELLATION_EVALUATION_SHADER_INVOCATIONS => {
                &mut self.tessellation_evaluation_shader_invocations
            }
            vk::QueryPipelineStatisticFlags::COMPUTE_SHADER_INVOCATIONS => &mut self.compute_shader_invocations,
            _ => return,
        };
        *field = Some(value);
    }
}

/// A query pool together with the number of queries it holds.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct SizedPool<D: Device> {
    #[derivative(Debug = "ignore")]
    pool: D::QueryPool,
    capacity: u32,
}

/// Query slots reserved for a single pass.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PassQueries {
    /// Timestamp query indices for the begin and end of the pass, if time profiling is enabled.
    pub timestamps: Option<(u32, u32)>,
    /// Pipeline statistics query index, if statistics profiling is enabled.
    pub statistics: Option<u32>,
}

/// Timestamp and pipeline statistics pools sized to the enabled passes of the last compilation.
/// Pools only grow. The statistics pool is recreated if the statistic flags change.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct ProfilingQueries<D: Device> {
    timestamps: Option<SizedPool<D>>,
    statistics: Option<SizedPool<D>>,
    statistic_flags: vk::QueryPipelineStatisticFlags,
    time_enabled: bool,
    statistics_enabled: bool,
    pass_count: u32,
}

impl<D: Device> Default for ProfilingQueries<D> {
    fn default() -> Self {
        Self {
            timestamps: None,
            statistics: None,
            statistic_flags: vk::QueryPipelineStatisticFlags::empty(),
            time_enabled: false,
            statistics_enabled: false,
            pass_count: 0,
        }
    }
}

impl<D: Device> ProfilingQueries<D> {
    /// Make sure the pools can hold the queries for `pass_count` passes with the given options.
    pub fn prepare(&mut self, device: &D, options: &CompileOptions, pass_count: u32) -> Result<()> {
        self.time_enabled = options.enable_time_profiling;
        self.statistics_enabled = options.enable_statistics_profiling;
        self.pass_count = pass_count;

        if self.time_enabled {
            let required = pass_count * 2;
            let capacity = self.timestamps.as_ref().map(|pool| pool.capacity).unwrap_or_default();
            if required > capacity {
                let pool = device.create_query_pool(vk::QueryType::TIMESTAMP, required, vk::QueryPipelineStatisticFlags::empty())?;
                #[cfg(feature = "log-objects")]
                trace!("Created timestamp query pool with {required} queries");
                self.timestamps = Some(SizedPool {
                    pool,
                    capacity: required,
                });
            }
        }

        if self.statistics_enabled {
            let flags_changed = self.statistic_flags != options.statistic_flags;
            let capacity = self.statistics.as_ref().map(|pool| pool.capacity).unwrap_or_default();
            if pass_count > capacity || flags_changed {
                let count = pass_count.max(capacity);
                let pool = device.create_query_pool(vk::QueryType::PIPELINE_STATISTICS, count, options.statistic_flags)?;
                #[cfg(feature = "log-objects")]
                trace!("Created pipeline statistics query pool with {count} queries");
                self.statistics = Some(SizedPool {
                    pool,
                    capacity: count,
                });
                self.statistic_flags = options.statistic_flags;
            }
        }
        Ok(())
    }

    /// Query slots for the enabled pass with index `index` among enabled passes.
    pub fn pass_queries(&self, index: u32) -> PassQueries {
        PassQueries {
            timestamps: self.time_enabled.then_some((index * 2, index * 2 + 1)),
            statistics: self.statistics_enabled.then_some(index),
        }
    }

    /// The timestamp query pool, if time profiling is enabled.
    pub fn timestamp_pool(&self) -> Option<&D::QueryPool> {
        self.timestamps
            .as_ref()
            .filter(|_| self.time_enabled)
            .map(|pool| &pool.pool)
    }

    /// The pipeline statistics query pool, if statistics profiling is enabled.
    pub fn statistics_pool(&self) -> Option<&D::QueryPool> {
        self.statistics
            .as_ref()
            .filter(|_| self.statistics_enabled)
            .map(|pool| &pool.pool)
    }

    /// Read back the elapsed ticks of every enabled pass. Empty if time profiling is disabled.
    pub fn time_intervals(&self, device: &D) -> Result<Vec<u64>> {
        let Some(pool) = self.timestamp_pool() else {
            return Ok(Vec::new());
        };
        if self.pass_count == 0 {
            return Ok(Vec::new());
        }
        let data = device.query_results(pool, 0, self.pass_count * 2)?;
        Ok(data
            .chunks_exact(2)
            .map(|pair| pair[1].saturating_sub(pair[0]))
            .collect())
    }

    /// Read back the pipeline statistics of every enabled pass. Empty if statistics profiling is disabled.
    pub fn statistics(&self, device: &D) -> Result<Vec<PipelineStatistics>> {
        let Some(pool) = self.statistics_pool() else {
            return Ok(Vec::new());
        };
        let per_query = num_statistics(self.statistic_flags);
        if self.pass_count == 0 || per_query == 0 {
            return Ok(vec![PipelineStatistics::default(); self.pass_count as usize]);
        }
        let data = device.query_results(pool, 0, self.pass_count)?;
        Ok(data
            .chunks_exact(per_query)
            .map(|values| PipelineStatistics::parse(self.statistic_flags, values))
            .collect())
    }
}
