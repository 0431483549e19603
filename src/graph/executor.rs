//! Execution walks the compiled plan and records every enabled pass into a command stream.
//!
//! Before a pass runs, the transient resources it accesses first are placed in the transient heap and a single batch
//! of aliasing barriers is recorded for them. After the pass, its temporaries and the transient resources it accessed
//! last are returned to the heap, so later passes can reuse the memory.

use std::collections::HashMap;

use anyhow::Result;
use slotmap::SlotMap;

use crate::allocator::transient_heap::{TransientHandle, TransientHeap};
use crate::device::traits::{AliasingBarrier, CommandStream, Device};
use crate::graph::render_graph::{resolve, Backing, RenderGraph, ResourceData, ResourceHandle};
use crate::graph::desc::ResourceKind;
use crate::resource::desc::ResourceDescriptor;
use crate::resource::query_pool::{PassQueries, ProfilingQueries};
use crate::Error;

/// Passed to a [`RenderPass`](crate::RenderPass) when it is executed.
pub struct PassContext<'a, D: Device> {
    cmd: &'a mut D::CommandStream,
    device: &'a D,
    pass_name: &'a str,
    inputs: &'a HashMap<String, usize>,
    outputs: &'a HashMap<String, usize>,
    resources: &'a [ResourceData],
    arena: &'a SlotMap<ResourceHandle, D::Resource>,
    heap: &'a mut TransientHeap<D>,
    temporaries: Vec<TransientHandle>,
    queries: PassQueries,
    profiling: &'a ProfilingQueries<D>,
}

impl<'a, D: Device> PassContext<'a, D> {
    /// The command stream to record into.
    pub fn cmd(&mut self) -> &mut D::CommandStream {
        &mut *self.cmd
    }

    /// The device the graph allocates from.
    pub fn device(&self) -> &D {
        self.device
    }

    /// Name of the pass being executed.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    fn lookup(&self, index: usize) -> Option<&D::Resource> {
        let data = self.resources.get(index)?;
        let resource = resolve(data.backing, self.arena, &*self.heap);
        if resource.is_none() && data.kind == ResourceKind::External {
            warn!("External resource {index} used by pass `{}` is not set", self.pass_name);
        }
        resource
    }

    /// The physical resource connected to input parameter `name`. Returns `None` if the parameter is not connected,
    /// or if it is connected to an external resource that was never set.
    pub fn input(&self, name: &str) -> Option<&D::Resource> {
        self.inputs.get(name).and_then(|index| self.lookup(*index))
    }

    /// The physical resource connected to output parameter `name`. Returns `None` if the parameter is not connected,
    /// or if it is connected to an external resource that was never set.
    pub fn output(&self, name: &str) -> Option<&D::Resource> {
        self.outputs.get(name).and_then(|index| self.lookup(*index))
    }

    /// Descriptor of the resource connected to input parameter `name`.
    pub fn input_desc(&self, name: &str) -> Option<ResourceDescriptor> {
        self.inputs
            .get(name)
            .and_then(|index| self.resources.get(*index))
            .map(|data| data.desc)
    }

    /// Descriptor of the resource connected to output parameter `name`.
    pub fn output_desc(&self, name: &str) -> Option<ResourceDescriptor> {
        self.outputs
            .get(name)
            .and_then(|index| self.resources.get(*index))
            .map(|data| data.desc)
    }

    /// Allocate a transient resource that only lives during this pass. It is released automatically when the pass
    /// returns, unless it is released earlier with [`PassContext::release_temporary()`].
    /// An aliasing barrier is recorded for the new resource.
    pub fn allocate_temporary(&mut self, desc: &ResourceDescriptor) -> Result<TransientHandle> {
        if !desc.is_valid() {
            return Err(Error::InvalidResourceDesc(format!("temporary of pass `{}`", self.pass_name)).into());
        }
        let handle = self.heap.allocate(desc)?;
        self.temporaries.push(handle);
        if let Some(resource) = self.heap.resource(handle) {
            self.cmd.aliasing_barriers(&[AliasingBarrier {
                resource,
                desc,
            }])?;
        }
        Ok(handle)
    }

    /// Get a temporary resource allocated by this pass.
    pub fn temporary(&self, handle: TransientHandle) -> Option<&D::Resource> {
        self.heap.resource(handle)
    }

    /// Release a temporary resource before the pass returns, so later temporaries of this pass can reuse its memory.
    pub fn release_temporary(&mut self, handle: TransientHandle) {
        match self.temporaries.iter().position(|temporary| *temporary == handle) {
            Some(position) => {
                self.temporaries.swap_remove(position);
                self.heap.release(handle);
            }
            None => warn!("Pass `{}` released a resource that is not one of its temporaries", self.pass_name),
        }
    }

    /// Timestamp query slots for the begin and end of this pass, if time profiling is enabled.
    pub fn timestamp_queries(&self) -> Option<(u32, u32)> {
        self.queries.timestamps
    }

    /// Pipeline statistics query slot of this pass, if statistics profiling is enabled.
    pub fn statistics_query(&self) -> Option<u32> {
        self.queries.statistics
    }

    /// The timestamp query pool, if time profiling is enabled.
    pub fn timestamp_pool(&self) -> Option<&D::QueryPool> {
        self.profiling.timestamp_pool()
    }

    /// The pipeline statistics query pool, if statistics profiling is enabled.
    pub fn statistics_pool(&self) -> Option<&D::QueryPool> {
        self.profiling.statistics_pool()
    }
}

impl<D: Device> RenderGraph<D> {
    /// Execute every enabled pass in order, recording into `cmd`. Can be called any number of times after a
    /// successful compilation. The physical placement of transient resources may differ between executions.
    /// # Errors
    /// * [`Error::NotCompiled`] if the graph was not compiled since the description last changed.
    /// * [`Error::InvalidResourceDesc`] if a transient resource still has no valid descriptor.
    /// * Any error returned by a render pass or the device. The remaining passes are not executed.
    pub fn execute(&mut self, cmd: &mut D::CommandStream) -> Result<()> {
        if !self.compiled {
            return Err(Error::NotCompiled.into());
        }
        self.release_leftover_transients();

        let mut enabled_index = 0;
        for index in 0..self.passes.len() {
            if !self.passes[index].enabled {
                continue;
            }
            self.create_transients(index, cmd)?;
            self.execute_pass(index, enabled_index, cmd)?;
            self.release_transients(index);
            enabled_index += 1;
        }
        Ok(())
    }

    fn create_transients(&mut self, index: usize, cmd: &mut D::CommandStream) -> Result<()> {
        let create = &self.passes[index].create;
        if create.is_empty() {
            return Ok(());
        }

        for resource in create {
            let data = &mut self.resources[*resource];
            let node = &self.desc.resources[*resource];
            if !data.desc.is_valid() {
                return Err(Error::InvalidResourceDesc(node.display_name(*resource)).into());
            }
            let handle = self.heap.allocate(&data.desc)?;
            if let (Some(name), Some(physical)) = (&node.name, self.heap.resource(handle)) {
                self.device.set_resource_name(physical, name);
            }
            data.backing = Backing::Transient(handle);
        }

        let barriers = create
            .iter()
            .filter_map(|resource| {
                let data = &self.resources[*resource];
                let Backing::Transient(handle) = data.backing else {
                    return None;
                };
                self.heap.resource(handle).map(|physical| AliasingBarrier {
                    resource: physical,
                    desc: &data.desc,
                })
            })
            .collect::<Vec<_>>();
        cmd.aliasing_barriers(&barriers)
    }

    fn execute_pass(&mut self, index: usize, enabled_index: u32, cmd: &mut D::CommandStream) -> Result<()> {
        let name = self.desc.passes[index].name.as_str();
        let pass = &mut self.passes[index];
        let mut render_pass = pass.pass.take().ok_or_else(|| Error::NoPassObject(name.to_string()))?;

        let annotate = cfg!(feature = "debug-markers") && !name.is_empty();
        if annotate {
            cmd.begin_event(name);
        }

        let (result, temporaries) = {
            let mut ctx = PassContext {
                cmd: &mut *cmd,
                device: &self.device,
                pass_name: name,
                inputs: &pass.inputs,
                outputs: &pass.outputs,
                resources: &self.resources,
                arena: &self.arena,
                heap: &mut self.heap,
                temporaries: Vec::new(),
                queries: self.queries.pass_queries(enabled_index),
                profiling: &self.queries,
            };
            let result = render_pass.execute(&mut ctx);
            (result, ctx.temporaries)
        };

        if annotate {
            cmd.end_event();
        }

        for temporary in temporaries {
            self.heap.release(temporary);
        }
        pass.pass = Some(render_pass);
        result
    }

    fn release_transients(&mut self, index: usize) {
        for resource in &self.passes[index].release {
            let data = &mut self.resources[*resource];
            if let Backing::Transient(handle) = data.backing {
                self.heap.release(handle);
                data.backing = Backing::None;
            }
        }
    }
}
