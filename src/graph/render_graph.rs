//! The render graph object and the state derived from its description.

use std::collections::HashMap;

use anyhow::Result;
use slotmap::{new_key_type, SlotMap};

use crate::allocator::transient_heap::{TransientHandle, TransientHeap};
use crate::core::settings::HeapSettings;
use crate::device::traits::Device;
use crate::graph::desc::{RenderGraphDesc, ResourceKind};
use crate::graph::pass::BoxedRenderPass;
use crate::graph::registry::Registry;
use crate::resource::desc::ResourceDescriptor;
use crate::resource::query_pool::{PipelineStatistics, ProfilingQueries};
use crate::Error;

new_key_type! {
    /// Handle to a persistent or external resource owned by a [`RenderGraph`]. Handles of persistent resources
    /// become stale when the graph is compiled again.
    pub struct ResourceHandle;
}

/// Range of passes a resource is accessed in, as indices into the pass list of the description. Both ends
/// are inclusive and always refer to enabled passes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Lifetime {
    /// First enabled pass that reads or writes the resource.
    pub first: usize,
    /// Last enabled pass that reads or writes the resource.
    pub last: usize,
}

impl Lifetime {
    pub(crate) fn extend(lifetime: Option<Lifetime>, pass: usize) -> Lifetime {
        match lifetime {
            None => Lifetime {
                first: pass,
                last: pass,
            },
            Some(lifetime) => Lifetime {
                first: lifetime.first.min(pass),
                last: lifetime.last.max(pass),
            },
        }
    }

    /// Whether two lifetimes share at least one pass.
    pub fn overlaps(&self, other: &Lifetime) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Where the physical resource behind a resource node comes from.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Backing {
    #[default]
    None,
    Persistent(ResourceHandle),
    External(ResourceHandle),
    Transient(TransientHandle),
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub(crate) struct PassData<D: Device> {
    pub inputs: HashMap<String, usize>,
    pub outputs: HashMap<String, usize>,
    pub enabled: bool,
    /// Transient resources created right before this pass.
    pub create: Vec<usize>,
    /// Transient resources released right after this pass.
    pub release: Vec<usize>,
    #[derivative(Debug = "ignore")]
    pub pass: Option<BoxedRenderPass<D>>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ResourceData {
    pub kind: ResourceKind,
    pub desc: ResourceDescriptor,
    pub lifetime: Option<Lifetime>,
    pub backing: Backing,
}

pub(crate) fn resolve<'r, D: Device>(
    backing: Backing,
    arena: &'r SlotMap<ResourceHandle, D::Resource>,
    heap: &'r TransientHeap<D>,
) -> Option<&'r D::Resource> {
    match backing {
        Backing::None => None,
        Backing::Persistent(handle) | Backing::External(handle) => arena.get(handle),
        Backing::Transient(handle) => heap.resource(handle),
    }
}

/// Compiles a [`RenderGraphDesc`] into an execution plan and executes it.
///
/// The usual flow is [`RenderGraph::set_desc()`], [`RenderGraph::compile()`] once, then
/// [`RenderGraph::execute()`] every frame. The graph only needs to be compiled again when the description changes.
///
/// # Example
/// ```
/// # use phobos_rg::*;
/// # use anyhow::Result;
/// fn present<D: Device>(
///     device: &D,
///     registry: Registry<D>,
///     swapchain_image: D::Resource,
///     cmd: &mut D::CommandStream,
/// ) -> Result<()> {
///     let mut desc = RenderGraphDesc::default();
///     let backbuffer = desc.add_resource(ResourceNode::external("backbuffer").output());
///     let blit = desc.add_pass(PassNode::new("blit", "Blit"));
///     desc.add_output(blit, "dst", backbuffer);
///
///     let mut graph = RenderGraphBuilder::new(device.clone(), registry)
///         .segment_size(64 * 1024 * 1024)
///         .desc(desc)
///         .build();
///     graph.compile(CompileOptions::default())?;
///     graph.set_external_resource(backbuffer, swapchain_image)?;
///     graph.execute(cmd)
/// }
/// ```
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct RenderGraph<D: Device> {
    #[derivative(Debug = "ignore")]
    pub(crate) device: D,
    pub(crate) registry: Registry<D>,
    pub(crate) desc: RenderGraphDesc,
    pub(crate) passes: Vec<PassData<D>>,
    pub(crate) resources: Vec<ResourceData>,
    /// Persistent and external resources
    pub(crate) arena: SlotMap<ResourceHandle, D::Resource>,
    pub(crate) externals: HashMap<usize, ResourceHandle>,
    pub(crate) heap: TransientHeap<D>,
    pub(crate) queries: ProfilingQueries<D>,
    pub(crate) compiled: bool,
}

impl<D: Device> RenderGraph<D> {
    /// Create a render graph with an empty description and default heap settings.
    pub fn new(device: D, registry: Registry<D>) -> Self {
        Self::with_settings(device, registry, HeapSettings::default())
    }

    /// Create a render graph with an empty description.
    pub fn with_settings(device: D, registry: Registry<D>, settings: HeapSettings) -> Self {
        Self {
            heap: TransientHeap::new(device.clone(), settings),
            device,
            registry,
            desc: RenderGraphDesc::default(),
            passes: Vec::new(),
            resources: Vec::new(),
            arena: SlotMap::with_key(),
            externals: HashMap::new(),
            queries: ProfilingQueries::default(),
            compiled: false,
        }
    }

    /// Replace the description. The graph must be compiled again before it can be executed.
    pub fn set_desc(&mut self, desc: RenderGraphDesc) {
        self.desc = desc;
        self.compiled = false;
    }

    /// The current description.
    pub fn desc(&self) -> &RenderGraphDesc {
        &self.desc
    }

    /// The device this graph allocates from.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The registry pass types are looked up in.
    pub fn registry(&self) -> &Registry<D> {
        &self.registry
    }

    /// Whether the last call to [`RenderGraph::compile()`] succeeded and the description did not change since.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Indices of all enabled passes of the last compilation, in execution order.
    pub fn enabled_passes(&self) -> Vec<usize> {
        self.passes
            .iter()
            .enumerate()
            .filter(|(_, pass)| pass.enabled)
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether the pass at `index` will be executed.
    pub fn is_pass_enabled(&self, index: usize) -> bool {
        self.passes.get(index).map(|pass| pass.enabled).unwrap_or(false)
    }

    /// Passes the resource at `index` is accessed in, or `None` if no enabled pass accesses it.
    pub fn resource_lifetime(&self, index: usize) -> Option<Lifetime> {
        self.resources.get(index).and_then(|resource| resource.lifetime)
    }

    /// The descriptor of a resource after compilation, including changes made by compile callbacks.
    pub fn resource_desc(&self, index: usize) -> Option<ResourceDescriptor> {
        self.resources.get(index).map(|resource| resource.desc)
    }

    /// Handle of the persistent resource created for resource `index` by the last compilation.
    pub fn persistent_resource(&self, index: usize) -> Option<ResourceHandle> {
        match self.resources.get(index)?.backing {
            Backing::Persistent(handle) => Some(handle),
            _ => None,
        }
    }

    /// Look up a persistent or external resource by handle. Returns `None` for stale handles.
    pub fn resource(&self, handle: ResourceHandle) -> Option<&D::Resource> {
        self.arena.get(handle)
    }

    /// Bind a caller owned resource to the external resource node at `index`. The binding is kept across
    /// compilations for as long as the node stays external.
    /// # Errors
    /// * Fails with [`Error::ResourceOutOfRange`] if `index` is not a resource of the current description.
    /// * Fails with [`Error::NotExternal`] if the resource node is not external.
    pub fn set_external_resource(&mut self, index: usize, resource: D::Resource) -> Result<ResourceHandle> {
        let node = self.desc.resources.get(index).ok_or(Error::ResourceOutOfRange(index))?;
        if node.kind != ResourceKind::External {
            return Err(Error::NotExternal(index).into());
        }

        let handle = match self.externals.get(&index).copied() {
            Some(handle) if self.arena.contains_key(handle) => {
                self.arena[handle] = resource;
                handle
            }
            _ => {
                let handle = self.arena.insert(resource);
                self.externals.insert(index, handle);
                handle
            }
        };

        if let Some(data) = self.resources.get_mut(index) {
            if data.kind == ResourceKind::External {
                data.backing = Backing::External(handle);
            }
        }
        Ok(handle)
    }

    /// Elapsed timestamp ticks of every enabled pass during the last execution, in execution order.
    /// Empty if time profiling was not enabled when the graph was compiled.
    pub fn pass_time_intervals(&self) -> Result<Vec<u64>> {
        if !self.compiled {
            return Ok(Vec::new());
        }
        self.queries.time_intervals(&self.device)
    }

    /// Pipeline statistics of every enabled pass during the last execution, in execution order.
    /// Empty if statistics profiling was not enabled when the graph was compiled.
    pub fn pass_statistics(&self) -> Result<Vec<PipelineStatistics>> {
        if !self.compiled {
            return Ok(Vec::new());
        }
        self.queries.statistics(&self.device)
    }

    /// The heap transient resources are placed in.
    pub fn transient_heap(&self) -> &TransientHeap<D> {
        &self.heap
    }

    /// Return transient resources that are still alive to the heap. This only happens after an execution
    /// was aborted by an error.
    pub(crate) fn release_leftover_transients(&mut self) {
        for resource in &mut self.resources {
            if let Backing::Transient(handle) = resource.backing {
                self.heap.release(handle);
                resource.backing = Backing::None;
            }
        }
    }
}

impl<D: Device> Drop for RenderGraph<D> {
    fn drop(&mut self) {
        self.release_leftover_transients();
    }
}

/// Builder for a [`RenderGraph`].
///
/// # Example
/// ```
/// # use phobos_rg::*;
/// fn build<D: Device>(device: D, registry: Registry<D>, desc: RenderGraphDesc) -> RenderGraph<D> {
///     RenderGraphBuilder::new(device, registry)
///         .segment_size(16 * 1024 * 1024)
///         .desc(desc)
///         .build()
/// }
/// ```
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct RenderGraphBuilder<D: Device> {
    #[derivative(Debug = "ignore")]
    device: D,
    registry: Registry<D>,
    settings: HeapSettings,
    desc: RenderGraphDesc,
}

impl<D: Device> RenderGraphBuilder<D> {
    /// Start building a render graph that allocates from `device` and looks up pass types in `registry`.
    pub fn new(device: D, registry: Registry<D>) -> Self {
        Self {
            device,
            registry,
            settings: HeapSettings::default(),
            desc: RenderGraphDesc::default(),
        }
    }

    /// Set the minimum size of transient heap segments.
    pub fn segment_size(mut self, size: u64) -> Self {
        self.settings.segment_size = size;
        self
    }

    /// Set all transient heap settings.
    pub fn heap_settings(mut self, settings: HeapSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the initial description.
    pub fn desc(mut self, desc: RenderGraphDesc) -> Self {
        self.desc = desc;
        self
    }

    /// Build the render graph. It still has to be compiled before it can be executed.
    pub fn build(self) -> RenderGraph<D> {
        let mut graph = RenderGraph::with_settings(self.device, self.registry, self.settings);
        graph.set_desc(self.desc);
        graph
    }
}
