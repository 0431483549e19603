#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};

use phobos_rg::prelude::*;
use phobos_rg::util::align::align;

pub const BUFFER_ALIGNMENT: u64 = 256;
pub const IMAGE_ALIGNMENT: u64 = 4096;

/// A fake physical resource. Placed resources remember which heap they live in, so tests can check for overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResource {
    pub id: u64,
    pub desc: ResourceDescriptor,
    pub placement: Option<Placement>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Placement {
    pub heap: u64,
    pub offset: u64,
    pub size: u64,
}

impl Placement {
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.heap == other.heap && self.offset < other.offset + other.size && other.offset < self.offset + self.size
    }
}

#[derive(Debug)]
pub struct MockHeap {
    pub id: u64,
    pub location: MemoryLocation,
    pub usage: HeapUsage,
    pub size: u64,
}

#[derive(Debug)]
pub struct MockQueryPool {
    pub id: u64,
    pub ty: vk::QueryType,
    pub count: u32,
    pub flags: vk::QueryPipelineStatisticFlags,
}

#[derive(Debug, Default)]
pub struct DeviceState {
    next_id: u64,
    pub dedicated_resources: usize,
    pub placed_resources: usize,
    pub heaps: Vec<(MemoryLocation, HeapUsage, u64)>,
    pub query_pools: Vec<(vk::QueryType, u32)>,
    pub names: HashMap<u64, String>,
    pub fail_placement: bool,
}

impl DeviceState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Every device object created so far.
    pub fn object_count(&self) -> usize {
        self.dedicated_resources + self.placed_resources + self.heaps.len() + self.query_pools.len()
    }
}

/// Device that records every call, sizes resources deterministically and returns fixed query results.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap()
    }

    pub fn name_of(&self, resource: &MockResource) -> Option<String> {
        self.state().names.get(&resource.id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(String),
    End,
}

/// Command stream that records barriers, debug events and whatever the passes log into it.
#[derive(Debug, Default)]
pub struct MockCommandStream {
    /// One entry per aliasing barrier batch, holding the ids of the resources.
    pub barriers: Vec<Vec<u64>>,
    pub events: Vec<Event>,
    /// Names of executed passes, in order.
    pub executed: Vec<String>,
    /// (pass, parameter, resource) for every lookup done by a recording pass.
    pub accesses: Vec<(String, String, Option<MockResource>)>,
}

impl MockCommandStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access(&self, pass: &str, parameter: &str) -> Option<MockResource> {
        self.accesses
            .iter()
            .rev()
            .find(|(p, param, _)| p == pass && param == parameter)
            .and_then(|(_, _, resource)| resource.clone())
    }
}

impl CommandStream for MockCommandStream {
    type Resource = MockResource;

    fn aliasing_barriers(&mut self, barriers: &[AliasingBarrier<'_, MockResource>]) -> Result<()> {
        assert!(barriers.iter().all(|barrier| barrier.resource.desc == *barrier.desc));
        self.barriers
            .push(barriers.iter().map(|barrier| barrier.resource.id).collect());
        Ok(())
    }

    fn begin_event(&mut self, name: &str) {
        self.events.push(Event::Begin(name.to_string()));
    }

    fn end_event(&mut self) {
        self.events.push(Event::End);
    }
}

impl Device for MockDevice {
    type Resource = MockResource;
    type Heap = MockHeap;
    type QueryPool = MockQueryPool;
    type CommandStream = MockCommandStream;

    fn create_resource(&self, desc: &ResourceDescriptor) -> Result<MockResource> {
        let mut state = self.state();
        state.dedicated_resources += 1;
        Ok(MockResource {
            id: state.next_id(),
            desc: *desc,
            placement: None,
        })
    }

    fn create_heap(&self, location: MemoryLocation, usage: HeapUsage, size: u64) -> Result<MockHeap> {
        let mut state = self.state();
        state.heaps.push((location, usage, size));
        Ok(MockHeap {
            id: state.next_id(),
            location,
            usage,
            size,
        })
    }

    fn resource_from_heap(&self, heap: &MockHeap, offset: u64, desc: &ResourceDescriptor) -> Result<MockResource> {
        let (size, alignment) = self.resource_size_and_alignment(desc);
        assert_eq!(offset % alignment, 0, "misaligned placement");
        assert!(offset + size <= heap.size, "placement out of heap bounds");
        assert_eq!(heap.location, MemoryLocation::from(desc.memory_type()));
        assert!(heap.usage.contains(HeapUsage::required_for(desc)));

        let mut state = self.state();
        if state.fail_placement {
            bail!("placement failed");
        }
        state.placed_resources += 1;
        Ok(MockResource {
            id: state.next_id(),
            desc: *desc,
            placement: Some(Placement {
                heap: heap.id,
                offset,
                size,
            }),
        })
    }

    fn resource_size_and_alignment(&self, desc: &ResourceDescriptor) -> (u64, u64) {
        match desc {
            ResourceDescriptor::Buffer(buffer) => (align(buffer.size, BUFFER_ALIGNMENT), BUFFER_ALIGNMENT),
            ResourceDescriptor::Image(image) => {
                let samples = image.samples.as_raw().max(1) as u64;
                let texels = image.extent.width as u64 * image.extent.height.max(1) as u64 * image.extent.depth.max(1) as u64;
                let size = texels * 4 * samples * image.array_layers.max(1) as u64;
                (align(size, IMAGE_ALIGNMENT), IMAGE_ALIGNMENT)
            }
        }
    }

    fn create_query_pool(&self, ty: vk::QueryType, count: u32, statistic_flags: vk::QueryPipelineStatisticFlags) -> Result<MockQueryPool> {
        let mut state = self.state();
        state.query_pools.push((ty, count));
        Ok(MockQueryPool {
            id: state.next_id(),
            ty,
            count,
            flags: statistic_flags,
        })
    }

    /// Timestamp `j` reads as `j * 100 + (j % 2) * 7`, so every begin/end pair is 107 ticks apart.
    /// Statistic `b` of query `j` reads as `(j + 1) * 1000 + b`.
    fn query_results(&self, pool: &MockQueryPool, first: u32, count: u32) -> Result<Vec<u64>> {
        assert!(first + count <= pool.count, "query range out of pool bounds");
        let queries = first as u64..(first + count) as u64;
        if pool.ty == vk::QueryType::TIMESTAMP {
            Ok(queries.map(|j| j * 100 + (j % 2) * 7).collect())
        } else {
            let per_query = pool.flags.as_raw().count_ones() as u64;
            Ok(queries
                .flat_map(|j| (0..per_query).map(move |b| (j + 1) * 1000 + b))
                .collect())
        }
    }

    fn set_resource_name(&self, resource: &MockResource, name: &str) {
        self.state().names.insert(resource.id, name.to_string());
    }
}

pub fn buffer(size: u64) -> ResourceDescriptor {
    ResourceDescriptor::buffer(MemoryType::GpuOnly, size, vk::BufferUsageFlags::STORAGE_BUFFER)
}

pub fn render_target(width: u32, height: u32) -> ResourceDescriptor {
    ResourceDescriptor::image_2d(
        MemoryType::GpuOnly,
        vk::Format::R8G8B8A8_UNORM,
        width,
        height,
        vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
    )
}

/// A pass type that looks up every declared parameter when executed and logs the result into the command stream.
pub fn recording_type(name: &str, inputs: &[&str], outputs: &[&str]) -> PassTypeDesc<MockDevice> {
    let input_names = inputs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let output_names = outputs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let mut desc = PassTypeDesc::from_fn(name, move |ctx: &mut CompileContext<'_, MockDevice>| -> Result<()> {
        let inputs = input_names.clone();
        let outputs = output_names.clone();
        ctx.set_render_pass_fn(move |ctx: &mut PassContext<'_, MockDevice>| -> Result<()> {
            let pass = ctx.pass_name().to_string();
            let mut accesses = Vec::new();
            for param in &inputs {
                accesses.push((pass.clone(), param.clone(), ctx.input(param).cloned()));
            }
            for param in &outputs {
                accesses.push((pass.clone(), param.clone(), ctx.output(param).cloned()));
            }
            let cmd = ctx.cmd();
            cmd.executed.push(pass);
            cmd.accesses.extend(accesses);
            Ok(())
        });
        Ok(())
    });
    for input in inputs {
        desc = desc.input(*input, "");
    }
    for output in outputs {
        desc = desc.output(*output, "");
    }
    desc
}

/// Registry with the pass types most tests need:
/// - `Write`: writes `out`
/// - `ReadWrite`: reads `in`, writes `out`
/// - `Read2Write`: reads `a` and `b`, writes `out`
pub fn make_registry() -> Registry<MockDevice> {
    let registry = Registry::new();
    registry.register(recording_type("Write", &[], &["out"])).unwrap();
    registry.register(recording_type("ReadWrite", &["in"], &["out"])).unwrap();
    registry
        .register(recording_type("Read2Write", &["a", "b"], &["out"]))
        .unwrap();
    registry
}

pub fn make_graph(desc: RenderGraphDesc) -> (MockDevice, RenderGraph<MockDevice>) {
    let _ = pretty_env_logger::try_init();
    let device = MockDevice::new();
    let graph = RenderGraphBuilder::new(device.clone(), make_registry())
        .desc(desc)
        .build();
    (device, graph)
}

pub fn error_of(err: &anyhow::Error) -> &Error {
    err.downcast_ref::<Error>().expect("not a render graph error")
}
