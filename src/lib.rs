//! Render graph compiler, executor and transient resource aliasing heap
//!
//! A render graph describes the GPU work of a frame as passes that read and write resources. This crate
//! turns such a description into an ordered execution plan: passes that do not contribute to any output are culled,
//! the lifetime of every resource is inferred, and transient resources whose lifetimes never overlap are placed in the
//! same memory.
//!
//! The graphics API is abstracted behind the [`Device`] and [`CommandStream`] traits, so the graph can drive any
//! backend that can create resources in heaps and record aliasing barriers.
//!
//! To get started, the easiest way is to simply
//! ```
//! // Import types under a namespace.
//! use phobos_rg::prelude as rg;
//!
//! // Or, if you dont care about using the types under a namespace
//! use phobos_rg::prelude::*;
//! ```
//!
//! # Example
//!
//! First, pass types are registered in a [`Registry`]. A pass type declares its parameters and has a compile
//! callback that registers the object that executes the pass.
//! ```
//! use phobos_rg::prelude::*;
//! use anyhow::Result;
//!
//! fn register<D: Device>(registry: &Registry<D>) -> Result<()> {
//!     registry.register(
//!         PassTypeDesc::from_fn("Fill", |ctx: &mut CompileContext<'_, D>| -> Result<()> {
//!             ctx.set_render_pass_fn(|ctx: &mut PassContext<'_, D>| -> Result<()> {
//!                 let _target = ctx.output("target");
//!                 Ok(())
//!             });
//!             Ok(())
//!         })
//!         .output("target", "Resource to fill"),
//!     )
//! }
//! ```
//! Then a description is built and compiled, and the graph can be executed every frame.
//! ```
//! use phobos_rg::prelude::*;
//! use anyhow::Result;
//!
//! fn run<D: Device>(device: D, registry: Registry<D>, cmd: &mut D::CommandStream) -> Result<()> {
//!     let mut desc = RenderGraphDesc::default();
//!     let target = desc.add_resource(ResourceNode::persistent("target", ResourceDescriptor::buffer(
//!         MemoryType::GpuOnly, 1024, vk::BufferUsageFlags::STORAGE_BUFFER)).output());
//!     let fill = desc.add_pass(PassNode::new("fill", "Fill"));
//!     desc.add_output(fill, "target", target);
//!
//!     let mut graph = RenderGraphBuilder::new(device, registry).desc(desc).build();
//!     graph.compile(CompileOptions::default())?;
//!     graph.execute(cmd)
//! }
//! ```
//! For further information, check out the following modules
//! - [`graph`] for the description, compilation and execution of render graphs.
//! - [`allocator`] for the transient heap and its free list.
//! - [`device`] for the traits a graphics backend implements.
//! - [`resource`] for resource descriptors and profiling queries.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod allocator;
pub mod core;
pub mod device;
pub mod graph;
pub mod resource;
pub mod util;
