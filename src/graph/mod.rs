//! The render graph system turns a declarative description of GPU work into an execution plan. Each pass declares the
//! resources it reads and writes through named parameters, and the graph decides which passes run, when every
//! transient resource is created and released, and which resources can share memory.
//!
//! Resources come in three kinds:
//! - *Transient* resources are placed in the [`TransientHeap`](crate::TransientHeap) right before the first pass that
//!   accesses them, and returned right after the last one. Their memory is reused by later resources.
//! - *Persistent* resources are created once when the graph is compiled, and live until the next compilation.
//! - *External* resources are owned by the caller and bound with [`RenderGraph::set_external_resource()`].
//!
//! Through the [`GraphViz`](graphviz::GraphViz) trait, it's possible to export a graphviz-compatible dot file to display
//! the render graph.
//!
//! # Example
//!
//! ```
//! use phobos_rg::prelude::*;
//!
//! let mut desc = RenderGraphDesc::default();
//! let gbuffer = desc.add_resource(ResourceNode::transient(
//!     "gbuffer",
//!     ResourceDescriptor::image_2d(MemoryType::GpuOnly, vk::Format::R16G16B16A16_SFLOAT, 1280, 720,
//!                                  vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED),
//! ));
//! let lit = desc.add_resource(ResourceNode::external("swapchain").output());
//! let debug = desc.add_resource(ResourceNode::transient("debug", ResourceDescriptor::default()));
//!
//! let geometry = desc.add_pass(PassNode::new("geometry", "Geometry"));
//! let lighting = desc.add_pass(PassNode::new("lighting", "Lighting"));
//! // Nothing reads the output of this pass, so it will be culled when the graph is compiled.
//! let overlay = desc.add_pass(PassNode::new("overlay", "DebugOverlay"));
//!
//! desc.add_output(geometry, "gbuffer", gbuffer);
//! desc.add_input(lighting, "gbuffer", gbuffer);
//! desc.add_output(lighting, "color", lit);
//! desc.add_input(overlay, "gbuffer", gbuffer);
//! desc.add_output(overlay, "color", debug);
//!
//! println!("{}", desc.dot().unwrap());
//! ```
//!
//! # Compiling and executing
//!
//! A [`RenderGraph`] looks up the pass type of every enabled pass in its [`Registry`](crate::Registry) when it is
//! compiled. See the [`compiler`] and [`executor`] modules for the exact steps.

pub mod compiler;
pub mod desc;
pub mod executor;
pub mod graphviz;
pub mod pass;
pub mod registry;
pub mod render_graph;

pub use render_graph::RenderGraph;
