//! The render graph description: a plain value describing passes, resources and the connections between them.
//!
//! Passes and resources are identified by their position in the description. A connection links a named
//! parameter of a pass to a resource, either as an input (the pass reads it) or as an output (the pass writes it).
//!
//! # Example
//! ```
//! # use phobos_rg::*;
//! let mut desc = RenderGraphDesc::default();
//! let color = desc.add_resource(ResourceNode::transient(
//!     "color",
//!     ResourceDescriptor::image_2d(MemoryType::GpuOnly, vk::Format::R8G8B8A8_UNORM, 1920, 1080, vk::ImageUsageFlags::COLOR_ATTACHMENT),
//! ));
//! let backbuffer = desc.add_resource(ResourceNode::external("backbuffer").output());
//! let scene = desc.add_pass(PassNode::new("scene", "DrawScene"));
//! let tonemap = desc.add_pass(PassNode::new("tonemap", "Tonemap"));
//! desc.add_output(scene, "color", color);
//! desc.add_input(tonemap, "hdr", color);
//! desc.add_output(tonemap, "ldr", backbuffer);
//! assert_eq!(desc.passes.len(), 2);
//! ```

use static_assertions::assert_impl_all;

use crate::resource::desc::ResourceDescriptor;

/// How the memory of a resource is managed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Created when first accessed and returned to the transient heap after the last access, on every execution.
    #[default]
    Transient,
    /// Created once when the graph is compiled and kept alive until the next compilation.
    Persistent,
    /// Owned by the caller and bound with [`RenderGraph::set_external_resource()`](crate::RenderGraph::set_external_resource).
    External,
}

/// A pass in the render graph. The pass type is looked up in the [`Registry`](crate::Registry) at compile time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassNode {
    /// Display name, used for debug markers and error messages.
    pub name: String,
    /// Name of the registered pass type.
    pub pass_type: String,
}

impl PassNode {
    /// Create a pass node of the given pass type.
    pub fn new(name: impl Into<String>, pass_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pass_type: pass_type.into(),
        }
    }
}

/// A resource in the render graph.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// How the resource memory is managed.
    pub kind: ResourceKind,
    /// Optional name, used to name the physical resource.
    pub name: Option<String>,
    /// Initial descriptor. May be invalid if a pass type fills it in during compilation.
    pub desc: ResourceDescriptor,
    /// Whether this resource is a result of the graph. Only passes that contribute to a graph output are executed.
    pub is_graph_output: bool,
}

impl ResourceNode {
    /// A named transient resource.
    pub fn transient(name: impl Into<String>, desc: ResourceDescriptor) -> Self {
        Self {
            kind: ResourceKind::Transient,
            name: Some(name.into()),
            desc,
            is_graph_output: false,
        }
    }

    /// A named persistent resource.
    pub fn persistent(name: impl Into<String>, desc: ResourceDescriptor) -> Self {
        Self {
            kind: ResourceKind::Persistent,
            name: Some(name.into()),
            desc,
            is_graph_output: false,
        }
    }

    /// A named external resource. Its descriptor is only informational.
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::External,
            name: Some(name.into()),
            desc: ResourceDescriptor::default(),
            is_graph_output: false,
        }
    }

    /// Mark this resource as a graph output.
    pub fn output(mut self) -> Self {
        self.is_graph_output = true;
        self
    }

    /// Name used in log messages and errors.
    pub(crate) fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{index}"),
        }
    }
}

/// Links a named parameter of a pass to a resource.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Index of the pass in [`RenderGraphDesc::passes`].
    pub pass: usize,
    /// Parameter name, as declared by the pass type.
    pub parameter: String,
    /// Index of the resource in [`RenderGraphDesc::resources`].
    pub resource: usize,
}

/// Complete description of a render graph.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderGraphDesc {
    /// All passes, in execution order.
    pub passes: Vec<PassNode>,
    /// All resources.
    pub resources: Vec<ResourceNode>,
    /// Resources read by passes.
    pub input_connections: Vec<Connection>,
    /// Resources written by passes.
    pub output_connections: Vec<Connection>,
}

assert_impl_all!(RenderGraphDesc: Send, Sync, Clone);

impl RenderGraphDesc {
    /// Add a pass and return its index.
    pub fn add_pass(&mut self, pass: PassNode) -> usize {
        self.passes.push(pass);
        self.passes.len() - 1
    }

    /// Add a resource and return its index.
    pub fn add_resource(&mut self, resource: ResourceNode) -> usize {
        self.resources.push(resource);
        self.resources.len() - 1
    }

    /// Connect `resource` to input parameter `parameter` of `pass`.
    pub fn add_input(&mut self, pass: usize, parameter: impl Into<String>, resource: usize) {
        self.input_connections.push(Connection {
            pass,
            parameter: parameter.into(),
            resource,
        });
    }

    /// Connect `resource` to output parameter `parameter` of `pass`.
    pub fn add_output(&mut self, pass: usize, parameter: impl Into<String>, resource: usize) {
        self.output_connections.push(Connection {
            pass,
            parameter: parameter.into(),
            resource,
        });
    }
}
