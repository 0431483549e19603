//! Compilation turns the description into an execution plan.
//!
//! Compiling a graph goes through these steps:
//! 1. All state derived from the previous compilation is dropped, including persistent resources.
//! 2. Connections are applied to build the input and output maps of every pass.
//! 3. Every pass that writes a graph output is enabled. Then passes are visited in reverse order, and the writers
//!    of every input of an enabled pass are enabled too. Passes that do not contribute to any output are culled.
//! 4. The lifetime of every resource is resolved over the enabled passes.
//! 5. The compile callback of every enabled pass is invoked. Callbacks can fill in resource descriptors and must
//!    register the render pass to execute.
//! 6. Transient resources are scheduled to be created before their first access and released after their last.
//! 7. Persistent resources are created.
//! 8. Profiling query pools are sized to the number of enabled passes.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use multimap::MultiMap;

use crate::core::settings::CompileOptions;
use crate::device::traits::Device;
use crate::graph::desc::ResourceKind;
use crate::graph::pass::{BoxedRenderPass, RenderPass};
use crate::graph::executor::PassContext;
use crate::graph::registry::PassTypeDesc;
use crate::graph::render_graph::{Backing, Lifetime, PassData, RenderGraph, ResourceData};
use crate::resource::desc::ResourceDescriptor;
use crate::Error;

/// Passed to the compile callback of a pass type. Gives access to the resources connected to the pass being compiled.
pub struct CompileContext<'a, D: Device> {
    device: &'a D,
    pass_index: usize,
    pass_name: &'a str,
    inputs: &'a HashMap<String, usize>,
    outputs: &'a HashMap<String, usize>,
    resources: &'a mut [ResourceData],
    render_pass: Option<BoxedRenderPass<D>>,
}

impl<'a, D: Device> CompileContext<'a, D> {
    /// The device the graph allocates from.
    pub fn device(&self) -> &D {
        self.device
    }

    /// Index of the pass being compiled in the description.
    pub fn pass_index(&self) -> usize {
        self.pass_index
    }

    /// Name of the pass being compiled.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// Index of the resource connected to input parameter `name`, if it is connected.
    pub fn input_resource(&self, name: &str) -> Option<usize> {
        self.inputs.get(name).copied()
    }

    /// Index of the resource connected to output parameter `name`, if it is connected.
    pub fn output_resource(&self, name: &str) -> Option<usize> {
        self.outputs.get(name).copied()
    }

    /// Get the current descriptor of any resource in the graph.
    pub fn resource_desc(&self, index: usize) -> Result<ResourceDescriptor> {
        self.resources
            .get(index)
            .map(|resource| resource.desc)
            .ok_or_else(|| Error::ResourceOutOfRange(index).into())
    }

    /// Change the descriptor of any resource in the graph. Later passes observe the new descriptor.
    pub fn set_resource_desc(&mut self, index: usize, desc: ResourceDescriptor) -> Result<()> {
        let resource = self.resources.get_mut(index).ok_or(Error::ResourceOutOfRange(index))?;
        resource.desc = desc;
        Ok(())
    }

    /// Get the descriptor of the resource connected to input parameter `name`.
    /// # Errors
    /// * Fails if the parameter is not connected.
    pub fn input_desc(&self, name: &str) -> Result<ResourceDescriptor> {
        let index = self
            .input_resource(name)
            .ok_or_else(|| anyhow!("Input `{name}` of pass `{}` is not connected", self.pass_name))?;
        self.resource_desc(index)
    }

    /// Set the descriptor of the resource connected to output parameter `name`. Does nothing if the
    /// parameter is not connected.
    pub fn set_output_desc(&mut self, name: &str, desc: ResourceDescriptor) -> Result<()> {
        match self.output_resource(name) {
            Some(index) => self.set_resource_desc(index, desc),
            None => Ok(()),
        }
    }

    /// Register the render pass that executes this pass. Must be called before the compile callback returns.
    pub fn set_render_pass(&mut self, pass: impl RenderPass<D> + 'static) {
        self.render_pass = Some(Box::new(pass));
    }

    /// Register a closure as the render pass. This method can be used to deduce the closure argument types.
    pub fn set_render_pass_fn<F>(&mut self, pass: F)
    where
        F: FnMut(&mut PassContext<'_, D>) -> Result<()> + 'static, {
        self.set_render_pass(pass);
    }
}

impl<D: Device> RenderGraph<D> {
    /// Compile the description into an execution plan. Must be called before the first execution and again after
    /// every change to the description.
    /// # Errors
    /// * [`Error::ResourceOutOfRange`] or [`Error::PassOutOfRange`] if a connection refers to a missing node.
    /// * [`Error::PassTypeNotFound`] if an enabled pass names an unregistered pass type. No device objects are
    ///   created in this case.
    /// * [`Error::NoPassObject`] if a compile callback did not register a render pass.
    /// * [`Error::InvalidResourceDesc`] if a persistent resource has no valid descriptor after all callbacks ran.
    /// * Any error returned by a compile callback or the device.
    pub fn compile(&mut self, options: CompileOptions) -> Result<()> {
        self.compiled = false;
        self.reset();
        let writers = self.apply_connections()?;
        self.enable_passes(&writers);
        self.resolve_lifetimes();
        self.compile_passes()?;
        self.schedule_transients();
        self.create_persistent_resources()?;

        let enabled = self.passes.iter().filter(|pass| pass.enabled).count();
        self.queries.prepare(&self.device, &options, enabled as u32)?;
        self.compiled = true;

        debug!(
            "Compiled render graph: {enabled}/{} passes enabled, {} transient resources",
            self.passes.len(),
            self.passes.iter().map(|pass| pass.create.len()).sum::<usize>()
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.release_leftover_transients();
        for resource in &self.resources {
            if let Backing::Persistent(handle) = resource.backing {
                self.arena.remove(handle);
                #[cfg(feature = "log-objects")]
                trace!("Destroying persistent resource {handle:?}");
            }
        }

        // External bindings survive as long as the node is still external
        let desc = &self.desc;
        let arena = &mut self.arena;
        self.externals.retain(|index, handle| {
            let keep = desc
                .resources
                .get(*index)
                .map(|node| node.kind == ResourceKind::External)
                .unwrap_or(false);
            if !keep {
                arena.remove(*handle);
            }
            keep
        });

        self.passes = self.desc.passes.iter().map(|_| PassData::default()).collect();
        self.resources = self
            .desc
            .resources
            .iter()
            .enumerate()
            .map(|(index, node)| ResourceData {
                kind: node.kind,
                desc: node.desc,
                lifetime: None,
                backing: match self.externals.get(&index) {
                    Some(handle) => Backing::External(*handle),
                    None => Backing::None,
                },
            })
            .collect();
    }

    /// Fill in the input and output maps of every pass. Returns the writers of every resource.
    fn apply_connections(&mut self) -> Result<MultiMap<usize, usize>> {
        let mut writers = MultiMap::new();
        let pass_count = self.passes.len();
        let resource_count = self.resources.len();
        let check = |pass: usize, resource: usize| -> Result<()> {
            if pass >= pass_count {
                return Err(Error::PassOutOfRange(pass).into());
            }
            if resource >= resource_count {
                return Err(Error::ResourceOutOfRange(resource).into());
            }
            Ok(())
        };

        for connection in &self.desc.input_connections {
            check(connection.pass, connection.resource)?;
            let previous = self.passes[connection.pass]
                .inputs
                .insert(connection.parameter.clone(), connection.resource);
            if previous.is_some() {
                warn!(
                    "Input `{}` of pass `{}` is connected more than once, lookups by name resolve to resource {}",
                    connection.parameter, self.desc.passes[connection.pass].name, connection.resource
                );
            }
        }

        for connection in &self.desc.output_connections {
            check(connection.pass, connection.resource)?;
            let previous = self.passes[connection.pass]
                .outputs
                .insert(connection.parameter.clone(), connection.resource);
            if previous.is_some() {
                warn!(
                    "Output `{}` of pass `{}` is connected more than once, lookups by name resolve to resource {}",
                    connection.parameter, self.desc.passes[connection.pass].name, connection.resource
                );
            }
            writers.insert(connection.resource, connection.pass);
        }

        Ok(writers)
    }

    fn enable_passes(&mut self, writers: &MultiMap<usize, usize>) {
        for (index, node) in self.desc.resources.iter().enumerate() {
            if !node.is_graph_output {
                continue;
            }
            for pass in writers.get_vec(&index).into_iter().flatten() {
                self.passes[*pass].enabled = true;
            }
        }

        // Connections are walked directly, a pass may bind one parameter name to several resources
        let reads = self
            .desc
            .input_connections
            .iter()
            .map(|connection| (connection.pass, connection.resource))
            .collect::<MultiMap<_, _>>();
        for index in (0..self.passes.len()).rev() {
            if !self.passes[index].enabled {
                continue;
            }
            for resource in reads.get_vec(&index).into_iter().flatten() {
                for pass in writers.get_vec(resource).into_iter().flatten() {
                    self.passes[*pass].enabled = true;
                }
            }
        }
    }

    fn resolve_lifetimes(&mut self) {
        let connections = self
            .desc
            .input_connections
            .iter()
            .chain(self.desc.output_connections.iter());
        for connection in connections {
            if !self.passes[connection.pass].enabled {
                continue;
            }
            let data = &mut self.resources[connection.resource];
            data.lifetime = Some(Lifetime::extend(data.lifetime, connection.pass));
        }
    }

    fn compile_passes(&mut self) -> Result<()> {
        // Look up all pass types first, so a missing type fails before any callback or allocation
        let mut types: Vec<(usize, PassTypeDesc<D>)> = Vec::new();
        for (index, pass) in self.passes.iter().enumerate() {
            if !pass.enabled {
                continue;
            }
            let node = &self.desc.passes[index];
            let ty = self.registry.get(&node.pass_type)?;
            for name in pass.inputs.keys().filter(|name| !ty.declares_input(name)) {
                warn!("Pass `{}` connects input `{name}` which pass type `{}` does not declare", node.name, ty.name);
            }
            for name in pass.outputs.keys().filter(|name| !ty.declares_output(name)) {
                warn!("Pass `{}` connects output `{name}` which pass type `{}` does not declare", node.name, ty.name);
            }
            types.push((index, ty));
        }

        for (index, ty) in types {
            let name = self.desc.passes[index].name.as_str();
            let pass = &mut self.passes[index];
            let mut ctx = CompileContext {
                device: &self.device,
                pass_index: index,
                pass_name: name,
                inputs: &pass.inputs,
                outputs: &pass.outputs,
                resources: &mut self.resources,
                render_pass: None,
            };
            ty.pass_type.compile(&mut ctx)?;
            let render_pass = ctx.render_pass.take();
            match render_pass {
                Some(render_pass) => pass.pass = Some(render_pass),
                None => return Err(Error::NoPassObject(name.to_string()).into()),
            }
        }
        Ok(())
    }

    fn schedule_transients(&mut self) {
        for (index, resource) in self.resources.iter().enumerate() {
            if resource.kind != ResourceKind::Transient {
                continue;
            }
            if let Some(lifetime) = resource.lifetime {
                self.passes[lifetime.first].create.push(index);
                self.passes[lifetime.last].release.push(index);
            }
        }
    }

    fn create_persistent_resources(&mut self) -> Result<()> {
        for (index, data) in self.resources.iter_mut().enumerate() {
            if data.kind != ResourceKind::Persistent {
                continue;
            }
            let node = &self.desc.resources[index];
            if !data.desc.is_valid() {
                return Err(Error::InvalidResourceDesc(node.display_name(index)).into());
            }
            let resource = self.device.create_resource(&data.desc)?;
            if let Some(name) = &node.name {
                self.device.set_resource_name(&resource, name);
            }
            let handle = self.arena.insert(resource);
            #[cfg(feature = "log-objects")]
            trace!("Created persistent resource `{}` {handle:?}", node.display_name(index));
            data.backing = Backing::Persistent(handle);
        }
        Ok(())
    }
}
