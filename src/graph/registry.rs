//! The registry maps pass type names to their declared parameters and implementation.
//!
//! A registry is a cheap handle to shared state. Clones refer to the same table, so pass types can be registered
//! from any thread while graphs that hold a clone pick them up at their next compilation.
//!
//! # Example
//! ```
//! # use phobos_rg::*;
//! # use anyhow::Result;
//! fn register_clear<D: Device>(registry: &Registry<D>) -> Result<()> {
//!     registry.register(
//!         PassTypeDesc::from_fn("Clear", |ctx: &mut CompileContext<'_, D>| -> Result<()> {
//!             ctx.set_render_pass_fn(|_: &mut PassContext<'_, D>| -> Result<()> { Ok(()) });
//!             Ok(())
//!         })
//!         .description("Clears an image")
//!         .output("target", "Image to clear"),
//!     )?;
//!     assert!(registry.list()?.contains(&"Clear".to_string()));
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::device::traits::Device;
use crate::graph::compiler::CompileContext;
use crate::graph::pass::PassType;
use crate::Error;

/// A declared input or output parameter of a pass type.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct PassParameter {
    /// Parameter name, used by connections.
    pub name: String,
    /// Human readable description.
    pub description: String,
}

/// Describes a registered pass type.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct PassTypeDesc<D: Device> {
    /// Unique name of the pass type.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Parameters this pass type reads.
    pub input_parameters: Vec<PassParameter>,
    /// Parameters this pass type writes.
    pub output_parameters: Vec<PassParameter>,
    /// The implementation.
    #[derivative(Debug = "ignore")]
    pub pass_type: Arc<dyn PassType<D>>,
}

impl<D: Device> PassTypeDesc<D> {
    /// Describe a pass type implemented by `pass_type`.
    pub fn new(name: impl Into<String>, pass_type: impl PassType<D> + 'static) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_parameters: vec![],
            output_parameters: vec![],
            pass_type: Arc::new(pass_type),
        }
    }

    /// Describe a pass type implemented by a closure. This method can be used to deduce the closure argument types.
    pub fn from_fn<F>(name: impl Into<String>, compile: F) -> Self
    where
        F: Fn(&mut CompileContext<'_, D>) -> Result<()> + Send + Sync + 'static, {
        Self::new(name, compile)
    }

    /// Set the description of this pass type.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare an input parameter.
    pub fn input(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.input_parameters.push(PassParameter {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    /// Declare an output parameter.
    pub fn output(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.output_parameters.push(PassParameter {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    pub(crate) fn declares_input(&self, name: &str) -> bool {
        self.input_parameters.iter().any(|param| param.name == name)
    }

    pub(crate) fn declares_output(&self, name: &str) -> bool {
        self.output_parameters.iter().any(|param| param.name == name)
    }
}

/// Thread safe table of pass types. The lock is only held while the table is accessed, never while a pass type
/// callback runs.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""), Default(bound = ""))]
pub struct Registry<D: Device> {
    types: Arc<Mutex<HashMap<String, PassTypeDesc<D>>>>,
}

impl<D: Device> Registry<D> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass type. A previously registered pass type with the same name is replaced.
    pub fn register(&self, desc: PassTypeDesc<D>) -> Result<()> {
        let mut types = self.types.lock().map_err(|_| Error::PoisonError)?;
        if let Some(old) = types.insert(desc.name.clone(), desc) {
            debug!("Replaced pass type `{}`", old.name);
        }
        Ok(())
    }

    /// Remove a pass type. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> Result<bool> {
        let mut types = self.types.lock().map_err(|_| Error::PoisonError)?;
        Ok(types.remove(name).is_some())
    }

    /// Get a copy of a registered pass type.
    /// # Errors
    /// * Fails with [`Error::PassTypeNotFound`] if no pass type with this name is registered.
    pub fn get(&self, name: &str) -> Result<PassTypeDesc<D>> {
        let types = self.types.lock().map_err(|_| Error::PoisonError)?;
        types
            .get(name)
            .cloned()
            .ok_or_else(|| Error::PassTypeNotFound(name.to_string()).into())
    }

    /// Names of all registered pass types, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let types = self.types.lock().map_err(|_| Error::PoisonError)?;
        let mut names = types.keys().cloned().collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }
}
