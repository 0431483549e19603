//! Pass types and render passes.
//!
//! A [`PassType`] is registered once in the [`Registry`](crate::Registry) and shared by every pass node that names it.
//! When a graph is compiled, the compile callback of every enabled pass is invoked with a
//! [`CompileContext`](crate::CompileContext). It can inspect and fill in resource descriptors, and must register a
//! [`RenderPass`] object that is executed each time the graph is executed.
//!
//! Both traits are implemented for closures, so simple passes do not need their own types.
//!
//! # Example
//! ```
//! # use phobos_rg::*;
//! # use anyhow::Result;
//! fn blit_type<D: Device>() -> PassTypeDesc<D> {
//!     PassTypeDesc::from_fn("Blit", |ctx: &mut CompileContext<'_, D>| -> Result<()> {
//!         // The output has the same shape as the input.
//!         let desc = ctx.input_desc("src")?;
//!         ctx.set_output_desc("dst", desc)?;
//!         ctx.set_render_pass_fn(|_ctx: &mut PassContext<'_, D>| -> Result<()> {
//!             // Record the blit here.
//!             Ok(())
//!         });
//!         Ok(())
//!     })
//!     .input("src", "Image to copy from")
//!     .output("dst", "Image to copy to")
//! }
//! ```

use anyhow::Result;

use crate::device::traits::Device;
use crate::graph::compiler::CompileContext;
use crate::graph::executor::PassContext;

/// A pass type. Its compile callback decides the resource descriptors of a pass and creates the object that executes it.
pub trait PassType<D: Device>: Send + Sync {
    /// Called once per enabled pass of this type every time the graph is compiled. The implementation must
    /// register a render pass with [`CompileContext::set_render_pass()`], or compilation fails.
    fn compile(&self, ctx: &mut CompileContext<'_, D>) -> Result<()>;
}

impl<D, F> PassType<D> for F
where
    D: Device,
    F: Fn(&mut CompileContext<'_, D>) -> Result<()> + Send + Sync,
{
    fn compile(&self, ctx: &mut CompileContext<'_, D>) -> Result<()> {
        self(ctx)
    }
}

/// The compiled object of a single pass. It is executed every time the graph is executed, until the next compilation.
pub trait RenderPass<D: Device> {
    /// Record the work of this pass.
    fn execute(&mut self, ctx: &mut PassContext<'_, D>) -> Result<()>;
}

impl<D, F> RenderPass<D> for F
where
    D: Device,
    F: FnMut(&mut PassContext<'_, D>) -> Result<()>,
{
    fn execute(&mut self, ctx: &mut PassContext<'_, D>) -> Result<()> {
        self(ctx)
    }
}

pub(crate) type BoxedRenderPass<D> = Box<dyn RenderPass<D>>;
