//! Exposes the render graph error type

use std::sync::PoisonError;

use thiserror::Error;

/// Error type that the render graph can return.
///
/// Fallible functions in this crate return [`anyhow::Result`], errors raised by the graph itself
/// are always one of these variants and can be recovered with [`anyhow::Error::downcast_ref()`].
/// Errors coming from the [`Device`](crate::Device) are propagated unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// A pass in the graph refers to a pass type that was never registered.
    #[error("Render pass type `{0}` is not found.")]
    PassTypeNotFound(String),
    /// A resource descriptor was still invalid (zero-sized) at the point it was needed.
    #[error("Cannot create resource `{0}` because its descriptor is not specified.")]
    InvalidResourceDesc(String),
    /// A resource index was out of range of the resource list.
    #[error("Resource index {0} is out of range.")]
    ResourceOutOfRange(usize),
    /// A pass index was out of range of the pass list.
    #[error("Pass index {0} is out of range.")]
    PassOutOfRange(usize),
    /// The compile callback of a pass type returned without registering a pass object.
    #[error("Compile callback of pass `{0}` did not set a render pass object.")]
    NoPassObject(String),
    /// The graph was executed before a successful call to `compile()`.
    #[error("Render graph is not compiled.")]
    NotCompiled,
    /// Tried to bind an external resource to a resource node that is not external.
    #[error("Resource {0} is not an external resource.")]
    NotExternal(usize),
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
