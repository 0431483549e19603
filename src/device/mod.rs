//! The device module exposes the traits a graphics backend implements to drive a render graph.
//!
//! A [`Device`](traits::Device) creates resources, heaps and query pools. A
//! [`CommandStream`](traits::CommandStream) receives the aliasing barriers and debug markers the graph records
//! around every pass. Everything else, like binding pipelines or dispatching work, is recorded by the render
//! passes themselves on the concrete command stream type.

pub mod traits;
