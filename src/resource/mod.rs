//! Exposes resource descriptors and the profiling query pools owned by a render graph.

pub mod desc;
pub mod query_pool;
