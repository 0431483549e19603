//! The core module holds the error type and the settings used throughout the crate.

pub mod error;
pub mod settings;
