//! Shared types used across the kernel and the HTTP layer.

pub mod extraction_types;

pub use extraction_types::*;
