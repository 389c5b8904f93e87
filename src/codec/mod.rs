//! Codec plumbing - bounds-checked reads, pooled write buffers, base58 helpers

pub mod base58;
mod pool;
mod reader;

pub use pool::*;
pub use reader::*;
