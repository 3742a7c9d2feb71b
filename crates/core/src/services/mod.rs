//! Tool adapters and the pipelines that drive them.

pub mod analysis;
pub mod detector;
pub mod packers;
pub mod packing;
pub mod process;
