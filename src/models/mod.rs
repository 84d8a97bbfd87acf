//! Response shapes and the mapping from warehouse rows into them.

pub mod chart;
pub mod stats;
