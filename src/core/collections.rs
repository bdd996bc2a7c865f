//! Collection types tuned for the spatial index and the pairing stages.

mod aliases;
pub(in crate::core) mod periodic_kd_tree;

pub use aliases::*;
