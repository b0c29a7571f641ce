//! The merge engine.
//!
//! Each submodule combines one kind of fragment data. They share no state,
//! and all of them take fragments in the order the caller supplies, which
//! decides colours, annotation bands and which value wins on overwrite.

pub mod aggregator;
pub mod consistency;
pub mod palette;
pub mod performance;
pub mod plots;
pub mod tables;

pub use aggregator::*;
