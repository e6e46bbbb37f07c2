//! # Description
//! - this module is the estimation engine
//! - the main sub module is estimator, it drives a workload through all the other models
//! - read estimator.rs for more details
//!
//! # Components
//! - precision: the numeric formats and their scale factors
//! - pruning and distillation: adjust the work and the bytes of an operation
//! - compute_array and memory_system: the two timing models
//! - workload: the operations and their byte footprint

pub mod compute_array;
pub mod distillation;
pub mod estimator;
pub mod memory_system;
pub mod precision;
pub mod pruning;
pub mod workload;

pub use estimator::{evaluate, Method};
pub use precision::Precision;
pub use workload::Operation;
