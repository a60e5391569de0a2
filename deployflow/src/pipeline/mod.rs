//! Pipeline assembly.
//!
//! This module provides:
//! - The validated pipeline description
//! - Pipeline builder with validation
//! - The configuration-driven assembler
//! - Presets for common topologies

mod assembler;
mod builder;
pub mod presets;
mod spec;
mod validation;

pub use assembler::{assemble, PipelineAssembler};
pub use builder::PipelineBuilder;
pub use spec::Pipeline;

pub(crate) use validation::error_info;
