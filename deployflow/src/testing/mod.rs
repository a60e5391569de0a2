//! Testing utilities for deployflow pipelines.
//!
//! This module provides:
//! - Submitters that record or reject submissions
//! - Assertions for configuration errors

mod assertions;
mod submitters;

pub use assertions::{assert_config_error, assert_stage_order};
pub use submitters::{RecordingSubmitter, RejectingSubmitter};
