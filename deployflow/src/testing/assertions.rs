//! Test assertions for assembly results.

use crate::errors::ConfigurationError;
use crate::pipeline::Pipeline;

/// Asserts that the error carries a violation with the given code.
pub fn assert_config_error(err: &ConfigurationError, code: &str) {
    assert!(
        err.has_code(code),
        "Expected error code '{}', got {:?}",
        code,
        err.codes()
    );
}

/// Asserts the pipeline's stage order.
pub fn assert_stage_order(pipeline: &Pipeline, expected: &[&str]) {
    assert_eq!(
        pipeline.stage_names(),
        expected,
        "Unexpected stage order for pipeline '{}'",
        pipeline.name()
    );
}
