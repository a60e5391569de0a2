//! Hand-off of validated pipelines to the external provider.
//!
//! The provider resolves the description into infrastructure; this module
//! only defines the seam and two local submitters. Provider errors are
//! returned unchanged: nothing here retries or recovers.

mod receipt;
mod submitter;

pub use receipt::SubmissionReceipt;
pub use submitter::{DryRunSubmitter, JsonFileSubmitter, PipelineSubmitter};

#[cfg(test)]
pub use submitter::MockPipelineSubmitter;
