//! Submitters for tests.

use crate::errors::SubmissionError;
use crate::pipeline::Pipeline;
use crate::submit::{PipelineSubmitter, SubmissionReceipt};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Accepts every pipeline and keeps a copy.
#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    submitted: Mutex<Vec<Pipeline>>,
}

impl RecordingSubmitter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pipelines received so far.
    #[must_use]
    pub fn submitted(&self) -> Vec<Pipeline> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl PipelineSubmitter for RecordingSubmitter {
    async fn submit(&self, pipeline: &Pipeline) -> Result<SubmissionReceipt, SubmissionError> {
        self.submitted.lock().push(pipeline.clone());
        Ok(SubmissionReceipt::for_pipeline(pipeline))
    }
}

/// Rejects every pipeline with a fixed reason and counts attempts.
#[derive(Debug)]
pub struct RejectingSubmitter {
    reason: String,
    attempts: AtomicUsize,
}

impl RejectingSubmitter {
    /// Creates a submitter rejecting with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of submissions attempted.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineSubmitter for RejectingSubmitter {
    async fn submit(&self, pipeline: &Pipeline) -> Result<SubmissionReceipt, SubmissionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SubmissionError::rejected(pipeline.name(), self.reason.clone()))
    }
}
