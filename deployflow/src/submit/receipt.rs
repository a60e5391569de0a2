//! Submission receipts.

use crate::pipeline::Pipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Proof that a provider accepted a pipeline description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Unique id of this submission.
    pub submission_id: Uuid,
    /// The submitted pipeline's name.
    pub pipeline: String,
    /// Fingerprint of the submitted description.
    pub fingerprint: String,
    /// Number of stages submitted.
    pub stage_count: usize,
    /// When the provider accepted the description.
    pub submitted_at: DateTime<Utc>,
    /// Where the description was written, for file-based submitters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

impl SubmissionReceipt {
    /// Creates a receipt for `pipeline`, stamped now.
    #[must_use]
    pub fn for_pipeline(pipeline: &Pipeline) -> Self {
        Self {
            submission_id: Uuid::new_v4(),
            pipeline: pipeline.name().to_string(),
            fingerprint: pipeline.fingerprint(),
            stage_count: pipeline.stage_count(),
            submitted_at: Utc::now(),
            location: None,
        }
    }

    /// Records where the description was written.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }
}
