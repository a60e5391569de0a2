//! Submitter trait and local implementations.

use super::SubmissionReceipt;
use crate::errors::SubmissionError;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// The boundary to the external provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineSubmitter: Send + Sync {
    /// Hands a validated pipeline to the provider.
    async fn submit(&self, pipeline: &Pipeline) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Accepts every pipeline without contacting a provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSubmitter;

#[async_trait]
impl PipelineSubmitter for DryRunSubmitter {
    async fn submit(&self, pipeline: &Pipeline) -> Result<SubmissionReceipt, SubmissionError> {
        let receipt = SubmissionReceipt::for_pipeline(pipeline);
        info!(
            pipeline = %pipeline.name(),
            stages = pipeline.stage_count(),
            fingerprint = %receipt.fingerprint,
            "Dry run: pipeline not submitted"
        );
        Ok(receipt)
    }
}

/// Writes each pipeline as pretty JSON into a directory.
///
/// Useful when another tool picks the description up from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSubmitter {
    directory: PathBuf,
}

impl JsonFileSubmitter {
    /// Creates a submitter writing into `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the description of `pipeline` is written to.
    #[must_use]
    pub fn path_for(&self, pipeline: &Pipeline) -> PathBuf {
        self.directory
            .join(format!("{}.pipeline.json", pipeline.name()))
    }
}

#[async_trait]
impl PipelineSubmitter for JsonFileSubmitter {
    async fn submit(&self, pipeline: &Pipeline) -> Result<SubmissionReceipt, SubmissionError> {
        let path = self.path_for(pipeline);
        let body = serde_json::to_vec_pretty(pipeline)?;

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(&path, body).await?;

        info!(pipeline = %pipeline.name(), path = %path.display(), "Wrote pipeline description");
        Ok(SubmissionReceipt::for_pipeline(pipeline).with_location(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, Stage};
    use crate::pipeline::PipelineBuilder;

    fn pipeline() -> Pipeline {
        PipelineBuilder::new("demo")
            .stage(Stage::new("Source").with_action(Action::source("Fetch", "A")))
            .stage(Stage::new("Build").with_action(Action::build("Compile", "A")))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_accepts() {
        let receipt = DryRunSubmitter.submit(&pipeline()).await.unwrap();

        assert_eq!(receipt.pipeline, "demo");
        assert_eq!(receipt.stage_count, 2);
    }

    #[tokio::test]
    async fn test_json_file_submitter_writes_description() {
        let dir = tempfile::tempdir().unwrap();
        let submitter = JsonFileSubmitter::new(dir.path().join("out"));
        let pipeline = pipeline();

        let receipt = submitter.submit(&pipeline).await.unwrap();
        let location = receipt.location.clone().unwrap();
        assert_eq!(location, submitter.path_for(&pipeline));

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&location).unwrap()).unwrap();
        assert_eq!(written, pipeline.to_json());
    }

    #[tokio::test]
    async fn test_json_file_submitter_surfaces_io_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot act as the output directory.
        let submitter = JsonFileSubmitter::new(file.path());

        let err = submitter.submit(&pipeline()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Io(_)));
    }
}
