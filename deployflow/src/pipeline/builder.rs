//! Pipeline builder with validation.

use super::validation::{collect_violations, validate_topology, Violations};
use super::Pipeline;
use crate::core::{ContainerRepository, Stage};
use crate::errors::{ConfigurationError, PipelineValidationError};

/// Builder for creating validated pipelines.
///
/// Stages are kept in insertion order, which is the deployment order. Nothing
/// is checked until [`PipelineBuilder::build`], which validates the whole
/// description at once.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// Artifacts available before the first stage.
    initial_artifacts: Vec<String>,
    /// The stages, in deployment order.
    stages: Vec<Stage>,
    /// Container repositories referenced by builds.
    repositories: Vec<ContainerRepository>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends a stage in place.
    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    /// Declares an artifact that exists before the first stage runs.
    #[must_use]
    pub fn initial_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.initial_artifacts.push(artifact.into());
        self
    }

    /// Adds a container repository.
    #[must_use]
    pub fn repository(mut self, repository: ContainerRepository) -> Self {
        self.repositories.push(repository);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs every validation rule without consuming the builder.
    #[must_use]
    pub fn validate(&self) -> Vec<PipelineValidationError> {
        validate_topology(&self.name, &self.initial_artifacts, &self.stages)
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns every violation found if the description is invalid.
    pub fn build(self) -> Result<Pipeline, ConfigurationError> {
        self.build_with(Violations::default())
    }

    /// Builds the pipeline, merging violations found by an outer layer.
    ///
    /// Used by the assembler so configuration-level problems and topology
    /// problems surface in one error, ordered by stage.
    pub(crate) fn build_with(
        self,
        mut violations: Violations,
    ) -> Result<Pipeline, ConfigurationError> {
        violations.merge(collect_violations(&self.name, &self.initial_artifacts, &self.stages));
        if !violations.is_empty() {
            return Err(ConfigurationError::new(self.name, violations.into_ordered()));
        }

        Ok(Pipeline::new(
            self.name,
            self.initial_artifacts,
            self.stages,
            self.repositories,
        ))
    }
}
