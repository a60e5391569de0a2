//! The validated pipeline description.

use crate::core::{ContainerRepository, Stage};
use crate::utils::fingerprint_json;
use serde::Serialize;
use std::collections::BTreeMap;

/// A pipeline that passed validation.
///
/// Values of this type only come out of [`super::PipelineBuilder::build`], so
/// every artifact input is known to be produced by an earlier stage. The
/// description is read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    initial_artifacts: Vec<String>,
    stages: Vec<Stage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    repositories: Vec<ContainerRepository>,
}

impl Pipeline {
    pub(crate) fn new(
        name: String,
        initial_artifacts: Vec<String>,
        stages: Vec<Stage>,
        repositories: Vec<ContainerRepository>,
    ) -> Self {
        Self {
            name,
            initial_artifacts,
            stages,
            repositories,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in deployment order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns the stage names in deployment order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the number of actions across all stages.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.stages.iter().map(|s| s.actions.len()).sum()
    }

    /// Artifacts available before the first stage runs.
    #[must_use]
    pub fn initial_artifacts(&self) -> &[String] {
        &self.initial_artifacts
    }

    /// Container repositories used by the pipeline's builds.
    #[must_use]
    pub fn repositories(&self) -> &[ContainerRepository] {
        &self.repositories
    }

    /// Maps each produced artifact to the stage producing it.
    #[must_use]
    pub fn artifact_producers(&self) -> BTreeMap<&str, &str> {
        self.stages
            .iter()
            .flat_map(|stage| {
                stage
                    .produced_artifacts()
                    .map(move |artifact| (artifact, stage.name.as_str()))
            })
            .collect()
    }

    /// Returns the names of stages consuming the given artifact.
    #[must_use]
    pub fn consumers_of(&self, artifact: &str) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|stage| stage.consumed_artifacts().any(|a| a == artifact))
            .map(|stage| stage.name.as_str())
            .collect()
    }

    /// Converts the description to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Structural fingerprint of the description.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint_json(&self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Action;

    fn sample() -> Pipeline {
        Pipeline::new(
            "demo".to_string(),
            Vec::new(),
            vec![
                Stage::new("Source").with_action(Action::source("Fetch", "A")),
                Stage::new("Build").with_action(Action::build("Compile", "A").with_output("B")),
                Stage::new("Deploy").with_action(Action::deploy("Ship", "B")),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_accessors() {
        let pipeline = sample();

        assert_eq!(pipeline.name(), "demo");
        assert_eq!(pipeline.stage_count(), 3);
        assert_eq!(pipeline.action_count(), 3);
        assert_eq!(pipeline.stage_names(), vec!["Source", "Build", "Deploy"]);
        assert!(pipeline.stage("Build").is_some());
    }

    #[test]
    fn test_artifact_producers_and_consumers() {
        let pipeline = sample();
        let producers = pipeline.artifact_producers();

        assert_eq!(producers.get("A"), Some(&"Source"));
        assert_eq!(producers.get("B"), Some(&"Build"));
        assert_eq!(pipeline.consumers_of("B"), vec!["Deploy"]);
    }

    #[test]
    fn test_json_omits_empty_collections() {
        let json = sample().to_json();

        assert!(json.get("initial_artifacts").is_none());
        assert!(json.get("repositories").is_none());
        assert_eq!(json["stages"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_fingerprint_matches_for_equal_pipelines() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
    }
}
