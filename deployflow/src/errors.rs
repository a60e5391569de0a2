//! Error types for deployflow.
//!
//! Configuration errors are collected during assembly and reported together;
//! submission errors come from the external provider and are passed through
//! untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for deployflow operations.
#[derive(Debug, Error)]
pub enum DeployflowError {
    /// The pipeline configuration failed validation.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// The configuration could not be loaded.
    #[error("{0}")]
    ConfigLoad(#[from] ConfigLoadError),

    /// The external provider rejected or failed the submission.
    #[error("{0}")]
    Submission(#[from] SubmissionError),
}

/// Metadata about a validation failure for better diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-004-DANGLING_ARTIFACT").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: BTreeMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// A single validation failure, pinned to the stage, action or artifact
/// that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// The offending action, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// The offending artifact, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            action: None,
            artifact: None,
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets a single involved stage.
    #[must_use]
    pub fn with_stage(self, stage: impl Into<String>) -> Self {
        self.with_stages(vec![stage.into()])
    }

    /// Sets the offending action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the offending artifact.
    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if one was attached.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// All validation failures found while assembling one pipeline.
///
/// Assembly is all-or-nothing: a value of this type means nothing was
/// produced and nothing may be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Pipeline '{pipeline}' failed validation: {}", join_messages(.errors))]
pub struct ConfigurationError {
    /// The pipeline being assembled.
    pub pipeline: String,
    /// Every violation, in stage order.
    pub errors: Vec<PipelineValidationError>,
}

impl ConfigurationError {
    /// Creates a configuration error from collected violations.
    #[must_use]
    pub fn new(pipeline: impl Into<String>, errors: Vec<PipelineValidationError>) -> Self {
        Self {
            pipeline: pipeline.into(),
            errors,
        }
    }

    /// Returns the error codes of all violations.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.errors.iter().filter_map(PipelineValidationError::code).collect()
    }

    /// Returns true if any violation carries the given code.
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.codes().contains(&code)
    }

    /// Returns the violations that name the given artifact.
    pub fn for_artifact<'a>(
        &'a self,
        artifact: &'a str,
    ) -> impl Iterator<Item = &'a PipelineValidationError> + 'a {
        self.errors
            .iter()
            .filter(move |err| err.artifact.as_deref() == Some(artifact))
    }

    /// Returns the violations that involve the given stage.
    pub fn for_stage<'a>(
        &'a self,
        stage: &'a str,
    ) -> impl Iterator<Item = &'a PipelineValidationError> + 'a {
        self.errors
            .iter()
            .filter(move |err| err.stages.iter().any(|s| s == stage))
    }
}

fn join_messages(errors: &[PipelineValidationError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// The file could not be read.
    #[error("Failed to read configuration '{}': {source}", path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration document.
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced by the external provider at submission time.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The provider refused the description.
    #[error("Provider rejected pipeline '{pipeline}': {reason}")]
    Rejected {
        /// The pipeline name.
        pipeline: String,
        /// The provider's reason.
        reason: String,
    },

    /// IO error while handing the description over.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The description could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SubmissionError {
    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(pipeline: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            pipeline: pipeline.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes reported by the assembler.
pub mod codes {
    /// The pipeline has no stages.
    pub const EMPTY_PIPELINE: &str = "PIPELINE-001-EMPTY";
    /// Two stages share a name.
    pub const DUPLICATE_STAGE: &str = "PIPELINE-002-DUPLICATE_STAGE";
    /// A stage has no actions.
    pub const EMPTY_STAGE: &str = "PIPELINE-003-EMPTY_STAGE";
    /// An input artifact is not produced by an earlier stage.
    pub const DANGLING_ARTIFACT: &str = "PIPELINE-004-DANGLING_ARTIFACT";
    /// A build or deploy action has no input artifact.
    pub const MISSING_INPUT: &str = "PIPELINE-005-MISSING_INPUT";
    /// Two actions in one stage share a name.
    pub const DUPLICATE_ACTION: &str = "PIPELINE-006-DUPLICATE_ACTION";
    /// An artifact is produced more than once.
    pub const DUPLICATE_ARTIFACT: &str = "PIPELINE-007-DUPLICATE_ARTIFACT";
    /// A name is empty or uses characters the provider refuses.
    pub const INVALID_NAME: &str = "PIPELINE-008-INVALID_NAME";
    /// A build action references an undeclared build project.
    pub const UNKNOWN_PROJECT: &str = "CONFIG-001-UNKNOWN_PROJECT";
    /// An environment variable references an undeclared repository.
    pub const UNKNOWN_REPOSITORY: &str = "CONFIG-002-UNKNOWN_REPOSITORY";
    /// A template path names a file the producing build never exports.
    pub const MISSING_ARTIFACT_FILE: &str = "CONFIG-003-MISSING_ARTIFACT_FILE";
    /// Two build projects or repositories share an id.
    pub const DUPLICATE_ID: &str = "CONFIG-004-DUPLICATE_ID";
    /// An exported file pattern is not a valid glob.
    pub const INVALID_ARTIFACT_PATTERN: &str = "CONFIG-005-INVALID_ARTIFACT_PATTERN";
    /// The network description is invalid.
    pub const INVALID_NETWORK: &str = "NETWORK-001-INVALID";
}

/// Provides default suggestions for error codes.
pub struct ContractSuggestions;

impl ContractSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            codes::EMPTY_PIPELINE => Some("Add at least one stage to the pipeline."),
            codes::DUPLICATE_STAGE => {
                Some("Stage names must be unique. Rename or merge the repeated stage.")
            }
            codes::EMPTY_STAGE => Some("Add an action to the stage or remove the stage."),
            codes::DANGLING_ARTIFACT => Some(
                "Produce the artifact in an earlier stage, move the consuming stage later, \
                 or declare the artifact as an initial artifact.",
            ),
            codes::MISSING_INPUT => {
                Some("Build and deploy actions need at least one input artifact.")
            }
            codes::DUPLICATE_ACTION => Some("Action names must be unique within a stage."),
            codes::DUPLICATE_ARTIFACT => {
                Some("Each artifact must have exactly one producing action.")
            }
            codes::INVALID_NAME => {
                Some("Names may only use letters, digits, '.', '@', '_' and '-' (1-100 chars).")
            }
            codes::UNKNOWN_PROJECT => Some("Declare the build project under `build_projects`."),
            codes::UNKNOWN_REPOSITORY => Some("Declare the repository under `repositories`."),
            codes::MISSING_ARTIFACT_FILE => {
                Some("Add the file to the producing build spec's artifact files.")
            }
            codes::DUPLICATE_ID => Some("Build project and repository ids must be unique."),
            codes::INVALID_ARTIFACT_PATTERN => {
                Some("Fix the glob syntax of the build spec's artifact files, e.g. `*.json`.")
            }
            codes::INVALID_NETWORK => {
                Some("Use at least one AZ, unique subnet names and CIDR masks between 16 and 28.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that")
            .with_context_entry("stage", "Deploy");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.fix_hint.as_deref(), Some("Fix this by doing that"));
        assert_eq!(info.context.get("stage").map(String::as_str), Some("Deploy"));
    }

    #[test]
    fn test_validation_error_builders() {
        let err = PipelineValidationError::new("Artifact 'B' is never produced")
            .with_stage("Deploy")
            .with_action("DeployStack")
            .with_artifact("B")
            .with_error_info(ContractErrorInfo::new(codes::DANGLING_ARTIFACT, "dangling"));

        assert_eq!(err.stages, vec!["Deploy".to_string()]);
        assert_eq!(err.action.as_deref(), Some("DeployStack"));
        assert_eq!(err.artifact.as_deref(), Some("B"));
        assert_eq!(err.code(), Some(codes::DANGLING_ARTIFACT));
    }

    #[test]
    fn test_configuration_error_display_joins_messages() {
        let err = ConfigurationError::new(
            "demo",
            vec![
                PipelineValidationError::new("first problem"),
                PipelineValidationError::new("second problem"),
            ],
        );

        assert_eq!(
            err.to_string(),
            "Pipeline 'demo' failed validation: first problem; second problem"
        );
    }

    #[test]
    fn test_configuration_error_filters() {
        let err = ConfigurationError::new(
            "demo",
            vec![
                PipelineValidationError::new("a")
                    .with_stage("Build")
                    .with_artifact("A")
                    .with_error_info(ContractErrorInfo::new(codes::DANGLING_ARTIFACT, "a")),
                PipelineValidationError::new("b")
                    .with_stage("Deploy")
                    .with_error_info(ContractErrorInfo::new(codes::EMPTY_STAGE, "b")),
            ],
        );

        assert!(err.has_code(codes::EMPTY_STAGE));
        assert!(!err.has_code(codes::DUPLICATE_STAGE));
        assert_eq!(err.for_artifact("A").count(), 1);
        assert_eq!(err.for_stage("Deploy").count(), 1);
    }

    #[test]
    fn test_submission_error_rejected() {
        let err = SubmissionError::rejected("demo", "quota exceeded");
        assert_eq!(err.to_string(), "Provider rejected pipeline 'demo': quota exceeded");
    }

    #[test]
    fn test_contract_suggestions() {
        assert!(ContractSuggestions::get(codes::DANGLING_ARTIFACT).is_some());
        assert!(ContractSuggestions::get(codes::INVALID_NETWORK).is_some());
        assert!(ContractSuggestions::get("UNKNOWN").is_none());
    }
}
