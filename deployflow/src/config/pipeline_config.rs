//! The assembler's input configuration.

use super::BuildSpec;
use crate::core::ArtifactPath;
use crate::errors::ConfigLoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_build_image() -> String {
    "aws/codebuild/standard:7.0".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

/// Static description of a pipeline and the resources its actions use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The pipeline name.
    pub name: String,
    /// Artifacts supplied to the pipeline from outside.
    #[serde(default)]
    pub initial_artifacts: Vec<String>,
    /// Build projects referenced by build actions.
    #[serde(default)]
    pub build_projects: Vec<BuildProject>,
    /// Container repositories builds push to.
    #[serde(default)]
    pub repositories: Vec<RepositoryDefinition>,
    /// Stages in deployment order.
    #[serde(default)]
    pub stages: Vec<StageDefinition>,
}

/// A build environment plus the commands it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildProject {
    /// Identifier referenced by build actions.
    pub id: String,
    /// Build image.
    #[serde(default = "default_build_image")]
    pub build_image: String,
    /// Whether the build runs privileged (needed for docker builds).
    #[serde(default)]
    pub privileged: bool,
    /// Environment variables exposed to the commands.
    #[serde(default)]
    pub environment_variables: BTreeMap<String, EnvironmentValue>,
    /// Commands and exported files.
    #[serde(default)]
    pub build_spec: BuildSpec,
}

impl BuildProject {
    /// Creates a project with the default image.
    #[must_use]
    pub fn new(id: impl Into<String>, build_spec: BuildSpec) -> Self {
        Self {
            id: id.into(),
            build_image: default_build_image(),
            privileged: false,
            environment_variables: BTreeMap::new(),
            build_spec,
        }
    }

    /// Runs the build privileged.
    #[must_use]
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Sets the build image.
    #[must_use]
    pub fn with_build_image(mut self, image: impl Into<String>) -> Self {
        self.build_image = image.into();
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: EnvironmentValue) -> Self {
        self.environment_variables.insert(name.into(), value);
        self
    }

    /// Repository ids referenced by the environment.
    pub fn referenced_repositories(&self) -> impl Iterator<Item = &str> {
        self.environment_variables.values().filter_map(|value| match value {
            EnvironmentValue::RepositoryUri { repository } => Some(repository.as_str()),
            EnvironmentValue::Plaintext { .. } => None,
        })
    }
}

/// An environment variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentValue {
    /// A literal value.
    Plaintext {
        /// The value.
        value: String,
    },
    /// The URI of a declared container repository, resolved by the provider.
    RepositoryUri {
        /// The repository id.
        repository: String,
    },
}

impl EnvironmentValue {
    /// Creates a literal value.
    #[must_use]
    pub fn plaintext(value: impl Into<String>) -> Self {
        Self::Plaintext { value: value.into() }
    }

    /// Creates a repository URI reference.
    #[must_use]
    pub fn repository_uri(repository: impl Into<String>) -> Self {
        Self::RepositoryUri {
            repository: repository.into(),
        }
    }
}

/// A container repository declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDefinition {
    /// Identifier referenced by environment variables.
    pub id: String,
    /// The repository name at the provider.
    pub repository_name: String,
}

/// A stage and its actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// The stage name.
    pub name: String,
    /// The stage's actions.
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl StageDefinition {
    /// Creates a stage definition.
    #[must_use]
    pub fn new(name: impl Into<String>, actions: Vec<ActionDefinition>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }
}

/// An action, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDefinition {
    /// Fetch a repository through a provider connection.
    Source(SourceDefinition),
    /// Run a build project.
    Build(BuildDefinition),
    /// Create or update a stack from a template artifact.
    Deploy(DeployDefinition),
}

impl ActionDefinition {
    /// Returns the action name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Source(def) => &def.name,
            Self::Build(def) => &def.name,
            Self::Deploy(def) => &def.name,
        }
    }
}

/// A source repository reached through a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// The action name.
    pub name: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch to track.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Provider connection identifier.
    pub connection_arn: String,
    /// Start the pipeline on every push.
    #[serde(default = "default_true")]
    pub trigger_on_push: bool,
    /// Artifact receiving the fetched source.
    pub output: String,
}

/// A build project run over input artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDefinition {
    /// The action name.
    pub name: String,
    /// Build project id.
    pub project: String,
    /// Primary input artifact.
    pub input: String,
    /// Secondary input artifacts.
    #[serde(default)]
    pub extra_inputs: Vec<String>,
    /// Produced artifacts.
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// A stack deployment from a template inside an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployDefinition {
    /// The action name.
    pub name: String,
    /// Stack to create or update.
    pub stack_name: String,
    /// Template location.
    pub template: ArtifactPath,
    /// Deploy with administrator permissions.
    #[serde(default)]
    pub admin_permissions: bool,
    /// Further artifacts the deployment reads (e.g. parameter files).
    #[serde(default)]
    pub extra_inputs: Vec<String>,
}

impl PipelineConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_artifacts: Vec::new(),
            build_projects: Vec::new(),
            repositories: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded pipeline configuration");
        Self::from_json_str(&contents)
    }

    /// Serializes the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Declares an artifact supplied from outside.
    #[must_use]
    pub fn with_initial_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.initial_artifacts.push(artifact.into());
        self
    }

    /// Adds a build project.
    #[must_use]
    pub fn with_build_project(mut self, project: BuildProject) -> Self {
        self.build_projects.push(project);
        self
    }

    /// Adds a container repository.
    #[must_use]
    pub fn with_repository(
        mut self,
        id: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        self.repositories.push(RepositoryDefinition {
            id: id.into(),
            repository_name: repository_name.into(),
        });
        self
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: StageDefinition) -> Self {
        self.stages.push(stage);
        self
    }

    /// Looks up a build project.
    #[must_use]
    pub fn build_project(&self, id: &str) -> Option<&BuildProject> {
        self.build_projects.iter().find(|p| p.id == id)
    }

    /// Looks up a repository.
    #[must_use]
    pub fn repository(&self, id: &str) -> Option<&RepositoryDefinition> {
        self.repositories.iter().find(|r| r.id == id)
    }

    /// Source actions across all stages.
    pub fn sources_mut(&mut self) -> impl Iterator<Item = &mut SourceDefinition> {
        self.stages
            .iter_mut()
            .flat_map(|stage| stage.actions.iter_mut())
            .filter_map(|action| match action {
                ActionDefinition::Source(source) => Some(source),
                _ => None,
            })
    }
}
