//! Actions: the units of work inside a stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-specific settings attached to an action.
///
/// The assembler never inspects this map; it is handed to the provider as is.
pub type ActionConfiguration = serde_json::Map<String, serde_json::Value>;

/// The kind of work an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Fetches source code and emits it as an artifact.
    SourceFetch,
    /// Runs build commands over input artifacts.
    Build,
    /// Deploys a stack from an input artifact.
    Deploy,
}

impl ActionKind {
    /// Returns true if actions of this kind must consume an artifact.
    #[must_use]
    pub const fn requires_input(self) -> bool {
        matches!(self, Self::Build | Self::Deploy)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceFetch => write!(f, "source_fetch"),
            Self::Build => write!(f, "build"),
            Self::Deploy => write!(f, "deploy"),
        }
    }
}

/// A single action within a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The action name, unique within its stage.
    pub name: String,
    /// What the action does.
    pub kind: ActionKind,
    /// Artifacts consumed by the action.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Artifacts produced by the action.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Opaque provider configuration.
    #[serde(default)]
    pub configuration: ActionConfiguration,
}

impl Action {
    /// Creates an action with no artifacts.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            configuration: ActionConfiguration::new(),
        }
    }

    /// Creates a source action emitting `output`.
    #[must_use]
    pub fn source(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(name, ActionKind::SourceFetch).with_output(output)
    }

    /// Creates a build action consuming `input`.
    #[must_use]
    pub fn build(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self::new(name, ActionKind::Build).with_input(input)
    }

    /// Creates a deploy action consuming `input`.
    #[must_use]
    pub fn deploy(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self::new(name, ActionKind::Deploy).with_input(input)
    }

    /// Adds an input artifact.
    #[must_use]
    pub fn with_input(mut self, artifact: impl Into<String>) -> Self {
        self.inputs.push(artifact.into());
        self
    }

    /// Adds an output artifact.
    #[must_use]
    pub fn with_output(mut self, artifact: impl Into<String>) -> Self {
        self.outputs.push(artifact.into());
        self
    }

    /// Sets a configuration entry.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.configuration.insert(key.into(), value);
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_configuration(mut self, configuration: ActionConfiguration) -> Self {
        self.configuration = configuration;
        self
    }
}
