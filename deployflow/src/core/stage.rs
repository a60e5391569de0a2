//! Stages: named, ordered groups of actions.

use super::Action;
use serde::{Deserialize, Serialize};

/// A named step in a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// The stage name, unique within the pipeline.
    pub name: String,
    /// The actions run in this stage.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Stage {
    /// Creates an empty stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Looks up an action by name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Artifacts produced by this stage's actions.
    pub fn produced_artifacts(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .flat_map(|a| a.outputs.iter().map(String::as_str))
    }

    /// Artifacts consumed by this stage's actions.
    pub fn consumed_artifacts(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .flat_map(|a| a.inputs.iter().map(String::as_str))
    }
}
