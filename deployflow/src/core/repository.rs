//! Container image repositories referenced by build projects.

use serde::{Deserialize, Serialize};

/// A container repository the pipeline's builds push images to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRepository {
    /// Identifier used by configuration to reference the repository.
    pub id: String,
    /// The repository name at the provider.
    pub repository_name: String,
    /// Build projects granted pull/push access.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pull_push_grantees: Vec<String>,
}

impl ContainerRepository {
    /// Creates a repository with no grants.
    #[must_use]
    pub fn new(id: impl Into<String>, repository_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            repository_name: repository_name.into(),
            pull_push_grantees: Vec::new(),
        }
    }

    /// Grants a build project pull/push access. Repeated grants are ignored.
    pub fn grant_pull_push(&mut self, project: impl Into<String>) {
        let project = project.into();
        if !self.pull_push_grantees.contains(&project) {
            self.pull_push_grantees.push(project);
        }
    }
}
