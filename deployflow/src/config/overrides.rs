//! Environment overrides for identifiers that change between environments.

use super::PipelineConfig;

/// Overrides the connection identifier of every source action.
pub const CONNECTION_ARN_VAR: &str = "DEPLOYFLOW_CONNECTION_ARN";
/// Overrides the branch of every source action.
pub const SOURCE_BRANCH_VAR: &str = "DEPLOYFLOW_SOURCE_BRANCH";
/// Overrides the repository owner of every source action.
pub const SOURCE_OWNER_VAR: &str = "DEPLOYFLOW_SOURCE_OWNER";
/// Overrides the pipeline name.
pub const PIPELINE_NAME_VAR: &str = "DEPLOYFLOW_PIPELINE_NAME";

impl PipelineConfig {
    /// Applies overrides found through `lookup` and returns how many were set.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut applied = 0;

        if let Some(name) = get(PIPELINE_NAME_VAR) {
            tracing::debug!(var = PIPELINE_NAME_VAR, value = %name, "Applying override");
            self.name = name;
            applied += 1;
        }

        let connection = get(CONNECTION_ARN_VAR);
        let branch = get(SOURCE_BRANCH_VAR);
        let owner = get(SOURCE_OWNER_VAR);

        for source in self.sources_mut() {
            if let Some(ref arn) = connection {
                source.connection_arn.clone_from(arn);
                applied += 1;
            }
            if let Some(ref branch) = branch {
                source.branch.clone_from(branch);
                applied += 1;
            }
            if let Some(ref owner) = owner {
                source.owner.clone_from(owner);
                applied += 1;
            }
        }

        if applied > 0 {
            tracing::info!(pipeline = %self.name, applied, "Applied configuration overrides");
        }
        applied
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> usize {
        self.apply_overrides(|var| std::env::var(var).ok())
    }
}
