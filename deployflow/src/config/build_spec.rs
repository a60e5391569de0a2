//! Build specifications: the command lists a build project runs.

use glob::{Pattern, PatternError};
use serde::{Deserialize, Serialize};

fn default_version() -> String {
    "0.2".to_string()
}

/// The phases and exported files of a build project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Build spec format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Commands per phase.
    #[serde(default)]
    pub phases: BuildPhases,
    /// Files exported as the build's output artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<BuildArtifacts>,
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self {
            version: default_version(),
            phases: BuildPhases::default(),
            artifacts: None,
        }
    }
}

/// Command lists for each build phase, run in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPhases {
    /// Dependency installation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<String>,
    /// Preparation such as registry logins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_build: Vec<String>,
    /// The build itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build: Vec<String>,
    /// Publishing steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_build: Vec<String>,
}

impl BuildPhases {
    /// Non-empty phases in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("install", self.install.as_slice()),
            ("pre_build", self.pre_build.as_slice()),
            ("build", self.build.as_slice()),
            ("post_build", self.post_build.as_slice()),
        ]
        .into_iter()
        .filter(|(_, commands)| !commands.is_empty())
    }
}

/// Files a build exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifacts {
    /// Directory the file paths are relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<String>,
    /// Exported file globs. `**/*` exports everything.
    pub files: Vec<String>,
}

impl BuildSpec {
    /// Creates an empty build spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the install commands.
    #[must_use]
    pub fn with_install<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases.install = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the pre-build commands.
    #[must_use]
    pub fn with_pre_build<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases.pre_build = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the build commands.
    #[must_use]
    pub fn with_build<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases.build = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the post-build commands.
    #[must_use]
    pub fn with_post_build<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases.post_build = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Declares exported files.
    #[must_use]
    pub fn with_artifacts<I, S>(mut self, base_directory: Option<&str>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifacts = Some(BuildArtifacts {
            base_directory: base_directory.map(str::to_string),
            files: files.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Total number of commands across phases.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.phases.iter().map(|(_, commands)| commands.len()).sum()
    }

    /// Artifact file entries that are not valid globs.
    #[must_use]
    pub fn invalid_file_patterns(&self) -> Vec<(&str, PatternError)> {
        self.artifacts
            .iter()
            .flat_map(|artifacts| &artifacts.files)
            .filter_map(|file| Pattern::new(file).err().map(|err| (file.as_str(), err)))
            .collect()
    }

    /// Whether the build exports `path`.
    ///
    /// Returns `Ok(None)` when no artifact files are declared, in which case
    /// the exported content is unknown.
    ///
    /// # Errors
    ///
    /// Returns the first artifact file entry that is not a valid glob.
    pub fn exports(&self, path: &str) -> Result<Option<bool>, PatternError> {
        let Some(artifacts) = &self.artifacts else {
            return Ok(None);
        };
        let mut exported = false;
        for file in &artifacts.files {
            exported |= Pattern::new(file)?.matches(path);
        }
        Ok(Some(exported))
    }
}
