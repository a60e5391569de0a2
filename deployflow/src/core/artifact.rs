//! Artifact references.
//!
//! An artifact is identified by name alone; a name is the token a producing
//! action declares as output and a consuming action lists as input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A file inside an artifact, such as a synthesized template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactPath {
    /// The artifact holding the file.
    pub artifact: String,
    /// The file's path relative to the artifact root.
    pub path: String,
}

impl ArtifactPath {
    /// Creates a new artifact path.
    #[must_use]
    pub fn new(artifact: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.artifact, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path_display() {
        let path = ArtifactPath::new("SynthOutput", "network-stack.template.json");
        assert_eq!(path.to_string(), "SynthOutput::network-stack.template.json");
    }

    #[test]
    fn test_artifact_path_serialization() {
        let path = ArtifactPath::new("SynthOutput", "t.json");
        let json = serde_json::to_value(&path).unwrap();

        assert_eq!(json, serde_json::json!({"artifact": "SynthOutput", "path": "t.json"}));
    }
}
