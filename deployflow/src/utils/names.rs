//! Name validation for stages, actions and artifacts.

use regex::Regex;
use std::sync::LazyLock;

/// Longest name the provider accepts.
pub const MAX_NAME_LEN: usize = 100;

// The pattern is a literal, so compiling it cannot fail at runtime.
#[allow(clippy::expect_used)]
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.@_-]{1,100}$").expect("name pattern is a valid regex")
});

/// Returns true if `name` is usable as a stage, action or artifact name.
///
/// # Examples
///
/// ```
/// use deployflow::utils::is_valid_name;
///
/// assert!(is_valid_name("BuildAndPushDocker"));
/// assert!(!is_valid_name("has spaces"));
/// ```
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_provider_charset() {
        assert!(is_valid_name("Source"));
        assert!(is_valid_name("GitHub_Source"));
        assert!(is_valid_name("deploy-network.v2@us"));
    }

    #[test]
    fn test_rejects_empty_and_odd_characters() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Create VPC"));
        assert!(!is_valid_name("stage/one"));
    }

    #[test]
    fn test_length_limit() {
        assert!(is_valid_name(&"a".repeat(MAX_NAME_LEN)));
        assert!(!is_valid_name(&"a".repeat(MAX_NAME_LEN + 1)));
    }
}
