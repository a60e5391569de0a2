//! Topology validation for stage lists.
//!
//! Every rule is checked in one pass and every violation is reported, so a
//! single run shows the author all problems at once.

use crate::core::Stage;
use crate::errors::{codes, ContractErrorInfo, ContractSuggestions, PipelineValidationError};
use crate::utils::is_valid_name;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Violations grouped by the stage they were found in.
///
/// Pipeline-level violations come first, then each stage's in stage order.
/// Within a stage, violations keep the order they were pushed in.
#[derive(Debug, Default)]
pub(crate) struct Violations {
    general: Vec<PipelineValidationError>,
    by_stage: BTreeMap<usize, Vec<PipelineValidationError>>,
}

impl Violations {
    /// Records a violation not tied to a stage position.
    pub(crate) fn push(&mut self, error: PipelineValidationError) {
        self.general.push(error);
    }

    /// Records a violation found in the stage at `index`.
    pub(crate) fn push_at(&mut self, index: usize, error: PipelineValidationError) {
        self.by_stage.entry(index).or_default().push(error);
    }

    /// Appends `other`, keeping stage grouping.
    pub(crate) fn merge(&mut self, other: Self) {
        self.general.extend(other.general);
        for (index, errors) in other.by_stage {
            self.by_stage.entry(index).or_default().extend(errors);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.general.is_empty() && self.by_stage.is_empty()
    }

    /// Flattens into stage order.
    pub(crate) fn into_ordered(self) -> Vec<PipelineValidationError> {
        let mut errors = self.general;
        errors.extend(self.by_stage.into_values().flatten());
        errors
    }
}

/// Checks that `stages` form a valid pipeline.
///
/// Rules:
/// - the pipeline has at least one stage and stage names are unique
/// - no stage is empty and action names are unique within a stage
/// - build and deploy actions consume at least one artifact
/// - every consumed artifact is an initial artifact or was produced by a
///   strictly earlier stage
/// - every artifact has a single producer
/// - all names use the provider charset
pub(crate) fn validate_topology(
    pipeline: &str,
    initial_artifacts: &[String],
    stages: &[Stage],
) -> Vec<PipelineValidationError> {
    collect_violations(pipeline, initial_artifacts, stages).into_ordered()
}

/// Same rules as [`validate_topology`], keeping each violation's stage.
pub(crate) fn collect_violations(
    pipeline: &str,
    initial_artifacts: &[String],
    stages: &[Stage],
) -> Violations {
    let mut violations = Violations::default();

    if !is_valid_name(pipeline) {
        violations.push(invalid_name("pipeline", pipeline));
    }

    if stages.is_empty() {
        violations.push(
            PipelineValidationError::new(format!("Pipeline '{pipeline}' has no stages"))
                .with_error_info(error_info(
                    codes::EMPTY_PIPELINE,
                    "Cannot assemble an empty pipeline",
                )),
        );
        return violations;
    }

    // Artifact -> index of the first stage producing it, for better messages.
    let mut first_producer: HashMap<&str, usize> = HashMap::new();
    for (index, stage) in stages.iter().enumerate() {
        for artifact in stage.produced_artifacts() {
            first_producer.entry(artifact).or_insert(index);
        }
    }

    let mut available: HashSet<&str> = HashSet::new();
    let mut producers: HashMap<&str, (&str, &str)> = HashMap::new();
    for artifact in initial_artifacts {
        if !is_valid_name(artifact) {
            violations.push(invalid_name("artifact", artifact).with_artifact(artifact.clone()));
        }
        available.insert(artifact.as_str());
    }

    let mut seen_stages: HashMap<&str, usize> = HashMap::new();

    for (index, stage) in stages.iter().enumerate() {
        let name = stage.name.as_str();

        if !is_valid_name(name) {
            violations.push_at(index, invalid_name("stage", name).with_stage(name));
        }

        if let Some(&first) = seen_stages.get(name) {
            violations.push_at(
                index,
                PipelineValidationError::new(format!(
                    "Stage '{name}' is declared more than once (positions {} and {})",
                    first + 1,
                    index + 1
                ))
                .with_stages(vec![name.to_string(), name.to_string()])
                .with_error_info(
                    error_info(codes::DUPLICATE_STAGE, format!("Duplicate stage name '{name}'"))
                        .with_context_entry("first_position", (first + 1).to_string())
                        .with_context_entry("duplicate_position", (index + 1).to_string()),
                ),
            );
        } else {
            seen_stages.insert(name, index);
        }

        if stage.actions.is_empty() {
            violations.push_at(
                index,
                PipelineValidationError::new(format!("Stage '{name}' has no actions"))
                    .with_stage(name)
                    .with_error_info(error_info(
                        codes::EMPTY_STAGE,
                        "Stages need at least one action",
                    )),
            );
            continue;
        }

        let mut seen_actions: HashSet<&str> = HashSet::new();
        for action in &stage.actions {
            let action_name = action.name.as_str();

            if !is_valid_name(action_name) {
                violations.push_at(
                    index,
                    invalid_name("action", action_name)
                        .with_stage(name)
                        .with_action(action_name),
                );
            }

            if !seen_actions.insert(action_name) {
                violations.push_at(
                    index,
                    PipelineValidationError::new(format!(
                        "Action '{action_name}' appears more than once in stage '{name}'"
                    ))
                    .with_stage(name)
                    .with_action(action_name)
                    .with_error_info(error_info(
                        codes::DUPLICATE_ACTION,
                        format!("Duplicate action name '{action_name}'"),
                    )),
                );
            }

            if action.kind.requires_input() && action.inputs.is_empty() {
                violations.push_at(
                    index,
                    PipelineValidationError::new(format!(
                        "Action '{action_name}' in stage '{name}' is a {} action with no input artifact",
                        action.kind
                    ))
                    .with_stage(name)
                    .with_action(action_name)
                    .with_error_info(error_info(
                        codes::MISSING_INPUT,
                        format!("{} actions must consume an artifact", action.kind),
                    )),
                );
            }

            for input in &action.inputs {
                if available.contains(input.as_str()) {
                    continue;
                }
                let message = match first_producer.get(input.as_str()) {
                    Some(&producer) if producer >= index => format!(
                        "Stage '{name}' consumes artifact '{input}' before stage '{}' produces it",
                        stages[producer].name
                    ),
                    _ => format!(
                        "Stage '{name}' consumes artifact '{input}' which is never produced"
                    ),
                };
                violations.push_at(
                    index,
                    PipelineValidationError::new(message)
                        .with_stage(name)
                        .with_action(action_name)
                        .with_artifact(input.clone())
                        .with_error_info(
                            error_info(
                                codes::DANGLING_ARTIFACT,
                                format!("Artifact '{input}' is not available to stage '{name}'"),
                            )
                            .with_context_entry("artifact", input.clone()),
                        ),
                );
            }
        }

        // Outputs become visible only to later stages.
        for action in &stage.actions {
            for output in &action.outputs {
                let output_name = output.as_str();
                if !is_valid_name(output_name) {
                    violations.push_at(
                        index,
                        invalid_name("artifact", output_name)
                            .with_stage(name)
                            .with_action(action.name.clone())
                            .with_artifact(output_name),
                    );
                }

                let previous = producers
                    .get(output_name)
                    .map(|(stage, action)| format!("action '{action}' in stage '{stage}'"))
                    .or_else(|| {
                        initial_artifacts
                            .iter()
                            .any(|a| a == output_name)
                            .then(|| "the initial artifacts".to_string())
                    });

                if let Some(previous) = previous {
                    violations.push_at(
                        index,
                        PipelineValidationError::new(format!(
                            "Artifact '{output_name}' produced by action '{}' in stage '{name}' is already produced by {previous}",
                            action.name
                        ))
                        .with_stage(name)
                        .with_action(action.name.clone())
                        .with_artifact(output_name)
                        .with_error_info(error_info(
                            codes::DUPLICATE_ARTIFACT,
                            format!("Artifact '{output_name}' has more than one producer"),
                        )),
                    );
                } else {
                    producers.insert(output_name, (name, action.name.as_str()));
                    available.insert(output_name);
                }
            }
        }
    }

    violations
}

pub(crate) fn error_info(code: &str, summary: impl Into<String>) -> ContractErrorInfo {
    let info = ContractErrorInfo::new(code, summary);
    match ContractSuggestions::get(code) {
        Some(hint) => info.with_fix_hint(hint),
        None => info,
    }
}

fn invalid_name(what: &str, name: &str) -> PipelineValidationError {
    PipelineValidationError::new(format!("Invalid {what} name '{name}'")).with_error_info(
        error_info(codes::INVALID_NAME, format!("'{name}' is not a valid {what} name"))
            .with_context_entry("kind", what),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, ActionKind};
    use pretty_assertions::assert_eq;

    fn codes_of(errors: &[PipelineValidationError]) -> Vec<&str> {
        errors.iter().filter_map(PipelineValidationError::code).collect()
    }

    #[test]
    fn test_valid_linear_pipeline() {
        let stages = vec![
            Stage::new("Source").with_action(Action::source("Fetch", "A")),
            Stage::new("Build").with_action(Action::build("Compile", "A")),
        ];

        assert!(validate_topology("demo", &[], &stages).is_empty());
    }

    #[test]
    fn test_empty_pipeline() {
        let errors = validate_topology("demo", &[], &[]);
        assert_eq!(codes_of(&errors), vec![codes::EMPTY_PIPELINE]);
    }

    #[test]
    fn test_empty_stage() {
        let stages = vec![
            Stage::new("Source").with_action(Action::source("Fetch", "A")),
            Stage::new("Nothing"),
        ];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::EMPTY_STAGE]);
        assert_eq!(errors[0].stages, vec!["Nothing".to_string()]);
    }

    #[test]
    fn test_same_stage_consumption_is_rejected() {
        let stages = vec![Stage::new("Only")
            .with_action(Action::source("Fetch", "A"))
            .with_action(Action::build("Compile", "A"))];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::DANGLING_ARTIFACT]);
        assert!(errors[0].message.contains("before stage 'Only' produces it"));
    }

    #[test]
    fn test_consumed_before_produced() {
        let stages = vec![
            Stage::new("Deploy").with_action(Action::deploy("Ship", "B")),
            Stage::new("Build").with_action(Action::source("Make", "B")),
        ];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::DANGLING_ARTIFACT]);
        assert_eq!(errors[0].artifact.as_deref(), Some("B"));
        assert!(errors[0].message.contains("before stage 'Build' produces it"));
    }

    #[test]
    fn test_initial_artifact_is_available() {
        let stages = vec![Stage::new("Build").with_action(Action::build("Compile", "Seed"))];

        assert!(validate_topology("demo", &["Seed".to_string()], &stages).is_empty());
    }

    #[test]
    fn test_missing_input() {
        let stages = vec![
            Stage::new("Source").with_action(Action::source("Fetch", "A")),
            Stage::new("Deploy").with_action(Action::new("Ship", ActionKind::Deploy)),
        ];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::MISSING_INPUT]);
        assert_eq!(errors[0].action.as_deref(), Some("Ship"));
    }

    #[test]
    fn test_build_without_input() {
        let stages = vec![
            Stage::new("Source").with_action(Action::source("Fetch", "A")),
            Stage::new("Build")
                .with_action(Action::new("Compile", ActionKind::Build).with_output("B")),
        ];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::MISSING_INPUT]);
        assert_eq!(errors[0].stages, vec!["Build".to_string()]);
        assert!(errors[0].message.contains("build action with no input artifact"));
    }

    #[test]
    fn test_violations_flatten_in_stage_order() {
        let mut violations = Violations::default();
        violations.push_at(3, PipelineValidationError::new("third"));
        violations.push_at(1, PipelineValidationError::new("first"));
        violations.push(PipelineValidationError::new("general"));
        violations.push_at(1, PipelineValidationError::new("second"));

        let messages: Vec<_> = violations.into_ordered().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["general", "first", "second", "third"]);
    }

    #[test]
    fn test_duplicate_action_in_stage() {
        let stages = vec![Stage::new("Source")
            .with_action(Action::source("Fetch", "A"))
            .with_action(Action::source("Fetch", "B"))];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::DUPLICATE_ACTION]);
    }

    #[test]
    fn test_duplicate_artifact_producer() {
        let stages = vec![
            Stage::new("Source").with_action(Action::source("Fetch", "A")),
            Stage::new("Build").with_action(Action::build("Compile", "A").with_output("A")),
        ];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::DUPLICATE_ARTIFACT]);
        assert!(errors[0].message.contains("action 'Fetch' in stage 'Source'"));
    }

    #[test]
    fn test_invalid_names() {
        let stages = vec![Stage::new("Create VPC").with_action(Action::source("Fetch", "A"))];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(codes_of(&errors), vec![codes::INVALID_NAME]);
        assert_eq!(errors[0].stages, vec!["Create VPC".to_string()]);
    }

    #[test]
    fn test_collects_every_violation() {
        let stages = vec![
            Stage::new("Source").with_action(Action::source("Fetch", "A")),
            Stage::new("Source").with_action(Action::build("Compile", "Z")),
            Stage::new("Empty"),
        ];

        let errors = validate_topology("demo", &[], &stages);
        assert_eq!(
            codes_of(&errors),
            vec![codes::DUPLICATE_STAGE, codes::DANGLING_ARTIFACT, codes::EMPTY_STAGE]
        );
    }

    #[test]
    fn test_errors_carry_fix_hints() {
        let errors = validate_topology("demo", &[], &[]);
        let hint = errors[0].error_info.as_ref().and_then(|i| i.fix_hint.as_deref());

        assert_eq!(hint, ContractSuggestions::get(codes::EMPTY_PIPELINE));
    }
}
