//! Turns a [`PipelineConfig`] into a validated [`Pipeline`].
//!
//! Assembly is all-or-nothing: configuration problems (unknown projects,
//! repositories or exported files) and topology problems are collected into
//! one [`ConfigurationError`], and a pipeline only reaches a submitter when
//! the list is empty.

use super::validation::{error_info, Violations};
use super::{Pipeline, PipelineBuilder};
use crate::config::{
    ActionDefinition, BuildDefinition, BuildProject, DeployDefinition, PipelineConfig,
    SourceDefinition,
};
use crate::core::{Action, ActionKind, ContainerRepository, Stage};
use crate::errors::{codes, ConfigurationError, DeployflowError, PipelineValidationError};
use crate::events::{event_types, EventSink, NoOpEventSink};
use crate::submit::{PipelineSubmitter, SubmissionReceipt};
use serde_json::json;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Assembles pipelines and reports progress to an event sink.
#[derive(Clone)]
pub struct PipelineAssembler {
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAssembler").finish_non_exhaustive()
    }
}

impl Default for PipelineAssembler {
    fn default() -> Self {
        Self::new(Arc::new(NoOpEventSink))
    }
}

impl PipelineAssembler {
    /// Creates an assembler emitting to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Assembles and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns every configuration and topology violation found.
    pub fn assemble(&self, config: &PipelineConfig) -> Result<Pipeline, ConfigurationError> {
        self.sink.try_emit(
            event_types::ASSEMBLY_STARTED,
            Some(json!({"pipeline": config.name, "stages": config.stages.len()})),
        );

        match assemble_config(config) {
            Ok(pipeline) => {
                info!(
                    pipeline = %pipeline.name(),
                    stages = pipeline.stage_count(),
                    actions = pipeline.action_count(),
                    "Pipeline assembled"
                );
                self.sink.try_emit(
                    event_types::ASSEMBLED,
                    Some(json!({
                        "pipeline": pipeline.name(),
                        "stages": pipeline.stage_names(),
                        "fingerprint": pipeline.fingerprint(),
                    })),
                );
                Ok(pipeline)
            }
            Err(err) => {
                warn!(
                    pipeline = %err.pipeline,
                    errors = err.errors.len(),
                    codes = ?err.codes(),
                    "Pipeline configuration rejected"
                );
                self.sink.try_emit(
                    event_types::VALIDATION_FAILED,
                    serde_json::to_value(&err).ok(),
                );
                Err(err)
            }
        }
    }

    /// Loads a configuration file, applies environment overrides and
    /// assembles it.
    ///
    /// # Errors
    ///
    /// Returns [`DeployflowError::ConfigLoad`] if the file cannot be read or
    /// parsed and [`DeployflowError::Configuration`] if it is invalid.
    pub fn assemble_path(&self, path: impl AsRef<Path>) -> Result<Pipeline, DeployflowError> {
        let mut config = PipelineConfig::from_path(path)?;
        config.apply_env_overrides();
        Ok(self.assemble(&config)?)
    }

    /// Assembles a configuration and hands the result to `submitter`.
    ///
    /// The submitter is never called when validation fails. Its errors are
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DeployflowError::Configuration`] for invalid configurations
    /// and [`DeployflowError::Submission`] for provider failures.
    pub async fn assemble_and_submit(
        &self,
        config: &PipelineConfig,
        submitter: &dyn PipelineSubmitter,
    ) -> Result<SubmissionReceipt, DeployflowError> {
        let pipeline = self.assemble(config)?;

        match submitter.submit(&pipeline).await {
            Ok(receipt) => {
                info!(
                    pipeline = %receipt.pipeline,
                    submission_id = %receipt.submission_id,
                    "Pipeline submitted"
                );
                self.sink
                    .emit(event_types::SUBMITTED, serde_json::to_value(&receipt).ok())
                    .await;
                Ok(receipt)
            }
            Err(err) => {
                warn!(pipeline = %pipeline.name(), error = %err, "Pipeline submission failed");
                self.sink
                    .emit(
                        event_types::SUBMISSION_FAILED,
                        Some(json!({"pipeline": pipeline.name(), "error": err.to_string()})),
                    )
                    .await;
                Err(err.into())
            }
        }
    }
}

/// Assembles a configuration without emitting events.
///
/// # Errors
///
/// Returns every configuration and topology violation found.
pub fn assemble(config: &PipelineConfig) -> Result<Pipeline, ConfigurationError> {
    assemble_config(config)
}

fn assemble_config(config: &PipelineConfig) -> Result<Pipeline, ConfigurationError> {
    let mut violations = Violations::default();

    let projects = index_projects(config, &mut violations);
    let mut repositories = collect_repositories(config, &mut violations);
    grant_repository_access(config, &mut repositories, &mut violations);

    // Build action outputs -> producing project, for template file checks.
    let mut exported_by: HashMap<&str, &BuildProject> = HashMap::new();

    let mut builder = PipelineBuilder::new(config.name.clone());
    for artifact in &config.initial_artifacts {
        builder = builder.initial_artifact(artifact.clone());
    }
    for repository in repositories {
        builder = builder.repository(repository);
    }

    for (index, stage_def) in config.stages.iter().enumerate() {
        let mut stage = Stage::new(stage_def.name.clone());

        for action_def in &stage_def.actions {
            let action = match action_def {
                ActionDefinition::Source(def) => source_action(def),
                ActionDefinition::Build(def) => {
                    let project = projects.get(def.project.as_str()).copied();
                    if project.is_none() {
                        violations.push_at(
                            index,
                            PipelineValidationError::new(format!(
                                "Action '{}' in stage '{}' uses unknown build project '{}'",
                                def.name, stage_def.name, def.project
                            ))
                            .with_stage(stage_def.name.clone())
                            .with_action(def.name.clone())
                            .with_error_info(
                                error_info(
                                    codes::UNKNOWN_PROJECT,
                                    format!("Build project '{}' is not declared", def.project),
                                )
                                .with_context_entry("project", def.project.clone()),
                            ),
                        );
                    }
                    if let Some(project) = project {
                        for output in &def.outputs {
                            exported_by.entry(output.as_str()).or_insert(project);
                        }
                    }
                    build_action(def, project)
                }
                ActionDefinition::Deploy(def) => {
                    if let Some(error) =
                        check_template_export(stage_def.name.as_str(), def, &exported_by)
                    {
                        violations.push_at(index, error);
                    }
                    deploy_action(def)
                }
            };
            stage = stage.with_action(action);
        }

        builder.add_stage(stage);
    }

    debug!(
        pipeline = %config.name,
        stages = builder.stage_count(),
        "Translated configuration into stages"
    );
    builder.build_with(violations)
}

fn index_projects<'a>(
    config: &'a PipelineConfig,
    violations: &mut Violations,
) -> HashMap<&'a str, &'a BuildProject> {
    let mut projects = HashMap::new();
    for project in &config.build_projects {
        match projects.entry(project.id.as_str()) {
            Entry::Occupied(_) => violations.push(duplicate_id("build project", &project.id)),
            Entry::Vacant(slot) => {
                slot.insert(project);
            }
        }

        for (file, err) in project.build_spec.invalid_file_patterns() {
            violations.push(
                PipelineValidationError::new(format!(
                    "Build project '{}' exports invalid file pattern '{file}': {err}",
                    project.id
                ))
                .with_error_info(
                    error_info(
                        codes::INVALID_ARTIFACT_PATTERN,
                        format!("'{file}' is not a valid file pattern"),
                    )
                    .with_context_entry("project", project.id.clone())
                    .with_context_entry("pattern", file),
                ),
            );
        }
    }
    projects
}

fn collect_repositories(
    config: &PipelineConfig,
    violations: &mut Violations,
) -> Vec<ContainerRepository> {
    let mut seen = HashSet::new();
    let mut repositories = Vec::new();
    for repository in &config.repositories {
        if seen.insert(repository.id.as_str()) {
            repositories.push(ContainerRepository::new(
                repository.id.clone(),
                repository.repository_name.clone(),
            ));
        } else {
            violations.push(duplicate_id("repository", &repository.id));
        }
    }
    repositories
}

/// Grants every project pull/push on the repositories its environment points at.
fn grant_repository_access(
    config: &PipelineConfig,
    repositories: &mut [ContainerRepository],
    violations: &mut Violations,
) {
    for project in &config.build_projects {
        for repository_id in project.referenced_repositories() {
            match repositories.iter_mut().find(|r| r.id == repository_id) {
                Some(repository) => repository.grant_pull_push(project.id.clone()),
                None => violations.push(
                    PipelineValidationError::new(format!(
                        "Build project '{}' references unknown repository '{repository_id}'",
                        project.id
                    ))
                    .with_error_info(
                        error_info(
                            codes::UNKNOWN_REPOSITORY,
                            format!("Repository '{repository_id}' is not declared"),
                        )
                        .with_context_entry("project", project.id.clone())
                        .with_context_entry("repository", repository_id),
                    ),
                ),
            }
        }
    }
}

/// Malformed patterns are reported per project, so they never fail this check.
fn check_template_export(
    stage: &str,
    def: &DeployDefinition,
    exported_by: &HashMap<&str, &BuildProject>,
) -> Option<PipelineValidationError> {
    let project = exported_by.get(def.template.artifact.as_str())?;
    if !matches!(project.build_spec.exports(&def.template.path), Ok(Some(false))) {
        return None;
    }
    Some(
        PipelineValidationError::new(format!(
            "Action '{}' in stage '{stage}' deploys '{}', but build project '{}' does not export '{}'",
            def.name, def.template, project.id, def.template.path
        ))
        .with_stage(stage)
        .with_action(def.name.clone())
        .with_artifact(def.template.artifact.clone())
        .with_error_info(
            error_info(
                codes::MISSING_ARTIFACT_FILE,
                format!("'{}' is not exported", def.template),
            )
            .with_context_entry("project", project.id.clone()),
        ),
    )
}

fn duplicate_id(what: &str, id: &str) -> PipelineValidationError {
    PipelineValidationError::new(format!("The {what} id '{id}' is declared more than once"))
        .with_error_info(
            error_info(codes::DUPLICATE_ID, format!("Duplicate {what} id '{id}'"))
                .with_context_entry("id", id),
        )
}

fn source_action(def: &SourceDefinition) -> Action {
    Action::source(def.name.clone(), def.output.clone())
        .with_setting("owner", json!(def.owner))
        .with_setting("repo", json!(def.repo))
        .with_setting("branch", json!(def.branch))
        .with_setting("connection_arn", json!(def.connection_arn))
        .with_setting("trigger_on_push", json!(def.trigger_on_push))
}

fn build_action(def: &BuildDefinition, project: Option<&BuildProject>) -> Action {
    let mut action = Action::new(def.name.clone(), ActionKind::Build)
        .with_input(def.input.clone())
        .with_setting("project", json!(def.project));
    for input in &def.extra_inputs {
        action = action.with_input(input.clone());
    }
    for output in &def.outputs {
        action = action.with_output(output.clone());
    }
    if let Some(project) = project {
        action = action
            .with_setting("build_image", json!(project.build_image))
            .with_setting("privileged", json!(project.privileged))
            .with_setting(
                "environment_variables",
                serde_json::to_value(&project.environment_variables).unwrap_or_default(),
            )
            .with_setting(
                "build_spec",
                serde_json::to_value(&project.build_spec).unwrap_or_default(),
            );
    }
    action
}

fn deploy_action(def: &DeployDefinition) -> Action {
    let mut action = Action::deploy(def.name.clone(), def.template.artifact.clone())
        .with_setting("stack_name", json!(def.stack_name))
        .with_setting("template_path", json!(def.template.to_string()))
        .with_setting("admin_permissions", json!(def.admin_permissions));
    for input in &def.extra_inputs {
        if !action.inputs.contains(input) {
            action = action.with_input(input.clone());
        }
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSpec, EnvironmentValue, StageDefinition};
    use crate::core::ArtifactPath;
    use crate::errors::SubmissionError;
    use crate::events::CollectingEventSink;
    use crate::submit::MockPipelineSubmitter;
    use pretty_assertions::assert_eq;

    fn source(name: &str, output: &str) -> ActionDefinition {
        ActionDefinition::Source(SourceDefinition {
            name: name.to_string(),
            owner: "octo".to_string(),
            repo: "app".to_string(),
            branch: "main".to_string(),
            connection_arn: "arn:example:connection/1".to_string(),
            trigger_on_push: true,
            output: output.to_string(),
        })
    }

    fn build(name: &str, project: &str, input: &str, outputs: &[&str]) -> ActionDefinition {
        ActionDefinition::Build(BuildDefinition {
            name: name.to_string(),
            project: project.to_string(),
            input: input.to_string(),
            extra_inputs: Vec::new(),
            outputs: outputs.iter().map(ToString::to_string).collect(),
        })
    }

    fn deploy(name: &str, artifact: &str, path: &str) -> ActionDefinition {
        ActionDefinition::Deploy(DeployDefinition {
            name: name.to_string(),
            stack_name: "AppStack".to_string(),
            template: ArtifactPath::new(artifact, path),
            admin_permissions: true,
            extra_inputs: Vec::new(),
        })
    }

    fn four_stage_config() -> PipelineConfig {
        PipelineConfig::new("demo")
            .with_build_project(BuildProject::new(
                "Synth",
                BuildSpec::new()
                    .with_build(["make synth"])
                    .with_artifacts(Some("out"), ["template.json"]),
            ))
            .with_build_project(
                BuildProject::new("Docker", BuildSpec::new().with_build(["docker build ."]))
                    .privileged()
                    .with_env("REPO_URI", EnvironmentValue::repository_uri("App")),
            )
            .with_repository("App", "app-images")
            .with_stage(StageDefinition::new("Source", vec![source("Fetch", "A")]))
            .with_stage(StageDefinition::new(
                "Synth",
                vec![build("Synthesize", "Synth", "A", &["B"])],
            ))
            .with_stage(StageDefinition::new("Deploy", vec![deploy("Stack", "B", "template.json")]))
            .with_stage(StageDefinition::new(
                "Build",
                vec![build("DockerBuild", "Docker", "A", &[])],
            ))
    }

    #[test]
    fn test_assemble_four_stages() {
        let pipeline = assemble(&four_stage_config()).unwrap();

        assert_eq!(pipeline.stage_names(), vec!["Source", "Synth", "Deploy", "Build"]);

        let deploy = &pipeline.stages()[2].actions[0];
        assert_eq!(deploy.kind, ActionKind::Deploy);
        assert_eq!(deploy.inputs, vec!["B".to_string()]);
        assert_eq!(deploy.configuration["template_path"], json!("B::template.json"));

        let docker = &pipeline.stages()[3].actions[0];
        assert_eq!(docker.configuration["privileged"], json!(true));
        assert_eq!(
            docker.configuration["environment_variables"]["REPO_URI"],
            json!({"type": "repository_uri", "repository": "App"})
        );
    }

    #[test]
    fn test_repository_grants_follow_environment() {
        let pipeline = assemble(&four_stage_config()).unwrap();

        assert_eq!(pipeline.repositories()[0].pull_push_grantees, vec!["Docker".to_string()]);
    }

    #[test]
    fn test_unknown_project() {
        let config = PipelineConfig::new("demo")
            .with_stage(StageDefinition::new("Source", vec![source("Fetch", "A")]))
            .with_stage(StageDefinition::new("Build", vec![build("Compile", "Missing", "A", &[])]));

        let err = assemble(&config).unwrap_err();
        assert_eq!(err.codes(), vec![codes::UNKNOWN_PROJECT]);
        assert_eq!(err.errors[0].stages, vec!["Build".to_string()]);
        assert_eq!(err.errors[0].action.as_deref(), Some("Compile"));
    }

    #[test]
    fn test_unknown_repository() {
        let config = PipelineConfig::new("demo")
            .with_build_project(
                BuildProject::new("Docker", BuildSpec::new())
                    .with_env("REPO_URI", EnvironmentValue::repository_uri("Nope")),
            )
            .with_stage(StageDefinition::new("Source", vec![source("Fetch", "A")]));

        let err = assemble(&config).unwrap_err();
        assert_eq!(err.codes(), vec![codes::UNKNOWN_REPOSITORY]);
    }

    #[test]
    fn test_template_must_be_exported() {
        let mut config = four_stage_config();
        config.stages[2] = StageDefinition::new("Deploy", vec![deploy("Stack", "B", "other.json")]);

        let err = assemble(&config).unwrap_err();
        assert_eq!(err.codes(), vec![codes::MISSING_ARTIFACT_FILE]);
        assert_eq!(err.errors[0].artifact.as_deref(), Some("B"));
    }

    #[test]
    fn test_template_matches_exported_glob() {
        let mut config = four_stage_config();
        config.build_projects[0].build_spec = BuildSpec::new()
            .with_build(["make synth"])
            .with_artifacts(Some("cdk.out"), ["*.template.json"]);
        config.stages[2] = StageDefinition::new(
            "Deploy",
            vec![deploy("Stack", "B", "network-stack.template.json")],
        );

        let pipeline = assemble(&config).unwrap();
        assert_eq!(pipeline.stage_count(), 4);
    }

    #[test]
    fn test_malformed_file_pattern() {
        let mut config = four_stage_config();
        config.build_projects[0].build_spec =
            BuildSpec::new().with_artifacts(None, ["[template.json"]);

        let err = assemble(&config).unwrap_err();
        assert_eq!(err.codes(), vec![codes::INVALID_ARTIFACT_PATTERN]);
        let context = &err.errors[0].error_info.as_ref().unwrap().context;
        assert_eq!(context.get("project").map(String::as_str), Some("Synth"));
    }

    #[test]
    fn test_errors_follow_stage_order() {
        let config = PipelineConfig::new("demo")
            .with_stage(StageDefinition::new("Source", vec![source("Fetch", "A")]))
            .with_stage(StageDefinition::new("Empty", Vec::new()))
            .with_stage(StageDefinition::new(
                "Build",
                vec![build("Compile", "Missing", "A", &[])],
            ))
            .with_stage(StageDefinition::new("Deploy", vec![deploy("Stack", "Z", "t.json")]));

        let err = assemble(&config).unwrap_err();
        assert_eq!(
            err.codes(),
            vec![codes::EMPTY_STAGE, codes::UNKNOWN_PROJECT, codes::DANGLING_ARTIFACT]
        );
        let stages: Vec<_> = err.errors.iter().map(|e| e.stages.clone()).collect();
        assert_eq!(
            stages,
            vec![vec!["Empty".to_string()], vec!["Build".to_string()], vec!["Deploy".to_string()]]
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let config = four_stage_config()
            .with_build_project(BuildProject::new("Docker", BuildSpec::new()))
            .with_repository("App", "again");

        let err = assemble(&config).unwrap_err();
        assert_eq!(err.codes(), vec![codes::DUPLICATE_ID, codes::DUPLICATE_ID]);
    }

    #[test]
    fn test_assembler_emits_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let assembler = PipelineAssembler::new(sink.clone());

        assembler.assemble(&four_stage_config()).unwrap();
        assert_eq!(
            sink.event_types(),
            vec![event_types::ASSEMBLY_STARTED.to_string(), event_types::ASSEMBLED.to_string()]
        );

        sink.clear();
        let _ = assembler.assemble(&PipelineConfig::new("empty"));
        assert_eq!(
            sink.event_types(),
            vec![
                event_types::ASSEMBLY_STARTED.to_string(),
                event_types::VALIDATION_FAILED.to_string()
            ]
        );
    }

    #[test]
    fn test_assemble_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, four_stage_config().to_json_string().unwrap()).unwrap();

        let pipeline = PipelineAssembler::default().assemble_path(&path).unwrap();
        assert_eq!(pipeline.stage_count(), 4);
    }

    #[test]
    fn test_assemble_path_reports_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PipelineAssembler::default().assemble_path(&path).unwrap_err();
        assert!(matches!(err, DeployflowError::ConfigLoad(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_is_never_submitted() {
        let mut submitter = MockPipelineSubmitter::new();
        submitter.expect_submit().never();

        let err = PipelineAssembler::default()
            .assemble_and_submit(&PipelineConfig::new("empty"), &submitter)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployflowError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_valid_config_is_submitted_once() {
        let mut submitter = MockPipelineSubmitter::new();
        submitter
            .expect_submit()
            .withf(|pipeline: &Pipeline| pipeline.stage_count() == 4)
            .times(1)
            .returning(|pipeline| Ok(SubmissionReceipt::for_pipeline(pipeline)));

        let sink = Arc::new(CollectingEventSink::new());
        let receipt = PipelineAssembler::new(sink.clone())
            .assemble_and_submit(&four_stage_config(), &submitter)
            .await
            .unwrap();

        assert_eq!(receipt.pipeline, "demo");
        assert_eq!(sink.event_types().last().map(String::as_str), Some(event_types::SUBMITTED));
    }

    #[tokio::test]
    async fn test_provider_errors_pass_through() {
        let mut submitter = MockPipelineSubmitter::new();
        submitter
            .expect_submit()
            .times(1)
            .returning(|pipeline| {
                Err(SubmissionError::rejected(pipeline.name(), "stack in rollback"))
            });

        let sink = Arc::new(CollectingEventSink::new());
        let err = PipelineAssembler::new(sink.clone())
            .assemble_and_submit(&four_stage_config(), &submitter)
            .await
            .unwrap_err();

        match err {
            DeployflowError::Submission(SubmissionError::Rejected { pipeline, reason }) => {
                assert_eq!(pipeline, "demo");
                assert_eq!(reason, "stack in rollback");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            sink.event_types().last().map(String::as_str),
            Some(event_types::SUBMISSION_FAILED)
        );
    }
}
