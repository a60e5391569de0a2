//! Ready-made configurations.
//!
//! [`container_delivery`] describes the canonical pipeline: fetch the source,
//! synthesize the network template, deploy the network stack, then build and
//! push the application image. Every identifier is a parameter.

use crate::config::{
    ActionDefinition, BuildDefinition, BuildProject, BuildSpec, DeployDefinition,
    EnvironmentValue, NetworkConfig, PipelineConfig, SourceDefinition, StageDefinition,
    SubnetConfig, SubnetType,
};
use crate::core::ArtifactPath;

/// Stage names used by [`container_delivery`], in order.
pub const CONTAINER_DELIVERY_STAGES: [&str; 4] =
    ["Source", "Synth", "Create_VPC", "BuildAndPushDocker"];

const SOURCE_OUTPUT: &str = "SourceOutput";
const SYNTH_OUTPUT: &str = "SynthOutput";
const SYNTH_PROJECT: &str = "SynthProject";
const DOCKER_PROJECT: &str = "DockerBuild";
const IMAGE_REPOSITORY: &str = "AppRepository";
const REPO_URI_VAR: &str = "ECR_REPO_URI";

/// Parameters for [`container_delivery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDeliveryParams {
    /// Pipeline name.
    pub pipeline_name: String,
    /// Source repository owner.
    pub owner: String,
    /// Source repository name.
    pub repo: String,
    /// Branch to track.
    pub branch: String,
    /// Provider connection identifier.
    pub connection_arn: String,
    /// Container repository receiving the image.
    pub repository_name: String,
    /// Local image tag used during the build.
    pub image_name: String,
    /// Directory holding the infrastructure project.
    pub infra_directory: String,
    /// Stack synthesized in the synth stage.
    pub synth_stack: String,
    /// Template file the synth stage exports.
    pub template_file: String,
    /// Stack name the network is deployed as.
    pub network_stack_name: String,
}

impl ContainerDeliveryParams {
    /// Creates parameters with conventional defaults for the rest.
    #[must_use]
    pub fn new(
        pipeline_name: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        connection_arn: impl Into<String>,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: "main".to_string(),
            connection_arn: connection_arn.into(),
            repository_name: "app-images".to_string(),
            image_name: "app".to_string(),
            infra_directory: "cdk".to_string(),
            synth_stack: "NetworkStack".to_string(),
            template_file: "network-stack.template.json".to_string(),
            network_stack_name: "NetworkStackFromPipeline".to_string(),
        }
    }

    /// Sets the tracked branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the container repository name.
    #[must_use]
    pub fn with_repository_name(mut self, name: impl Into<String>) -> Self {
        self.repository_name = name.into();
        self
    }

    /// Sets the local image tag.
    #[must_use]
    pub fn with_image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = name.into();
        self
    }

    /// Sets the directory holding the infrastructure project, relative to
    /// the repository root.
    #[must_use]
    pub fn with_infra_directory(mut self, directory: impl Into<String>) -> Self {
        self.infra_directory = directory.into();
        self
    }

    /// Sets the deployed network stack name.
    #[must_use]
    pub fn with_network_stack_name(mut self, name: impl Into<String>) -> Self {
        self.network_stack_name = name.into();
        self
    }
}

/// Builds the container delivery configuration.
#[must_use]
pub fn container_delivery(params: &ContainerDeliveryParams) -> PipelineConfig {
    let synth_project = BuildProject::new(
        SYNTH_PROJECT,
        BuildSpec::new()
            .with_install([
                "echo Installing CDK dependencies...".to_string(),
                format!("cd {}", params.infra_directory),
                "npm ci".to_string(),
            ])
            .with_build([
                "echo Running CDK build...".to_string(),
                "npm run build".to_string(),
                "echo Synthesizing CDK...".to_string(),
                format!(
                    "npx cdk synth {} --quiet > {}cdk.out/{}",
                    params.synth_stack,
                    path_to_root(&params.infra_directory),
                    params.template_file
                ),
            ])
            .with_artifacts(Some("cdk.out"), [params.template_file.clone()]),
    );

    let docker_project = BuildProject::new(
        DOCKER_PROJECT,
        BuildSpec::new()
            .with_pre_build([
                "echo Logging into ECR...",
                "aws ecr get-login-password --region $AWS_DEFAULT_REGION | docker login --username AWS --password-stdin $ECR_REPO_URI",
            ])
            .with_build([
                "echo Building Docker image...".to_string(),
                format!("docker build -t {} .", params.image_name),
                format!("docker tag {}:latest $ECR_REPO_URI:latest", params.image_name),
            ])
            .with_post_build(["echo Pushing Docker image...", "docker push $ECR_REPO_URI:latest"]),
    )
    .privileged()
    .with_env(REPO_URI_VAR, EnvironmentValue::repository_uri(IMAGE_REPOSITORY));

    let [source_stage, synth_stage, deploy_stage, docker_stage] = CONTAINER_DELIVERY_STAGES;

    PipelineConfig::new(params.pipeline_name.clone())
        .with_build_project(synth_project)
        .with_build_project(docker_project)
        .with_repository(IMAGE_REPOSITORY, params.repository_name.clone())
        .with_stage(StageDefinition::new(
            source_stage,
            vec![ActionDefinition::Source(SourceDefinition {
                name: "GitHub_Source".to_string(),
                owner: params.owner.clone(),
                repo: params.repo.clone(),
                branch: params.branch.clone(),
                connection_arn: params.connection_arn.clone(),
                trigger_on_push: true,
                output: SOURCE_OUTPUT.to_string(),
            })],
        ))
        .with_stage(StageDefinition::new(
            synth_stage,
            vec![ActionDefinition::Build(BuildDefinition {
                name: "CDK_Synth".to_string(),
                project: SYNTH_PROJECT.to_string(),
                input: SOURCE_OUTPUT.to_string(),
                extra_inputs: Vec::new(),
                outputs: vec![SYNTH_OUTPUT.to_string()],
            })],
        ))
        .with_stage(StageDefinition::new(
            deploy_stage,
            vec![ActionDefinition::Deploy(DeployDefinition {
                name: "DeployNetworkStack".to_string(),
                stack_name: params.network_stack_name.clone(),
                template: ArtifactPath::new(SYNTH_OUTPUT, params.template_file.clone()),
                admin_permissions: true,
                extra_inputs: Vec::new(),
            })],
        ))
        .with_stage(StageDefinition::new(
            docker_stage,
            vec![ActionDefinition::Build(BuildDefinition {
                name: "DockerBuild".to_string(),
                project: DOCKER_PROJECT.to_string(),
                input: SOURCE_OUTPUT.to_string(),
                extra_inputs: Vec::new(),
                outputs: Vec::new(),
            })],
        ))
}

/// Relative path from `directory` back to the repository root.
fn path_to_root(directory: &str) -> String {
    directory
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .map(|_| "../")
        .collect()
}

/// Parameters for [`single_az_public_network`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    /// Stack holding the network.
    pub stack_name: String,
    /// Logical id of the VPC.
    pub vpc_id: String,
    /// Prefix length of the public subnet.
    pub cidr_mask: u8,
}

impl NetworkParams {
    /// Creates parameters with a /24 subnet.
    #[must_use]
    pub fn new(stack_name: impl Into<String>, vpc_id: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            vpc_id: vpc_id.into(),
            cidr_mask: 24,
        }
    }
}

/// One availability zone with a single public subnet group.
#[must_use]
pub fn single_az_public_network(params: &NetworkParams) -> NetworkConfig {
    NetworkConfig::new(params.stack_name.clone(), params.vpc_id.clone(), 1).with_subnet(
        SubnetConfig::new("PublicSubnet", SubnetType::Public, params.cidr_mask),
    )
}
