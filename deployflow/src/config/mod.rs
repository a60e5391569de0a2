//! Configuration types for pipeline assembly.
//!
//! This module provides:
//! - The pipeline configuration document and its action definitions
//! - Build specs with per-phase command lists
//! - Network (VPC) descriptions
//! - Environment overrides for identifiers that differ per environment

mod build_spec;
mod network;
mod overrides;
mod pipeline_config;

pub use build_spec::{BuildArtifacts, BuildPhases, BuildSpec};
pub use network::{NetworkConfig, NetworkStack, SubnetConfig, SubnetType, SUBNET_CIDR_MASKS};
pub use overrides::{
    CONNECTION_ARN_VAR, PIPELINE_NAME_VAR, SOURCE_BRANCH_VAR, SOURCE_OWNER_VAR,
};
pub use pipeline_config::{
    ActionDefinition, BuildDefinition, BuildProject, DeployDefinition, EnvironmentValue,
    PipelineConfig, RepositoryDefinition, SourceDefinition, StageDefinition,
};
