//! Core model types for deployflow.
//!
//! This module contains the building blocks of a pipeline description:
//! - Artifact paths threaded between stages
//! - Actions and their kinds
//! - Stages
//! - Container repositories the pipeline pushes to

mod action;
mod artifact;
mod repository;
mod stage;

pub use action::{Action, ActionConfiguration, ActionKind};
pub use artifact::ArtifactPath;
pub use repository::ContainerRepository;
pub use stage::Stage;
