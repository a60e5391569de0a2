//! # Deployflow
//!
//! Configuration-driven assembly of deployment pipelines.
//!
//! Deployflow turns a static pipeline configuration into a validated
//! description that an external provider can execute:
//!
//! - **Ordered stages**: stage order is deployment order and is never changed
//! - **Artifact threading**: every consumed artifact must come from an
//!   earlier stage or be declared up front
//! - **All-or-nothing validation**: every violation is reported together and
//!   nothing is submitted unless the description is valid
//! - **Provider seam**: submission goes through [`submit::PipelineSubmitter`]
//!
//! ## Quick Start
//!
//! ```rust
//! use deployflow::prelude::*;
//!
//! let pipeline = PipelineBuilder::new("demo")
//!     .stage(Stage::new("Source").with_action(Action::source("Fetch", "SourceOutput")))
//!     .stage(Stage::new("Build").with_action(Action::build("Compile", "SourceOutput")))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(pipeline.stage_names(), vec!["Source", "Build"]);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod submit;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ActionDefinition, BuildProject, BuildSpec, EnvironmentValue, NetworkConfig,
        PipelineConfig, StageDefinition,
    };
    pub use crate::core::{Action, ActionKind, ArtifactPath, ContainerRepository, Stage};
    pub use crate::errors::{
        ConfigurationError, ContractErrorInfo, DeployflowError, PipelineValidationError,
        SubmissionError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::presets::{container_delivery, ContainerDeliveryParams};
    pub use crate::pipeline::{assemble, Pipeline, PipelineAssembler, PipelineBuilder};
    pub use crate::submit::{
        DryRunSubmitter, JsonFileSubmitter, PipelineSubmitter, SubmissionReceipt,
    };
}
