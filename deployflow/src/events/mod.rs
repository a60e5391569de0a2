//! Event emission for assembly and submission.
//!
//! Sinks receive one event per lifecycle step; the event types are listed in
//! [`event_types`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the assembler and submission flow.
pub mod event_types {
    /// Assembly of a configuration began.
    pub const ASSEMBLY_STARTED: &str = "pipeline.assembly_started";
    /// A pipeline passed validation.
    pub const ASSEMBLED: &str = "pipeline.assembled";
    /// A configuration failed validation.
    pub const VALIDATION_FAILED: &str = "pipeline.validation_failed";
    /// The provider accepted a pipeline.
    pub const SUBMITTED: &str = "pipeline.submitted";
    /// The provider refused or failed a submission.
    pub const SUBMISSION_FAILED: &str = "pipeline.submission_failed";
}
