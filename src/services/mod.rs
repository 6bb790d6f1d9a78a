//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by commands.

pub mod analysis;

pub use analysis::{
    AnalysisOrchestrator, ChannelProgressSink, EnvironmentProbe, JobConfigBuilder, ProcessRunner,
    ProcessSpec,
};
