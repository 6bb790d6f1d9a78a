//! Analysis Services
//!
//! Everything needed to run the SLIM leaderboard tool against a target:
//!
//! - `job_config` - Target validation and per-run config files
//! - `process_runner` - External process supervision with incremental and aggregate output
//! - `orchestrator` - The per-run state machine
//! - `environment` - Interpreter checks and dependency installation
//! - `progress` - Channel-backed progress sinks and status lines

pub mod environment;
pub mod job_config;
pub mod orchestrator;
pub mod process_runner;
pub mod progress;

pub use environment::{EnvironmentProbe, RuntimeInfo};
pub use job_config::{validate_target, JobConfig, JobConfigBuilder, JobFile, TargetDescriptor};
pub use orchestrator::{AnalysisOrchestrator, ToolCommand, SEARCH_PATH_ENV, TOKEN_ENV};
pub use process_runner::{ProcessFailure, ProcessHandle, ProcessOutcome, ProcessRunner, ProcessSpec};
pub use progress::ChannelProgressSink;
