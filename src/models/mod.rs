//! Data Models
//!
//! Application-side data structures. The analysis contract types live in
//! `slim_leaderboard_core` and are re-exported here.

pub mod response;
pub mod settings;

pub use response::*;
pub use settings::*;

pub use slim_leaderboard_core::{
    AnalysisFlags, AnalysisRequest, LastAnalysisRecord, OutputFormat, ProgressEvent, RunOutcome,
    RunState, TargetKind,
};
