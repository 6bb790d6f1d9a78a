//! SLIM Leaderboard Core
//!
//! Contract types shared between the orchestration backend and any UI
//! collaborator that drives it. This crate has no dependency on the desktop
//! shell, the database or the process runtime.
//!
//! ## Module Organization
//!
//! - `error` - Analysis error taxonomy (`AnalysisError`, `AnalysisResult`)
//! - `analysis` - Requests, run outcomes, persisted records and run states
//! - `streaming` - Progress events and the sink trait observers implement

pub mod analysis;
pub mod error;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{AnalysisError, AnalysisResult};

// ── Analysis Contract ──────────────────────────────────────────────────
pub use analysis::{
    AnalysisFlags, AnalysisRequest, LastAnalysisRecord, OutputFormat, RunOutcome, RunState,
    TargetKind,
};

// ── Progress Streaming ─────────────────────────────────────────────────
pub use streaming::{NoopSink, ProgressEvent, ProgressSink};
