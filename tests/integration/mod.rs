//! Integration Tests Module
//!
//! Integration tests for the SLIM Leaderboard desktop backend. Tests cover
//! full analysis runs against stub tools, persistence across restarts, and
//! the command boundary used by the UI.

// Analysis runs driven through the orchestrator with shell-script tools
mod analysis_run_test;

// Command layer over an initialized AppState
mod commands_test;
