// SLIM Leaderboard Desktop - Tauri Application Entry Point
// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    slim_leaderboard_desktop::desktop::run();
}
