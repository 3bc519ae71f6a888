//! Scenario-based tests for postdeploy
//!
//! Every scenario runs the standard plan against a scripted command runner
//! with paused time, so the fixed waits resolve instantly.

#[path = "../helpers/mod.rs"]
mod helpers;

mod fatal_preconditions;
