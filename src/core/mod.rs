//! Core domain models
//!
//! This module defines the deployment plan, its steps, their failure
//! policies and runtime state, and the configuration they are built from.

pub mod config;
pub mod container;
pub mod context;
pub mod plan;
pub mod state;
pub mod step;

pub use container::ContainerStatus;
pub use context::*;
pub use plan::*;
pub use state::*;
pub use step::*;
